//! Misc utils

use ethers::{
    types::{Address, U256},
    utils::to_checksum,
};

/// Converts address to checksum address
pub fn as_checksum_addr<S>(val: &Address, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&to_checksum(val, None))
}

/// If possible, parses address from the first 20 bytes
///
/// Both init code and paymaster-and-data fields lead with the target contract address.
pub fn get_address(buf: &[u8]) -> Option<Address> {
    if buf.len() >= 20 {
        Some(Address::from_slice(&buf[0..20]))
    } else {
        None
    }
}

/// Converts an address into its numeric (uint256) encoding
///
/// The native AA transaction envelope encodes addresses as integers in its typed data.
pub fn address_to_u256(addr: &Address) -> U256 {
    U256::from_big_endian(addr.as_bytes())
}
