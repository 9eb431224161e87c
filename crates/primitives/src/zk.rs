//! Native account abstraction L2 transaction envelope
//!
//! Two chains speak their own account abstraction protocol instead of ERC-4337: user
//! transactions are EIP-712 typed-data payloads wrapped in a type-0x71 RLP envelope and
//! handed to a broadcast endpoint, with the paymaster negotiated out of band. Addresses
//! are encoded numerically inside the typed data, and an explicit per-pubdata-byte gas
//! parameter replaces the ERC-4337 gas budget split.

use crate::{
    constants::zk,
    utils::{address_to_u256, as_checksum_addr},
};
use ethers::{
    types::{
        transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData, Types},
        Address, Bytes, U256,
    },
    utils::{hex, keccak256, rlp::RlpStream},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// A native account abstraction transaction, mirroring the user operation's fields but
/// serialized under the L2's own protocol
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Transaction {
    /// Chain id the transaction is bound to
    pub chain_id: U256,

    /// Account sending the transaction
    #[serde(serialize_with = "as_checksum_addr")]
    pub from: Address,

    /// Call target
    #[serde(serialize_with = "as_checksum_addr")]
    pub to: Address,

    /// Single gas budget for the whole execution
    pub gas_limit: U256,

    /// Gas charged per byte of published pubdata
    pub gas_per_pubdata_byte_limit: U256,

    /// Maximum fee per gas (similar to EIP-1559)
    pub max_fee_per_gas: U256,

    /// Maximum priority fee per gas
    pub max_priority_fee_per_gas: U256,

    /// Account nonce (the chain's native nonce, not an entry point nonce)
    pub nonce: U256,

    /// Value passed with the call
    pub value: U256,

    /// Call data
    pub data: Bytes,

    /// Bytecode dependencies to publish alongside the transaction (always empty here;
    /// the protocol deploys accounts natively)
    pub factory_deps: Vec<Bytes>,

    /// Sponsoring paymaster (zero address if none)
    #[serde(serialize_with = "as_checksum_addr")]
    pub paymaster: Address,

    /// Paymaster input returned by the paymaster negotiation
    pub paymaster_input: Bytes,
}

impl Eip712Transaction {
    /// Sets the call target
    pub fn to(mut self, to: Address) -> Self {
        self.to = to;
        self
    }

    /// Sets the value passed with the call
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Sets the call data
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }

    /// The typed-data domain the transaction is signed under, bound to this chain id
    pub fn domain(&self) -> EIP712Domain {
        EIP712Domain {
            name: Some(zk::DOMAIN_NAME.into()),
            version: Some(zk::DOMAIN_VERSION.into()),
            chain_id: Some(self.chain_id),
            verifying_contract: None,
            salt: None,
        }
    }

    /// The EIP-712 payload to sign
    ///
    /// Addresses are encoded as uint256 per the protocol's transaction type.
    pub fn typed_data(&self) -> TypedData {
        let mut types = Types::new();
        types.insert(
            "EIP712Domain".into(),
            vec![
                eip712_field("name", "string"),
                eip712_field("version", "string"),
                eip712_field("chainId", "uint256"),
            ],
        );
        types.insert(
            "Transaction".into(),
            vec![
                eip712_field("txType", "uint256"),
                eip712_field("from", "uint256"),
                eip712_field("to", "uint256"),
                eip712_field("gasLimit", "uint256"),
                eip712_field("gasPerPubdataByteLimit", "uint256"),
                eip712_field("maxFeePerGas", "uint256"),
                eip712_field("maxPriorityFeePerGas", "uint256"),
                eip712_field("paymaster", "uint256"),
                eip712_field("nonce", "uint256"),
                eip712_field("value", "uint256"),
                eip712_field("data", "bytes"),
                eip712_field("factoryDeps", "bytes32[]"),
                eip712_field("paymasterInput", "bytes"),
            ],
        );

        let mut message = BTreeMap::new();
        message.insert("txType".into(), json!(u64::from(zk::EIP712_TX_TYPE).to_string()));
        message.insert("from".into(), json!(address_to_u256(&self.from).to_string()));
        message.insert("to".into(), json!(address_to_u256(&self.to).to_string()));
        message.insert("gasLimit".into(), json!(self.gas_limit.to_string()));
        message.insert(
            "gasPerPubdataByteLimit".into(),
            json!(self.gas_per_pubdata_byte_limit.to_string()),
        );
        message.insert("maxFeePerGas".into(), json!(self.max_fee_per_gas.to_string()));
        message
            .insert("maxPriorityFeePerGas".into(), json!(self.max_priority_fee_per_gas.to_string()));
        message.insert("paymaster".into(), json!(address_to_u256(&self.paymaster).to_string()));
        message.insert("nonce".into(), json!(self.nonce.to_string()));
        message.insert("value".into(), json!(self.value.to_string()));
        message.insert("data".into(), json!(format!("0x{}", hex::encode(&self.data))));
        message.insert(
            "factoryDeps".into(),
            json!(self
                .factory_deps
                .iter()
                .map(|dep| format!("0x{}", hex::encode(keccak256(dep))))
                .collect::<Vec<_>>()),
        );
        message.insert(
            "paymasterInput".into(),
            json!(format!("0x{}", hex::encode(&self.paymaster_input))),
        );

        TypedData {
            domain: self.domain(),
            types,
            primary_type: "Transaction".into(),
            message,
        }
    }

    /// Serializes the signed transaction into the typed RLP envelope expected by the
    /// broadcast endpoint: a type byte followed by the 16-item transaction list
    pub fn rlp_signed(&self, signature: &Bytes) -> Bytes {
        let mut rlp = RlpStream::new_list(16);
        rlp.append(&self.nonce);
        rlp.append(&self.max_priority_fee_per_gas);
        rlp.append(&self.max_fee_per_gas);
        rlp.append(&self.gas_limit);
        rlp.append(&self.to);
        rlp.append(&self.value);
        rlp.append(&self.data.to_vec());
        rlp.append(&self.chain_id);
        rlp.append_empty_data();
        rlp.append_empty_data();
        rlp.append(&self.chain_id);
        rlp.append(&self.from);
        rlp.append(&self.gas_per_pubdata_byte_limit);
        rlp.begin_list(self.factory_deps.len());
        for dep in &self.factory_deps {
            rlp.append(&dep.to_vec());
        }
        rlp.append(&signature.to_vec());
        if self.paymaster.is_zero() {
            rlp.begin_list(0);
        } else {
            rlp.begin_list(2);
            rlp.append(&self.paymaster);
            rlp.append(&self.paymaster_input.to_vec());
        }

        let mut out = vec![zk::EIP712_TX_TYPE];
        out.extend_from_slice(rlp.out().as_ref());
        out.into()
    }
}

fn eip712_field(name: &str, r#type: &str) -> Eip712DomainType {
    Eip712DomainType { name: name.into(), r#type: r#type.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::utils::rlp::Rlp;

    fn tx() -> Eip712Transaction {
        Eip712Transaction {
            chain_id: 324.into(),
            from: "0x9c5754De1443984659E1b3a8d1931D83475ba29C".parse().unwrap(),
            to: "0x95222290DD7278Aa3Ddd389Cc1E1d165CC4BAfe5".parse().unwrap(),
            gas_limit: 150_000.into(),
            gas_per_pubdata_byte_limit: 50_000.into(),
            max_fee_per_gas: 250_000_000.into(),
            max_priority_fee_per_gas: 250_000_000.into(),
            nonce: 7.into(),
            value: U256::zero(),
            data: "0xdeadbeef".parse().unwrap(),
            factory_deps: vec![],
            paymaster: "0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf".parse().unwrap(),
            paymaster_input: "0x8c5a3445".parse().unwrap(),
        }
    }

    #[test]
    fn envelope_has_type_prefix() {
        let raw = tx().rlp_signed(&Bytes::from(vec![0xab; 65]));
        assert_eq!(raw[0], zk::EIP712_TX_TYPE);

        let rlp = Rlp::new(&raw[1..]);
        assert_eq!(rlp.item_count().unwrap(), 16);
        assert_eq!(rlp.val_at::<U256>(0).unwrap(), 7.into());
        assert_eq!(rlp.val_at::<Address>(4).unwrap(), tx().to);
        assert_eq!(rlp.val_at::<U256>(10).unwrap(), 324.into());
        assert_eq!(rlp.val_at::<Vec<u8>>(14).unwrap(), vec![0xab; 65]);
    }

    #[test]
    fn paymaster_params_empty_without_paymaster() {
        let mut plain = tx();
        plain.paymaster = Address::zero();
        plain.paymaster_input = Bytes::default();
        let raw = plain.rlp_signed(&Bytes::from(vec![0xab; 65]));

        let rlp = Rlp::new(&raw[1..]);
        assert_eq!(rlp.at(15).unwrap().item_count().unwrap(), 0);
    }

    #[test]
    fn typed_data_encodes_addresses_numerically() {
        let td = tx().typed_data();
        assert_eq!(td.primary_type, "Transaction");
        assert_eq!(td.domain.name.as_deref(), Some("zkSync"));
        assert_eq!(td.domain.chain_id, Some(324.into()));

        let from = td.message.get("from").unwrap().as_str().unwrap();
        assert_eq!(U256::from_dec_str(from).unwrap(), address_to_u256(&tx().from));
        assert_eq!(td.message.get("txType").unwrap().as_str().unwrap(), "113");
    }
}
