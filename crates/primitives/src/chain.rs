//! Chain extensions
use alloy_chains::{Chain, NamedChain};

/// Chain ids of the L2 family that speaks its own native account abstraction protocol
/// (EIP-712 transaction envelope + paymaster negotiation) instead of ERC-4337
pub const NATIVE_AA_CHAIN_IDS: [u64; 2] = [324, 280];

pub trait ChainExt {
    /// True if the chain uses the native account abstraction protocol and user operations
    /// must be sent through the EIP-712 transaction path instead of an ERC-4337 bundler
    fn uses_native_aa(&self) -> bool;

    /// True if the chain runs a fee market with a separate tip; chains without one
    /// (the BNB Smart Chain family) require the priority fee to equal the max fee
    fn has_tip_market(&self) -> bool;
}

impl ChainExt for Chain {
    fn uses_native_aa(&self) -> bool {
        NATIVE_AA_CHAIN_IDS.contains(&self.id())
    }

    fn has_tip_market(&self) -> bool {
        !matches!(
            self.named(),
            Some(NamedChain::BinanceSmartChain | NamedChain::BinanceSmartChainTestnet)
        )
    }
}
