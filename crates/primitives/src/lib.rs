//! Smart contract wallet (ERC-4337) primitive types
//!
//! This crate contains the primitive types and helper functions of the user operation
//! pipeline: the operation itself, chain-family quirks, the signing wallet, and
//! provider construction.

pub mod chain;
pub mod constants;
pub mod provider;
mod user_operation;
mod utils;
mod wallet;
pub mod zk;

pub use chain::ChainExt;
pub use provider::RpcCredentials;
pub use user_operation::{
    UserOperation, UserOperationGasEstimation, UserOperationGasPrice, UserOperationHash,
    UserOperationReceipt,
};
pub use utils::{address_to_u256, get_address};
pub use wallet::Wallet;
pub use zk::Eip712Transaction;
