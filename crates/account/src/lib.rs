//! Smart contract wallet (ERC-4337) transaction pipeline
//!
//! Takes an execution request from "call this contract with this data" to an included
//! operation: builds the user operation (fees, nonce, init code, gas estimation,
//! sponsorship), signs it, submits it to a bundler relay, and waits for inclusion.
//! Native account abstraction chains are routed through their own EIP-712 path, and
//! smart account signatures can be produced and verified per EIP-1271.

mod builder;
mod config;
mod error;
mod message;
mod send;
mod simple_account;
mod verify;
mod zksync;

pub use builder::{Account, ExecuteRequest, SendOptions};
pub use config::{AccountConfig, Sponsorship};
pub use error::AccountError;
pub use send::{AccountClient, OperationOutcome, PendingOperation, WaitOptions};
pub use simple_account::SimpleAccount;
pub use verify::{verify_signature, verify_signature_rpc};
