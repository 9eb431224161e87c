//! Smart contract wallet (ERC-4337) contract interfaces
//!
//! Bindings for the entry point, the account factory, the account itself, and the
//! ERC-20 token interface, plus decoding of their revert errors.

pub mod error;
pub mod gen;

pub use error::{
    decode_revert_error, decode_revert_string, extract_address, EntryPointError,
};
pub use gen::{
    AccountApi, AccountFactoryApi, EntryPointApi, EntryPointApiErrors, Erc20Api, FailedOp,
};
