//! Smart contract wallet (ERC-4337) bundler client interface
//!
//! The pipeline treats the bundler relay and the sponsoring paymaster service as
//! external collaborators, specified only by the traits in this crate.

mod client;
mod error;
mod paymaster;

pub use client::{BundlerClient, ZkPaymasterData};
pub use error::BundlerError;
pub use paymaster::{PaymasterService, SponsorshipData};
