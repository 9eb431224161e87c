use crate::error::BundlerError;
use ethers::types::{Bytes, U256};
use serde::{Deserialize, Serialize};
use valise_primitives::UserOperation;

/// Sponsorship data returned by a first-party paymaster service
///
/// Some services return concrete gas budgets alongside the paymaster data; when they do,
/// the builder skips its own estimation round.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipData {
    /// Paymaster address followed by its signed data
    pub paymaster_and_data: Bytes,
    pub call_gas_limit: Option<U256>,
    pub verification_gas_limit: Option<U256>,
    pub pre_verification_gas: Option<U256>,
}

impl SponsorshipData {
    /// True if the service returned all three gas budgets
    pub fn has_gas_budgets(&self) -> bool {
        self.call_gas_limit.is_some()
            && self.verification_gas_limit.is_some()
            && self.pre_verification_gas.is_some()
    }
}

/// A trait for the paymaster service that sponsors gasless operations
///
/// Paymasters may need to re-sign once the gas budgets are fixed, so the builder calls
/// this up to twice per operation: once before estimation and, if the first response
/// carried no gas budgets, once more with the estimated operation.
#[async_trait::async_trait]
pub trait PaymasterService: Send + Sync + 'static {
    /// Request sponsorship for the given operation
    async fn sponsor_user_operation(
        &self,
        uo: &UserOperation,
    ) -> Result<SponsorshipData, BundlerError>;
}
