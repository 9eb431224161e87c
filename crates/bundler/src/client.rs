use crate::error::BundlerError;
use ethers::types::{Address, Bytes, H256};
use serde::{Deserialize, Serialize};
use valise_primitives::{
    Eip712Transaction, UserOperation, UserOperationGasEstimation, UserOperationGasPrice,
    UserOperationHash, UserOperationReceipt,
};

/// Paymaster parameters returned by the native-L2 paymaster endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkPaymasterData {
    /// Sponsoring paymaster contract
    pub paymaster: Address,
    /// Opaque input forwarded to the paymaster during execution
    pub paymaster_input: Bytes,
}

/// A trait for the bundler relay the pipeline submits operations to
///
/// Implementations live outside this repository (the relay is an external service); the
/// pipeline only depends on this seam, and tests substitute mocks for it.
#[async_trait::async_trait]
pub trait BundlerClient: Send + Sync + 'static {
    /// Quote the fee fields for a user operation
    ///
    /// Only meaningful when the RPC endpoint is operated by the same party as the
    /// bundler; otherwise fees come from the chain's fee market.
    async fn get_user_operation_gas_price(&self)
        -> Result<UserOperationGasPrice, BundlerError>;

    /// Simulate the operation and fill the three gas budgets
    ///
    /// # Arguments
    /// * `uo` - The estimation operation (placeholder signature, fallback gas limits)
    ///
    /// # Returns
    /// * `UserOperationGasEstimation` - The simulated gas budgets
    async fn estimate_user_operation_gas(
        &self,
        uo: &UserOperation,
    ) -> Result<UserOperationGasEstimation, BundlerError>;

    /// Submit a signed operation for inclusion
    ///
    /// # Arguments
    /// * `uo` - The signed [UserOperation](UserOperation)
    ///
    /// # Returns
    /// * `UserOperationHash` - The hash under which the bundler tracks the operation
    async fn send_user_operation(
        &self,
        uo: &UserOperation,
    ) -> Result<UserOperationHash, BundlerError>;

    /// Fetch the receipt of a submitted operation, `None` while still pending
    async fn get_user_operation_receipt(
        &self,
        hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, BundlerError>;

    /// Negotiate paymaster parameters for a native-L2 transaction
    async fn zk_paymaster_data(
        &self,
        tx: &Eip712Transaction,
    ) -> Result<ZkPaymasterData, BundlerError>;

    /// Broadcast a signed native-L2 transaction envelope
    ///
    /// # Returns
    /// * `H256` - The L2 transaction hash
    async fn zk_broadcast_transaction(&self, raw: Bytes) -> Result<H256, BundlerError>;
}
