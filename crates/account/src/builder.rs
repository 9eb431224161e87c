//! User operation builder
//!
//! [`build_user_operation`] assembles an unsigned operation from an execution request:
//! it resolves fees, nonce and init code, encodes the account call, runs gas estimation
//! against the bundler, and negotiates sponsorship. The family-specific pieces (address
//! derivation, call encoding, signing scheme) come in through the [`Account`] trait.

use crate::{
    config::{AccountConfig, Sponsorship},
    error::AccountError,
};
use ethers::{
    providers::Middleware,
    types::{
        transaction::eip712::TypedData, Address, Bytes, TransactionRequest, H256, U256,
    },
};
use std::{str::FromStr, sync::Arc};
use tracing::{debug, trace};
use valise_bundler::{BundlerClient, PaymasterService};
use valise_contracts::{extract_address, EntryPointApiErrors, EntryPointError};
use valise_primitives::{constants::build, ChainExt, UserOperation};

/// A single call for the smart account to forward
#[derive(Clone, Debug, Default)]
pub struct ExecuteRequest {
    /// Call target; a send with no target is rejected before any network call
    pub to: Option<Address>,
    /// Native value forwarded with the call
    pub value: U256,
    /// Call data forwarded to the target
    pub data: Bytes,
}

impl ExecuteRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the call target
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the forwarded value
    pub fn value<T: Into<U256>>(mut self, value: T) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the forwarded call data
    pub fn data(mut self, data: Bytes) -> Self {
        self.data = data;
        self
    }
}

/// Caller-supplied overrides for a single send
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    /// Explicit max fee; skips the fee quote when set together with the priority fee
    pub max_fee_per_gas: Option<U256>,
    /// Explicit priority fee
    pub max_priority_fee_per_gas: Option<U256>,
    /// Explicit gas limit for the inner call; skips the local fail-fast estimate
    pub gas_limit: Option<U256>,
    /// Pre-encoded account call data (batched execution); bypasses call encoding
    pub call_data: Option<Bytes>,
}

/// Family-specific operations of a smart account
///
/// One implementation per account contract family. The builder and the orchestrator only
/// talk to accounts through this trait.
#[async_trait::async_trait]
pub trait Account: Send + Sync {
    /// The static configuration of this account
    fn config(&self) -> &AccountConfig;

    /// Address of the signing key that controls the account
    fn owner(&self) -> Address;

    /// The account's wallet address: explicit from config, or predicted by the factory.
    /// The lookup runs at most once per account instance.
    async fn resolve_sender(&self) -> Result<Address, AccountError>;

    /// Deployment init code (factory address followed by its calldata), or empty once
    /// the account is deployed. The deployment check is cached: once code has been
    /// observed on chain, no further `getCode` calls are made.
    async fn init_code(&self) -> Result<Bytes, AccountError>;

    /// The entry point tracked nonce under the given key, re-read on every call
    async fn next_nonce(&self, key: U256) -> Result<U256, AccountError>;

    /// Encodes a single call into the account's execute calldata
    fn encode_execution(&self, to: Address, value: U256, data: Bytes) -> Bytes;

    /// Encodes a batch of calls into the account's batched execute calldata
    fn encode_execution_batch(
        &self,
        targets: Vec<Address>,
        values: Vec<U256>,
        datas: Vec<Bytes>,
    ) -> Bytes;

    /// The canonical signing hash of the operation (binds entry point and chain id)
    fn operation_hash(&self, uo: &UserOperation) -> H256;

    /// Signs the operation hash the way the account contract verifies it
    async fn sign_hash(&self, hash: H256) -> Result<Bytes, AccountError>;

    /// Signs a personal message with the owner key
    async fn sign_message_raw(&self, msg: &[u8]) -> Result<Bytes, AccountError>;

    /// Signs an EIP-712 typed-data payload with the owner key
    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Bytes, AccountError>;

    /// True if the deployed account contract supports wrapped (EIP-712) message signing
    async fn supports_wrapped_messages(&self) -> bool;

    /// True if the token paymaster already holds a sufficient allowance. Always true
    /// outside ERC-20 sponsorship.
    async fn is_paymaster_approved(&self) -> Result<bool, AccountError>;

    /// The approval call to run before the first ERC-20 sponsored send, if any
    async fn approval_transaction(&self) -> Result<Option<ExecuteRequest>, AccountError>;
}

/// Builds an unsigned user operation for a single call
///
/// The returned operation carries concrete fee and gas values and an empty signature;
/// signing is the caller's next step. Fee resolution, nonce, init code and call encoding
/// all happen here, so a build that returns `Ok` is ready for the entry point.
pub(crate) async fn build_user_operation<M, A, B>(
    provider: &Arc<M>,
    account: &A,
    bundler: &B,
    paymaster: Option<&dyn PaymasterService>,
    nonce_key: U256,
    to: Address,
    value: U256,
    data: Bytes,
    opts: &SendOptions,
) -> Result<UserOperation, AccountError>
where
    M: Middleware + 'static,
    A: Account + ?Sized,
    B: BundlerClient + ?Sized,
{
    let config = account.config();

    let (max_fee_per_gas, max_priority_fee_per_gas) =
        resolve_fees(provider, bundler, config, opts).await?;
    if max_fee_per_gas.is_zero() {
        return Err(AccountError::config("fee resolution produced a zero max fee"));
    }

    let sender = account.resolve_sender().await?;
    // Independent reads, so overlap them.
    let (nonce, init_code) =
        tokio::try_join!(account.next_nonce(nonce_key), account.init_code())?;

    let call_data = match &opts.call_data {
        Some(data) => data.clone(),
        None => account.encode_execution(to, value, data.clone()),
    };

    // Fail fast on calls that revert, before paying for a bundler round trip. An
    // explicit gas limit or pre-encoded call data means the caller knows better.
    if opts.gas_limit.is_none() && opts.call_data.is_none() {
        let probe = TransactionRequest::new().from(sender).to(to).value(value).data(data);
        provider.estimate_gas(&probe.into(), None).await.map_err(|err| {
            match EntryPointError::from_middleware_error::<M>(err) {
                Ok(EntryPointApiErrors::FailedOp(op)) => AccountError::Estimation {
                    paymaster: extract_address(&op.reason),
                    inner: op.to_string(),
                },
                Ok(EntryPointApiErrors::RevertString(reason)) => {
                    AccountError::Estimation {
                        paymaster: None,
                        inner: format!("execution reverted: {reason}"),
                    }
                }
                Ok(other) => AccountError::Estimation {
                    paymaster: None,
                    inner: format!("execution reverted: {other:?}"),
                },
                Err(err) => AccountError::provider(err),
            }
        })?;
    }

    let fallback = U256::from(build::FALLBACK_GAS_LIMIT);
    let mut uo = UserOperation::default()
        .sender(sender)
        .nonce(nonce)
        .init_code(init_code)
        .call_data(call_data)
        .call_gas_limit(fallback)
        .verification_gas_limit(fallback)
        .pre_verification_gas(fallback)
        .max_fee_per_gas(max_fee_per_gas)
        .max_priority_fee_per_gas(max_priority_fee_per_gas)
        .signature(
            Bytes::from_str(build::DUMMY_SIGNATURE).expect("placeholder signature valid"),
        );

    match &config.sponsorship {
        Sponsorship::SelfFunded => {
            apply_gas_estimate(bundler, &mut uo, opts).await?;
        }
        Sponsorship::Erc20Token { paymaster, .. } => {
            // The token paymaster is a known contract; only its address goes into the
            // operation, and the bundler simulates with it in place.
            uo.paymaster_and_data = paymaster.as_bytes().to_vec().into();
            apply_gas_estimate(bundler, &mut uo, opts).await?;
        }
        Sponsorship::Gasless => {
            let service = paymaster.ok_or_else(|| {
                AccountError::config(
                    "gasless sponsorship configured without a paymaster service",
                )
            })?;

            let sponsorship = service
                .sponsor_user_operation(&uo)
                .await
                .map_err(AccountError::from_estimation)?;
            uo.paymaster_and_data = sponsorship.paymaster_and_data.clone();

            if sponsorship.has_gas_budgets() {
                // Service dictated the budgets; no estimation round needed.
                uo.call_gas_limit = sponsorship.call_gas_limit.unwrap_or(fallback);
                uo.verification_gas_limit =
                    sponsorship.verification_gas_limit.unwrap_or(fallback);
                uo.pre_verification_gas =
                    sponsorship.pre_verification_gas.unwrap_or(fallback);
                if let Some(gas) = opts.gas_limit {
                    uo.call_gas_limit = gas;
                }
            } else {
                apply_gas_estimate(bundler, &mut uo, opts).await?;
                // The paymaster signature covers the gas fields, so it must re-sign now
                // that estimation changed them.
                let resigned = service
                    .sponsor_user_operation(&uo)
                    .await
                    .map_err(AccountError::from_estimation)?;
                if !resigned.paymaster_and_data.is_empty() {
                    uo.paymaster_and_data = resigned.paymaster_and_data;
                }
            }
        }
    }

    // The placeholder must never leave the builder.
    uo.signature = Bytes::default();

    if !uo.is_priced() {
        return Err(AccountError::config(
            "built operation is missing fee or gas values",
        ));
    }

    debug!(
        "built user operation, sender: {:?}, nonce: {}, call gas limit: {}",
        uo.sender, uo.nonce, uo.call_gas_limit
    );
    Ok(uo)
}

/// Resolves the EIP-1559 fee pair
///
/// Explicit overrides win; otherwise the bundler quote is used on first-party endpoints
/// and the chain's fee market everywhere else. Chains without a tip market get the max
/// fee mirrored into the priority fee.
async fn resolve_fees<M, B>(
    provider: &Arc<M>,
    bundler: &B,
    config: &AccountConfig,
    opts: &SendOptions,
) -> Result<(U256, U256), AccountError>
where
    M: Middleware + 'static,
    B: BundlerClient + ?Sized,
{
    if let (Some(max_fee), Some(priority_fee)) =
        (opts.max_fee_per_gas, opts.max_priority_fee_per_gas)
    {
        return Ok((max_fee, priority_fee));
    }

    let (max_fee, priority_fee) = if config.first_party_rpc {
        let quote = bundler
            .get_user_operation_gas_price()
            .await
            .map_err(AccountError::from_estimation)?;
        (quote.max_fee_per_gas, quote.max_priority_fee_per_gas)
    } else {
        let (max_fee, priority_fee) = provider
            .estimate_eip1559_fees(None)
            .await
            .map_err(AccountError::provider)?;
        if config.chain.has_tip_market() {
            (max_fee, priority_fee)
        } else {
            (max_fee, max_fee)
        }
    };
    trace!("resolved fees, max: {max_fee}, priority: {priority_fee}");

    Ok((
        opts.max_fee_per_gas.unwrap_or(max_fee),
        opts.max_priority_fee_per_gas.unwrap_or(priority_fee),
    ))
}

/// Runs bundler gas estimation and writes the budgets into the operation
async fn apply_gas_estimate<B: BundlerClient + ?Sized>(
    bundler: &B,
    uo: &mut UserOperation,
    opts: &SendOptions,
) -> Result<(), AccountError> {
    let est = bundler
        .estimate_user_operation_gas(uo)
        .await
        .map_err(AccountError::from_estimation)?;
    uo.call_gas_limit = est.call_gas_limit;
    uo.verification_gas_limit = est.verification_gas_limit;
    uo.pre_verification_gas = est.pre_verification_gas;
    if let Some(gas) = opts.gas_limit {
        uo.call_gas_limit = gas;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_builder() {
        let to = Address::random();
        let req = ExecuteRequest::new().to(to).value(10u64).data(Bytes::from(vec![0xca]));
        assert_eq!(req.to, Some(to));
        assert_eq!(req.value, U256::from(10));
        assert_eq!(req.data.as_ref(), [0xca]);
    }

    #[test]
    fn placeholder_signature_parses() {
        let sig = Bytes::from_str(build::DUMMY_SIGNATURE).unwrap();
        assert_eq!(sig.len(), 65);
    }
}
