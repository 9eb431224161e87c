//! Send orchestration
//!
//! [`AccountClient`] drives the full pipeline for a send: validation, one-time ERC-20
//! paymaster approval, building, signing, submission, and the [`PendingOperation`]
//! handle the caller polls for inclusion. Native account abstraction chains branch off
//! before the ERC-4337 machinery is touched.

use crate::{
    builder::{build_user_operation, Account, ExecuteRequest, SendOptions},
    config::Sponsorship,
    error::AccountError,
};
use ethers::{
    prelude::rand::{self, RngCore},
    providers::Middleware,
    types::{Address, Bytes, TransactionReceipt, H256, U256},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};
use tracing::info;
use valise_bundler::{BundlerClient, PaymasterService};
use valise_primitives::{
    constants::wait, get_address, ChainExt, UserOperationHash, UserOperationReceipt,
};

/// Client that sends operations through a smart account
///
/// Holds the account, the bundler relay, and the RPC provider; one instance is meant to
/// live as long as the account and can serve concurrent sends.
pub struct AccountClient<A, B, M>
where
    A: Account,
    B: BundlerClient,
    M: Middleware + 'static,
{
    pub(crate) account: Arc<A>,
    pub(crate) bundler: Arc<B>,
    pub(crate) provider: Arc<M>,
    pub(crate) paymaster: Option<Arc<dyn PaymasterService>>,
    /// Guards the one-time ERC-20 paymaster approval; concurrent sends queue here so
    /// only one approval operation ever goes out
    approval: Mutex<bool>,
}

impl<A, B, M> AccountClient<A, B, M>
where
    A: Account,
    B: BundlerClient,
    M: Middleware + 'static,
{
    pub fn new(account: Arc<A>, bundler: Arc<B>, provider: Arc<M>) -> Self {
        Self { account, bundler, provider, paymaster: None, approval: Mutex::new(false) }
    }

    /// Attaches the paymaster service used for gasless sponsorship
    pub fn with_paymaster(mut self, paymaster: Arc<dyn PaymasterService>) -> Self {
        self.paymaster = Some(paymaster);
        self
    }

    /// The account this client sends through
    pub fn account(&self) -> &A {
        &self.account
    }

    /// Sends a single call through the account
    ///
    /// Validates the request before any network call, routes native account abstraction
    /// chains to their own path, runs the one-time paymaster approval if needed, then
    /// builds, signs and submits the operation.
    pub async fn send(
        &self,
        request: ExecuteRequest,
        opts: SendOptions,
    ) -> Result<PendingOperation<B, M>, AccountError> {
        let to = request
            .to
            .ok_or_else(|| AccountError::config("transaction target (to) is missing"))?;
        if request.data.is_empty() && request.value.is_zero() && opts.call_data.is_none()
        {
            return Err(AccountError::config(
                "transaction carries neither call data nor value",
            ));
        }

        if self.account.config().chain.uses_native_aa() {
            return self.send_native(to, request.value, request.data, &opts).await;
        }

        self.ensure_paymaster_approved().await?;
        self.send_inner(to, request.value, request.data, &opts).await
    }

    /// Sends a batch of calls as a single operation
    ///
    /// All calls execute in order inside one user operation; they share one signature
    /// and one gas payment.
    pub async fn send_batch(
        &self,
        requests: Vec<ExecuteRequest>,
        mut opts: SendOptions,
    ) -> Result<PendingOperation<B, M>, AccountError> {
        if requests.is_empty() {
            return Err(AccountError::config("batch is empty"));
        }
        if self.account.config().chain.uses_native_aa() {
            return Err(AccountError::config(
                "batched sends are not supported on native account abstraction chains",
            ));
        }

        let mut targets = Vec::with_capacity(requests.len());
        let mut values = Vec::with_capacity(requests.len());
        let mut datas = Vec::with_capacity(requests.len());
        for request in requests {
            let to = request.to.ok_or_else(|| {
                AccountError::config("batch entry is missing a target (to)")
            })?;
            targets.push(to);
            values.push(request.value);
            datas.push(request.data);
        }

        let first = targets[0];
        let value = values.iter().fold(U256::zero(), |acc, v| acc + v);
        opts.call_data =
            Some(self.account.encode_execution_batch(targets, values, datas));

        self.ensure_paymaster_approved().await?;
        self.send_inner(first, value, Bytes::default(), &opts).await
    }

    /// Builds, signs and submits one operation; no validation, no approval
    ///
    /// This is the path the approval and self-deployment operations take, so it must
    /// not recurse into the precondition checks.
    pub(crate) async fn send_inner(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        opts: &SendOptions,
    ) -> Result<PendingOperation<B, M>, AccountError> {
        let nonce_key = random_nonce_key(self.account.config().nonce_key_bits);
        let mut uo = build_user_operation(
            &self.provider,
            self.account.as_ref(),
            self.bundler.as_ref(),
            self.paymaster.as_deref(),
            nonce_key,
            to,
            value,
            data,
            opts,
        )
        .await?;

        let hash = self.account.operation_hash(&uo);
        uo.signature = self.account.sign_hash(hash).await?;

        let uo_hash = match self.bundler.send_user_operation(&uo).await {
            Ok(hash) => hash,
            Err(err) => {
                let mut mapped = AccountError::from_submission(err);
                // The rejection message does not always name the paymaster; the
                // operation itself knows which one it rode.
                if let AccountError::Submission { paymaster: paymaster @ None, .. } =
                    &mut mapped
                {
                    *paymaster = get_address(&uo.paymaster_and_data);
                }
                return Err(mapped);
            }
        };
        info!("user operation submitted, hash: {:?}, sender: {:?}", uo_hash, uo.sender);

        Ok(PendingOperation {
            kind: Pending::UserOperation(uo_hash),
            bundler: self.bundler.clone(),
            provider: self.provider.clone(),
        })
    }

    /// Runs the one-time ERC-20 paymaster approval if this account needs it
    async fn ensure_paymaster_approved(&self) -> Result<(), AccountError> {
        if !matches!(
            self.account.config().sponsorship,
            Sponsorship::Erc20Token { .. }
        ) {
            return Ok(());
        }

        let mut approved = self.approval.lock().await;
        if *approved {
            return Ok(());
        }
        if self.account.is_paymaster_approved().await? {
            *approved = true;
            return Ok(());
        }
        let Some(request) = self.account.approval_transaction().await? else {
            *approved = true;
            return Ok(());
        };
        let to = request
            .to
            .ok_or_else(|| AccountError::config("approval transaction has no target"))?;

        info!("approving token paymaster before first sponsored send");
        let pending =
            self.send_inner(to, request.value, request.data, &SendOptions::default())
                .await?;
        pending.wait(WaitOptions::default()).await?;
        *approved = true;
        Ok(())
    }
}

/// Draws a random nonce key of the given bit width (at most 192 bits)
///
/// Each send runs in its own nonce namespace, so concurrent operations from the same
/// account never contend for a sequence number.
pub(crate) fn random_nonce_key(bits: usize) -> U256 {
    let bytes = bits.min(192) / 8;
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf[32 - bytes..]);
    U256::from_big_endian(&buf)
}

/// What a send is waiting on
#[derive(Debug)]
enum Pending {
    UserOperation(UserOperationHash),
    Native(H256),
}

/// Handle for a submitted operation
///
/// Polls the bundler (or the node, on the native path) until the operation is included
/// or the deadline passes. Dropping the handle does not cancel the operation.
#[derive(Debug)]
pub struct PendingOperation<B, M>
where
    B: BundlerClient,
    M: Middleware + 'static,
{
    kind: Pending,
    bundler: Arc<B>,
    provider: Arc<M>,
}

/// Deadline and polling interval for [`PendingOperation::wait`]
#[derive(Clone, Copy, Debug)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(wait::TIMEOUT),
            interval: Duration::from_secs(wait::INTERVAL),
        }
    }
}

/// Receipt of an included operation
#[derive(Debug)]
pub enum OperationOutcome {
    /// ERC-4337 receipt from the bundler, cross-checked against the node
    UserOperation(Box<UserOperationReceipt>),
    /// Plain transaction receipt from the native path
    Native(TransactionReceipt),
}

impl OperationOutcome {
    /// Hash of the transaction that included the operation
    pub fn transaction_hash(&self) -> H256 {
        match self {
            OperationOutcome::UserOperation(receipt) => {
                receipt.tx_receipt.transaction_hash
            }
            OperationOutcome::Native(receipt) => receipt.transaction_hash,
        }
    }
}

impl<B, M> PendingOperation<B, M>
where
    B: BundlerClient,
    M: Middleware + 'static,
{
    pub(crate) fn native(hash: H256, bundler: Arc<B>, provider: Arc<M>) -> Self {
        Self { kind: Pending::Native(hash), bundler, provider }
    }

    /// The hash under which the operation is tracked
    pub fn hash(&self) -> H256 {
        match &self.kind {
            Pending::UserOperation(hash) => hash.0,
            Pending::Native(hash) => *hash,
        }
    }

    /// Waits for the operation to be included
    ///
    /// Timing out is not a failure of the operation itself: it may still land later,
    /// and the hash can be polled again.
    pub async fn wait(
        &self,
        opts: WaitOptions,
    ) -> Result<OperationOutcome, AccountError> {
        let started = Instant::now();
        loop {
            if let Some(outcome) = self.poll_included().await? {
                return Ok(outcome);
            }
            if started.elapsed() + opts.interval >= opts.timeout {
                return Err(AccountError::Timeout {
                    hash: self.hash().into(),
                    seconds: opts.timeout.as_secs(),
                });
            }
            sleep(opts.interval).await;
        }
    }

    async fn poll_included(&self) -> Result<Option<OperationOutcome>, AccountError> {
        match &self.kind {
            Pending::UserOperation(hash) => {
                let Some(receipt) = self
                    .bundler
                    .get_user_operation_receipt(hash)
                    .await
                    .map_err(AccountError::from_submission)?
                else {
                    return Ok(None);
                };
                // The bundler can briefly run ahead of the RPC node; only report
                // inclusion once the node has the transaction too.
                let seen = self
                    .provider
                    .get_transaction_receipt(receipt.tx_receipt.transaction_hash)
                    .await
                    .map_err(AccountError::provider)?;
                Ok(seen.map(|_| OperationOutcome::UserOperation(Box::new(receipt))))
            }
            Pending::Native(hash) => Ok(self
                .provider
                .get_transaction_receipt(*hash)
                .await
                .map_err(AccountError::provider)?
                .map(OperationOutcome::Native)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_keys_are_distinct() {
        let a = random_nonce_key(192);
        let b = random_nonce_key(192);
        assert_ne!(a, b);
    }

    #[test]
    fn nonce_key_respects_width() {
        assert!(random_nonce_key(64) < U256::one() << 64);
        assert!(random_nonce_key(192) < U256::one() << 192);
        assert_eq!(random_nonce_key(0), U256::zero());
    }

    #[test]
    fn wait_defaults() {
        let opts = WaitOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(120));
        assert_eq!(opts.interval, Duration::from_secs(1));
    }
}
