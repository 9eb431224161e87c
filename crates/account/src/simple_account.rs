//! SimpleAccount-style account family
//!
//! Covers factory-deployed accounts that verify a prefixed ECDSA signature of the
//! operation hash (the reference `SimpleAccount` and its derivatives). The account
//! address comes from the factory's `getAddress` prediction unless configured
//! explicitly, and deployment status is cached after the first positive `getCode`.

use crate::{
    builder::{Account, ExecuteRequest},
    config::{AccountConfig, Sponsorship},
    error::AccountError,
};
use ethers::{
    providers::Middleware,
    types::{transaction::eip712::TypedData, Address, Bytes, H256, U256},
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::OnceCell;
use tracing::trace;
use valise_contracts::{AccountApi, AccountFactoryApi, EntryPointApi, Erc20Api};
use valise_primitives::{UserOperation, Wallet};

pub struct SimpleAccount<M: Middleware + 'static> {
    provider: Arc<M>,
    wallet: Wallet,
    config: AccountConfig,
    entry_point: EntryPointApi<M>,
    factory: AccountFactoryApi<M>,
    /// Zero-address instance, used only to encode execute calldata
    encoder: AccountApi<M>,
    sender: OnceCell<Address>,
    deployed: AtomicBool,
}

impl<M: Middleware + 'static> SimpleAccount<M> {
    pub fn new(provider: Arc<M>, wallet: Wallet, config: AccountConfig) -> Self {
        let entry_point = EntryPointApi::new(config.entry_point, provider.clone());
        let factory = AccountFactoryApi::new(config.factory, provider.clone());
        let encoder = AccountApi::new(Address::zero(), provider.clone());
        Self {
            provider,
            wallet,
            config,
            entry_point,
            factory,
            encoder,
            sender: OnceCell::new(),
            deployed: AtomicBool::new(false),
        }
    }

    /// The account contract bound at the resolved sender address
    async fn account_api(&self) -> Result<AccountApi<M>, AccountError> {
        let sender = self.resolve_sender().await?;
        Ok(AccountApi::new(sender, self.provider.clone()))
    }
}

#[async_trait::async_trait]
impl<M: Middleware + 'static> Account for SimpleAccount<M> {
    fn config(&self) -> &AccountConfig {
        &self.config
    }

    fn owner(&self) -> Address {
        self.wallet.address()
    }

    async fn resolve_sender(&self) -> Result<Address, AccountError> {
        if let Some(address) = self.config.account_address {
            return Ok(address);
        }
        self.sender
            .get_or_try_init(|| async {
                let address = self
                    .factory
                    .get_address(self.wallet.address(), self.config.factory_data.clone())
                    .call()
                    .await
                    .map_err(|err| AccountError::Provider {
                        inner: format!("counterfactual address lookup failed: {err}"),
                    })?;
                trace!("resolved counterfactual address: {address:?}");
                Ok(address)
            })
            .await
            .copied()
    }

    async fn init_code(&self) -> Result<Bytes, AccountError> {
        if self.deployed.load(Ordering::Acquire) {
            return Ok(Bytes::default());
        }
        let sender = self.resolve_sender().await?;
        let code =
            self.provider.get_code(sender, None).await.map_err(AccountError::provider)?;
        if !code.is_empty() {
            // Deployment is permanent, so the positive answer is cached for good.
            self.deployed.store(true, Ordering::Release);
            return Ok(Bytes::default());
        }

        let calldata = self
            .factory
            .create_account(self.wallet.address(), self.config.factory_data.clone())
            .calldata()
            .ok_or_else(|| AccountError::Provider {
                inner: "factory createAccount encoding failed".into(),
            })?;
        Ok([self.config.factory.as_bytes(), calldata.as_ref()].concat().into())
    }

    async fn next_nonce(&self, key: U256) -> Result<U256, AccountError> {
        let sender = self.resolve_sender().await?;
        self.entry_point
            .get_nonce(sender, key)
            .call()
            .await
            .map_err(|err| AccountError::Provider {
                inner: format!("entry point nonce read failed: {err}"),
            })
    }

    fn encode_execution(&self, to: Address, value: U256, data: Bytes) -> Bytes {
        self.encoder.execute(to, value, data).calldata().unwrap_or_default()
    }

    fn encode_execution_batch(
        &self,
        targets: Vec<Address>,
        values: Vec<U256>,
        datas: Vec<Bytes>,
    ) -> Bytes {
        self.encoder.execute_batch(targets, values, datas).calldata().unwrap_or_default()
    }

    fn operation_hash(&self, uo: &UserOperation) -> H256 {
        uo.hash(&self.config.entry_point, &self.config.chain.id().into()).0
    }

    async fn sign_hash(&self, hash: H256) -> Result<Bytes, AccountError> {
        // SimpleAccount verifies an EIP-191 prefixed signature of the operation hash.
        self.wallet
            .sign_message(hash.as_bytes())
            .await
            .map_err(|err| AccountError::Signer { inner: err.to_string() })
    }

    async fn sign_message_raw(&self, msg: &[u8]) -> Result<Bytes, AccountError> {
        self.wallet
            .sign_message(msg)
            .await
            .map_err(|err| AccountError::Signer { inner: err.to_string() })
    }

    async fn sign_typed_data(&self, payload: &TypedData) -> Result<Bytes, AccountError> {
        self.wallet
            .sign_typed_data(payload)
            .await
            .map_err(|err| AccountError::Signer { inner: err.to_string() })
    }

    async fn supports_wrapped_messages(&self) -> bool {
        // Probe the deployed contract; older account implementations revert here and
        // fall back to raw owner signatures.
        let api = match self.account_api().await {
            Ok(api) => api,
            Err(_) => return false,
        };
        api.get_message_hash([0u8; 32]).call().await.is_ok()
    }

    async fn is_paymaster_approved(&self) -> Result<bool, AccountError> {
        let Sponsorship::Erc20Token { token, paymaster } = &self.config.sponsorship else {
            return Ok(true);
        };
        let sender = self.resolve_sender().await?;
        let token_api = Erc20Api::new(*token, self.provider.clone());
        let allowance = token_api
            .allowance(sender, *paymaster)
            .call()
            .await
            .map_err(|err| AccountError::Provider {
                inner: format!("token allowance read failed: {err}"),
            })?;
        Ok(!allowance.is_zero())
    }

    async fn approval_transaction(&self) -> Result<Option<ExecuteRequest>, AccountError> {
        let Sponsorship::Erc20Token { token, paymaster } = &self.config.sponsorship else {
            return Ok(None);
        };
        let token_api = Erc20Api::new(*token, self.provider.clone());
        let calldata = token_api
            .approve(*paymaster, U256::MAX)
            .calldata()
            .ok_or_else(|| AccountError::Provider {
                inner: "token approve encoding failed".into(),
            })?;
        Ok(Some(ExecuteRequest::new().to(*token).data(calldata)))
    }
}
