//! Native account abstraction send path
//!
//! On the zkSync-style chains the protocol itself understands accounts and paymasters:
//! there is no entry point, no user operation and no bundler simulation. A send becomes
//! an EIP-712 transaction signed by the owner key, sponsored through the paymaster
//! endpoint, and broadcast as a type-0x71 envelope.

use crate::{
    builder::{Account, SendOptions},
    config::Sponsorship,
    error::AccountError,
    send::{AccountClient, PendingOperation},
};
use ethers::{
    providers::Middleware,
    types::{Address, Bytes, TransactionRequest, U256},
};
use tracing::info;
use valise_bundler::BundlerClient;
use valise_primitives::{constants::zk, Eip712Transaction};

impl<A, B, M> AccountClient<A, B, M>
where
    A: Account,
    B: BundlerClient,
    M: Middleware + 'static,
{
    /// Sends a call through the chain's native account abstraction protocol
    ///
    /// Only sponsored sends are supported here: without a paymaster the owner key would
    /// pay gas like a plain EOA, which is not what callers of this pipeline ask for.
    /// The sponsorship check runs before any network call.
    pub(crate) async fn send_native(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
        opts: &SendOptions,
    ) -> Result<PendingOperation<B, M>, AccountError> {
        let config = self.account.config();
        if matches!(config.sponsorship, Sponsorship::SelfFunded) {
            return Err(AccountError::config(
                "native account abstraction sends require sponsorship",
            ));
        }

        // The owner key is the account on this protocol; no factory, no init code.
        let from = self.account.owner();

        let gas_price =
            self.provider.get_gas_price().await.map_err(AccountError::provider)?;
        let nonce = self
            .provider
            .get_transaction_count(from, None)
            .await
            .map_err(AccountError::provider)?;
        let gas_limit = match opts.gas_limit {
            Some(gas) => gas,
            None => {
                let probe = TransactionRequest::new()
                    .from(from)
                    .to(to)
                    .value(value)
                    .data(data.clone());
                self.provider
                    .estimate_gas(&probe.into(), None)
                    .await
                    .map_err(AccountError::provider)?
            }
        };

        let mut tx = Eip712Transaction {
            chain_id: config.chain.id().into(),
            from,
            to,
            gas_limit,
            gas_per_pubdata_byte_limit: zk::GAS_PER_PUBDATA_DEFAULT.into(),
            // No tip market on this protocol.
            max_fee_per_gas: opts.max_fee_per_gas.unwrap_or(gas_price),
            max_priority_fee_per_gas: opts.max_priority_fee_per_gas.unwrap_or(gas_price),
            nonce,
            value,
            data,
            factory_deps: vec![],
            paymaster: Address::zero(),
            paymaster_input: Bytes::default(),
        };

        let sponsorship = self
            .bundler
            .zk_paymaster_data(&tx)
            .await
            .map_err(AccountError::from_estimation)?;
        tx.paymaster = sponsorship.paymaster;
        tx.paymaster_input = sponsorship.paymaster_input;

        let signature = self.account.sign_typed_data(&tx.typed_data()).await?;
        let raw = tx.rlp_signed(&signature);
        let tx_hash = self
            .bundler
            .zk_broadcast_transaction(raw)
            .await
            .map_err(AccountError::from_submission)?;
        info!("native transaction broadcast, hash: {tx_hash:?}, from: {from:?}");

        Ok(PendingOperation::native(
            tx_hash,
            self.bundler.clone(),
            self.provider.clone(),
        ))
    }
}
