#![allow(dead_code)]

use ethers::{
    providers::{MockProvider, Provider},
    types::{Address, Bytes, TransactionReceipt, H256, U256},
};
use std::sync::{Arc, Mutex};
use valise_account::{AccountClient, AccountConfig, SimpleAccount};
use valise_bundler::{
    BundlerClient, BundlerError, PaymasterService, SponsorshipData, ZkPaymasterData,
};
use valise_primitives::{
    Eip712Transaction, UserOperation, UserOperationGasEstimation, UserOperationGasPrice,
    UserOperationHash, UserOperationReceipt, Wallet,
};

pub const PHRASE: &str = "test test test test test test test test test test test junk";

pub type MockedClient =
    AccountClient<SimpleAccount<Provider<MockProvider>>, MockBundler, Provider<MockProvider>>;

/// Bundler double that records every call and can be primed with failures and receipts
#[derive(Debug, Default)]
pub struct MockBundler {
    pub estimated: Mutex<Vec<UserOperation>>,
    pub sent: Mutex<Vec<UserOperation>>,
    pub send_error: Mutex<Option<BundlerError>>,
    pub receipt: Mutex<Option<UserOperationReceipt>>,
    pub zk_paymaster_calls: Mutex<usize>,
    pub broadcasts: Mutex<Vec<Bytes>>,
}

#[async_trait::async_trait]
impl BundlerClient for MockBundler {
    async fn get_user_operation_gas_price(
        &self,
    ) -> Result<UserOperationGasPrice, BundlerError> {
        Ok(UserOperationGasPrice {
            max_fee_per_gas: 2_000_000_000u64.into(),
            max_priority_fee_per_gas: 1_000_000_000u64.into(),
        })
    }

    async fn estimate_user_operation_gas(
        &self,
        uo: &UserOperation,
    ) -> Result<UserOperationGasEstimation, BundlerError> {
        self.estimated.lock().unwrap().push(uo.clone());
        Ok(UserOperationGasEstimation {
            pre_verification_gas: 45_000.into(),
            verification_gas_limit: 110_000.into(),
            call_gas_limit: 90_000.into(),
        })
    }

    async fn send_user_operation(
        &self,
        uo: &UserOperation,
    ) -> Result<UserOperationHash, BundlerError> {
        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(uo.clone());
        Ok(UserOperationHash(H256::repeat_byte(0xaa)))
    }

    async fn get_user_operation_receipt(
        &self,
        _hash: &UserOperationHash,
    ) -> Result<Option<UserOperationReceipt>, BundlerError> {
        Ok(self.receipt.lock().unwrap().clone())
    }

    async fn zk_paymaster_data(
        &self,
        _tx: &Eip712Transaction,
    ) -> Result<ZkPaymasterData, BundlerError> {
        *self.zk_paymaster_calls.lock().unwrap() += 1;
        Ok(ZkPaymasterData {
            paymaster: "0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf".parse().unwrap(),
            paymaster_input: "0x8c5a3445".parse().unwrap(),
        })
    }

    async fn zk_broadcast_transaction(&self, raw: Bytes) -> Result<H256, BundlerError> {
        self.broadcasts.lock().unwrap().push(raw);
        Ok(H256::repeat_byte(0x11))
    }
}

/// Paymaster service double; `with_budgets` controls whether the first response carries
/// gas budgets (skipping the builder's estimation round) or not
pub struct MockPaymaster {
    pub with_budgets: bool,
    pub calls: Mutex<usize>,
}

impl MockPaymaster {
    pub fn new(with_budgets: bool) -> Self {
        Self { with_budgets, calls: Mutex::new(0) }
    }
}

#[async_trait::async_trait]
impl PaymasterService for MockPaymaster {
    async fn sponsor_user_operation(
        &self,
        _uo: &UserOperation,
    ) -> Result<SponsorshipData, BundlerError> {
        *self.calls.lock().unwrap() += 1;
        let budget = |value: u64| self.with_budgets.then(|| U256::from(value));
        Ok(SponsorshipData {
            paymaster_and_data: Bytes::from(vec![0x02; 84]),
            call_gas_limit: budget(95_000),
            verification_gas_limit: budget(120_000),
            pre_verification_gas: budget(48_000),
        })
    }
}

pub fn client(
    config: AccountConfig,
) -> (MockedClient, Arc<MockBundler>, MockProvider) {
    let (provider, mock) = Provider::mocked();
    let provider = Arc::new(provider);
    let wallet = Wallet::from_phrase(PHRASE, &config.chain.id().into()).unwrap();
    let account = Arc::new(SimpleAccount::new(provider.clone(), wallet, config));
    let bundler = Arc::new(MockBundler::default());
    (AccountClient::new(account, bundler.clone(), provider), bundler, mock)
}

/// ABI word holding a small integer, the shape of a mocked `eth_call` answer
pub fn abi_word(value: u64) -> Bytes {
    Bytes::from(H256::from_low_u64_be(value).to_fixed_bytes().to_vec())
}

pub fn receipt_for(hash: UserOperationHash, sender: Address) -> UserOperationReceipt {
    let tx_hash = H256::repeat_byte(0x33);
    UserOperationReceipt {
        user_operation_hash: hash,
        sender,
        nonce: U256::zero(),
        paymaster: None,
        actual_gas_cost: 1_000.into(),
        actual_gas_used: 1_000.into(),
        success: true,
        reason: String::new(),
        logs: vec![],
        tx_receipt: TransactionReceipt { transaction_hash: tx_hash, ..Default::default() },
    }
}

pub fn node_receipt() -> TransactionReceipt {
    TransactionReceipt { transaction_hash: H256::repeat_byte(0x33), ..Default::default() }
}
