use alloy_chains::Chain;
use ethers::types::{Address, Bytes};
use valise_primitives::{
    constants::{build, entry_point},
    RpcCredentials,
};

/// How the gas of an operation is paid
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Sponsorship {
    /// The smart account pays its own gas from its entry point deposit or balance
    #[default]
    SelfFunded,
    /// A first-party paymaster service sponsors the operation
    Gasless,
    /// A token paymaster charges the account in an ERC-20 token; the account must hold a
    /// standing allowance toward the paymaster before the first sponsored send
    Erc20Token {
        /// The token the paymaster charges in
        token: Address,
        /// The paymaster contract to approve and embed in `paymasterAndData`
        paymaster: Address,
    },
}

/// Static configuration of a smart account
///
/// Everything here is known before the first network call; anything that depends on chain
/// state (counterfactual address, deployment, nonces) is resolved lazily by the account.
#[derive(Clone, Debug)]
pub struct AccountConfig {
    /// The chain the account lives on
    pub chain: Chain,
    /// The entry point contract operations are routed through
    pub entry_point: Address,
    /// The factory contract that deploys the account
    pub factory: Address,
    /// Extra data handed to the factory on deployment and address prediction
    pub factory_data: Bytes,
    /// Explicit account address; skips the counterfactual lookup when set
    pub account_address: Option<Address>,
    /// How gas is paid
    pub sponsorship: Sponsorship,
    /// True when the RPC endpoint is operated by the same party as the bundler; enables
    /// the bundler's fee quote instead of the chain's fee market
    pub first_party_rpc: bool,
    /// Bit width of the random nonce key drawn for each send
    pub nonce_key_bits: usize,
    /// Credentials attached as headers to first-party RPC requests
    pub credentials: Option<RpcCredentials>,
}

impl AccountConfig {
    /// Config with the canonical v0.6 entry point and self-funded gas
    pub fn new(chain: Chain, factory: Address) -> Self {
        Self {
            chain,
            entry_point: entry_point::ADDRESS.parse().expect("entry point address valid"),
            factory,
            factory_data: Bytes::default(),
            account_address: None,
            sponsorship: Sponsorship::default(),
            first_party_rpc: false,
            nonce_key_bits: build::NONCE_KEY_BITS,
            credentials: None,
        }
    }

    /// Sets the factory deployment data
    pub fn factory_data(mut self, data: Bytes) -> Self {
        self.factory_data = data;
        self
    }

    /// Sets an explicit account address
    pub fn account_address(mut self, address: Address) -> Self {
        self.account_address = Some(address);
        self
    }

    /// Sets the sponsorship mode
    pub fn sponsorship(mut self, sponsorship: Sponsorship) -> Self {
        self.sponsorship = sponsorship;
        self
    }

    /// Marks the RPC endpoint as operated by the bundler's party
    pub fn first_party_rpc(mut self) -> Self {
        self.first_party_rpc = true;
        self
    }

    /// Sets the credentials sent with first-party RPC requests
    pub fn credentials(mut self, credentials: RpcCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}
