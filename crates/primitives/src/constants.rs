//! Smart contract wallet (ERC-4337)-related constants

/// Entry point smart contract
pub mod entry_point {
    /// Address of the entry point smart contract
    pub const ADDRESS: &str = "0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789";
    /// Version of the entry point smart contract
    pub const VERSION: &str = "0.6.0";
}

/// User operation building
pub mod build {
    /// Placeholder signature used while estimating gas; 65 bytes of a plausible ECDSA
    /// signature so the bundler simulates a realistic operation size. Never submitted.
    pub const DUMMY_SIGNATURE: &str = "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff1c";
    /// Conservative default for the three gas budgets of the estimation operation
    pub const FALLBACK_GAS_LIMIT: u64 = 1_000_000;
    /// Bit width of the random nonce key drawn for each send
    pub const NONCE_KEY_BITS: usize = 192;
}

/// Receipt polling
pub mod wait {
    /// Default timeout when waiting for a user operation receipt (in seconds)
    pub const TIMEOUT: u64 = 120;
    /// Default polling interval (in seconds)
    pub const INTERVAL: u64 = 1;
}

/// Signature verification (EIP-1271)
pub mod eip1271 {
    /// Return value of isValidSignature when the wallet contract accepts the signature
    pub const MAGIC_VALUE: [u8; 4] = [0x16, 0x26, 0xba, 0x7e];
}

/// Native account abstraction L2s (zkSync-style, not ERC-4337)
pub mod zk {
    /// Transaction type byte of the EIP-712 transaction envelope
    pub const EIP712_TX_TYPE: u8 = 0x71;
    /// Default gas charged per byte of published pubdata
    pub const GAS_PER_PUBDATA_DEFAULT: u64 = 50_000;
    /// EIP-712 domain of the native transaction envelope
    pub const DOMAIN_NAME: &str = "zkSync";
    pub const DOMAIN_VERSION: &str = "2";
}

/// Authentication headers for first-party RPC endpoints
pub mod rpc_headers {
    pub const SECRET_KEY: &str = "x-secret-key";
    pub const CLIENT_ID: &str = "x-client-id";
}
