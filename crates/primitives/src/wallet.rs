//! A `Wallet` is a wrapper around an ethers wallet, the key-management primitive of the
//! transaction pipeline. It produces the raw, personal-message, and typed-data signatures
//! that the operation builder and the native-L2 path need.
use ethers::{
    prelude::{k256::ecdsa::SigningKey, rand},
    signers::{coins_bip39::English, MnemonicBuilder, Signer},
    types::{transaction::eip712::Eip712, Address, Bytes, H256, U256},
};
use expanded_pathbuf::ExpandedPathBuf;

/// Wrapper around ethers wallet
#[derive(Clone, Debug)]
pub struct Wallet {
    /// Signing key of the wallet
    pub signer: ethers::signers::Wallet<SigningKey>,
}

impl Wallet {
    /// Builds a `Wallet` from a randomly generated mnemonic phrase
    ///
    /// # Arguments
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn build_random(chain_id: &U256) -> eyre::Result<Self> {
        let mut rng = rand::thread_rng();

        let wallet = MnemonicBuilder::<English>::default()
            .derivation_path("m/44'/60'/0'/0/0")?
            .build_random(&mut rng)?;

        Ok(Self { signer: wallet.with_chain_id(chain_id.as_u64()) })
    }

    /// Create a new wallet from the given file containing the mnemonic phrase
    ///
    /// # Arguments
    /// * `path` - The path to the file where the mnemonic phrase is stored
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_file(path: ExpandedPathBuf, chain_id: &U256) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(path.to_path_buf())
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id.as_u64()) })
    }

    /// Create a new wallet from the given mnemonic phrase
    ///
    /// # Arguments
    /// * `phrase` - The mnemonic phrase
    /// * `chain_id` - The chain id of the blockchain network to be used
    ///
    /// # Returns
    /// * `Self` - A new `Wallet` instance
    pub fn from_phrase(phrase: &str, chain_id: &U256) -> eyre::Result<Self> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .derivation_path("m/44'/60'/0'/0/0")?
            .build()?;

        Ok(Self { signer: wallet.with_chain_id(chain_id.as_u64()) })
    }

    /// Address of the signing key (the owner of the smart account)
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs a raw 32-byte hash (no message prefix)
    pub fn sign_hash(&self, hash: H256) -> eyre::Result<Bytes> {
        let sig = self.signer.sign_hash(hash)?;
        Ok(sig.to_vec().into())
    }

    /// Signs a personal message (EIP-191 prefix applied by the signer)
    pub async fn sign_message(&self, msg: &[u8]) -> eyre::Result<Bytes> {
        let sig = self.signer.sign_message(msg).await?;
        Ok(sig.to_vec().into())
    }

    /// Signs an EIP-712 typed-data payload
    pub async fn sign_typed_data<T: Eip712 + Send + Sync>(
        &self,
        payload: &T,
    ) -> eyre::Result<Bytes> {
        let sig = self.signer.sign_typed_data(payload).await?;
        Ok(sig.to_vec().into())
    }

}
