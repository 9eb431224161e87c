//! EIP-1271 signature verification
//!
//! The verifier answers yes or no, never an error: contracts that predate EIP-1271
//! revert on `isValidSignature`, and for a verifier that is simply a "no".

use ethers::{
    providers::Middleware,
    types::{Address, Bytes},
    utils::hash_message,
};
use std::sync::Arc;
use tracing::trace;
use valise_contracts::AccountApi;
use valise_primitives::{
    constants::eip1271,
    provider::{create_http_provider, create_http_provider_with_credentials},
    RpcCredentials,
};

/// Checks a message signature against a smart account contract
///
/// Returns true only if the account's `isValidSignature` answers with the EIP-1271
/// magic value for the EIP-191 hash of the message.
pub async fn verify_signature<M: Middleware + 'static>(
    provider: Arc<M>,
    message: &[u8],
    signature: &Bytes,
    account: Address,
) -> bool {
    let hash = hash_message(message);
    let api = AccountApi::new(account, provider);
    match api.is_valid_signature(hash.to_fixed_bytes(), signature.clone()).call().await {
        Ok(magic) => magic == eip1271::MAGIC_VALUE,
        Err(err) => {
            trace!("isValidSignature call failed: {err}");
            false
        }
    }
}

/// Checks a signature against an account reachable through the given RPC endpoint
pub async fn verify_signature_rpc(
    rpc_url: &str,
    credentials: Option<&RpcCredentials>,
    message: &[u8],
    signature: &Bytes,
    account: Address,
) -> bool {
    let provider = match credentials {
        Some(credentials) => create_http_provider_with_credentials(rpc_url, credentials),
        None => create_http_provider(rpc_url).await,
    };
    match provider {
        Ok(provider) => {
            verify_signature(Arc::new(provider), message, signature, account).await
        }
        Err(err) => {
            trace!("provider construction failed: {err}");
            false
        }
    }
}
