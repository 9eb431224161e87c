//! Smart account message signing
//!
//! A smart account signature is only meaningful once the account contract exists, so
//! signing forces deployment first. Newer account implementations verify an EIP-712
//! wrapped payload bound to the account address; older ones accept a raw owner
//! signature. Every produced signature is verified on chain before it is returned.

use crate::{
    builder::{Account, SendOptions},
    error::AccountError,
    send::{AccountClient, WaitOptions},
    verify::verify_signature,
};
use ethers::{
    providers::Middleware,
    types::{
        transaction::eip712::{EIP712Domain, Eip712DomainType, TypedData, Types},
        Address, Bytes, U256,
    },
    utils::{hash_message, hex},
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;
use valise_bundler::BundlerClient;

impl<A, B, M> AccountClient<A, B, M>
where
    A: Account,
    B: BundlerClient,
    M: Middleware + 'static,
{
    /// Signs a message so that it verifies against the account contract (EIP-1271)
    ///
    /// Deploys the account first if it does not exist yet, via a zero-value self-call.
    /// The signature is checked with `isValidSignature` before being returned; a
    /// signature this client cannot verify is never handed out.
    pub async fn sign_message(&self, msg: &[u8]) -> Result<Bytes, AccountError> {
        let sender = self.account.resolve_sender().await?;

        if !self.account.init_code().await?.is_empty() {
            info!("deploying account {sender:?} before signing");
            let pending = self
                .send_inner(sender, U256::zero(), Bytes::default(), &SendOptions::default())
                .await?;
            pending.wait(WaitOptions::default()).await?;
        }

        let signature = if self.account.supports_wrapped_messages().await {
            let chain_id = self.account.config().chain.id();
            let payload = wrapped_message_typed_data(sender, chain_id, msg);
            self.account.sign_typed_data(&payload).await?
        } else {
            self.account.sign_message_raw(msg).await?
        };

        if !verify_signature(self.provider.clone(), msg, &signature, sender).await {
            return Err(AccountError::Verification { account: sender });
        }
        Ok(signature)
    }
}

/// The EIP-712 payload wrapping a message for account-bound verification
///
/// The domain pins the account address and chain id, so the signature cannot be
/// replayed against another wallet. The wrapped payload is the EIP-191 hash of the
/// original message.
pub(crate) fn wrapped_message_typed_data(
    account: Address,
    chain_id: u64,
    msg: &[u8],
) -> TypedData {
    let mut types = Types::new();
    types.insert(
        "EIP712Domain".into(),
        vec![
            eip712_field("name", "string"),
            eip712_field("version", "string"),
            eip712_field("chainId", "uint256"),
            eip712_field("verifyingContract", "address"),
        ],
    );
    types.insert("AccountMessage".into(), vec![eip712_field("message", "bytes")]);

    let hash = hash_message(msg);
    let mut message = BTreeMap::new();
    message
        .insert("message".into(), json!(format!("0x{}", hex::encode(hash.as_bytes()))));

    TypedData {
        domain: EIP712Domain {
            name: Some("Account".into()),
            version: Some("1".into()),
            chain_id: Some(chain_id.into()),
            verifying_contract: Some(account),
            salt: None,
        },
        types,
        primary_type: "AccountMessage".into(),
        message,
    }
}

fn eip712_field(name: &str, r#type: &str) -> Eip712DomainType {
    Eip712DomainType { name: name.into(), r#type: r#type.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_payload_pins_account_and_chain() {
        let account = Address::random();
        let payload = wrapped_message_typed_data(account, 137, b"hello");

        assert_eq!(payload.primary_type, "AccountMessage");
        assert_eq!(payload.domain.verifying_contract, Some(account));
        assert_eq!(payload.domain.chain_id, Some(137.into()));

        let wrapped = payload.message.get("message").unwrap().as_str().unwrap();
        assert_eq!(
            wrapped,
            format!("0x{}", hex::encode(hash_message(b"hello").as_bytes()))
        );
    }
}
