mod common;

use alloy_chains::Chain;
use common::{abi_word, client, node_receipt, receipt_for, PHRASE};
use ethers::types::{Address, Bytes, H256, U256};
use valise_account::{verify_signature, AccountConfig, AccountError};
use valise_primitives::{constants::eip1271, UserOperationHash, Wallet};

fn config() -> AccountConfig {
    AccountConfig::new(Chain::from_id(137), Address::random())
        .account_address("0x9fd042a18e90ce326073fa70f111dc9d798d9a52".parse().unwrap())
        .first_party_rpc()
}

fn magic_word() -> Bytes {
    let mut word = [0u8; 32];
    word[0..4].copy_from_slice(&eip1271::MAGIC_VALUE);
    Bytes::from(word.to_vec())
}

#[tokio::test]
async fn signing_deploys_a_phantom_wallet_first() {
    let (client, bundler, mock) = client(config());
    let sender: Address = "0x9fd042a18e90ce326073fa70f111dc9d798d9a52".parse().unwrap();
    *bundler.receipt.lock().unwrap() =
        Some(receipt_for(UserOperationHash::default(), sender));

    // Popped LIFO: deployment check (no code), the deploy operation's build (nonce,
    // deployment check, gas probe), its inclusion receipt, the wrapped-message probe,
    // and finally the on-chain verification answering the magic value.
    mock.push::<Bytes, _>(magic_word()).unwrap();
    mock.push::<Bytes, _>(Bytes::from(H256::repeat_byte(0x44).as_bytes().to_vec())).unwrap();
    mock.push(node_receipt()).unwrap();
    mock.push(U256::from(21_000)).unwrap();
    mock.push::<Bytes, _>(Bytes::default()).unwrap();
    mock.push::<Bytes, _>(abi_word(0)).unwrap();
    mock.push::<Bytes, _>(Bytes::default()).unwrap();

    let signature = client.sign_message(b"hello world").await.unwrap();
    assert_eq!(signature.len(), 65);

    // Exactly one operation went out: the zero-value self-call that deploys the wallet.
    let sent = bundler.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender, sender);
    assert!(!sent[0].init_code.is_empty());
}

#[tokio::test]
async fn unverifiable_signature_is_never_returned() {
    let (client, bundler, mock) = client(config());
    let sender: Address = "0x9fd042a18e90ce326073fa70f111dc9d798d9a52".parse().unwrap();
    *bundler.receipt.lock().unwrap() =
        Some(receipt_for(UserOperationHash::default(), sender));

    // Same flow, but the contract answers garbage instead of the magic value.
    mock.push::<Bytes, _>(Bytes::from(vec![0u8; 32])).unwrap();
    mock.push::<Bytes, _>(Bytes::from(H256::repeat_byte(0x44).as_bytes().to_vec())).unwrap();
    mock.push(node_receipt()).unwrap();
    mock.push(U256::from(21_000)).unwrap();
    mock.push::<Bytes, _>(Bytes::default()).unwrap();
    mock.push::<Bytes, _>(abi_word(0)).unwrap();
    mock.push::<Bytes, _>(Bytes::default()).unwrap();

    let err = client.sign_message(b"hello world").await.unwrap_err();
    assert!(matches!(err, AccountError::Verification { account } if account == sender));
}

#[tokio::test]
async fn deployed_wallet_skips_the_deploy_operation() {
    let (client, bundler, mock) = client(config());

    // Code already on chain: probe fails (empty queue error swallowed as "unsupported")
    // is avoided by priming it, and no operation is submitted at all.
    mock.push::<Bytes, _>(magic_word()).unwrap();
    mock.push::<Bytes, _>(Bytes::from(H256::repeat_byte(0x44).as_bytes().to_vec())).unwrap();
    mock.push::<Bytes, _>(Bytes::from(vec![0x60, 0x80])).unwrap();

    client.sign_message(b"hello world").await.unwrap();
    assert!(bundler.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_probe_and_verification_rejects_the_signature() {
    let (client, _bundler, mock) = client(config());

    // Deployment check passes; the wrapped-message probe then hits an empty queue and
    // errors, forcing the raw signature path. With nothing left in the queue the
    // verification call fails too, so the raw signature is rejected rather than handed
    // out unverified.
    mock.push::<Bytes, _>(Bytes::from(vec![0x60, 0x80])).unwrap();

    let err = client.sign_message(b"hello world").await.unwrap_err();
    assert!(matches!(err, AccountError::Verification { .. }));
}

#[tokio::test]
async fn verifier_accepts_a_signature_when_the_contract_says_so() {
    let wallet = Wallet::from_phrase(PHRASE, &137.into()).unwrap();
    let signature = wallet.sign_message(b"hello world").await.unwrap();

    let (provider, mock) = ethers::providers::Provider::mocked();
    mock.push::<Bytes, _>(magic_word()).unwrap();
    assert!(
        verify_signature(
            std::sync::Arc::new(provider),
            b"hello world",
            &signature,
            Address::random(),
        )
        .await
    );
}
