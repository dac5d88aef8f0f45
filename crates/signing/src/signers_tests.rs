// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rsa::pkcs8::EncodePublicKey;
use rsa::pss::SigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;

fn keypair() -> (RsaPrivateKey, String) {
    let private = RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
    let public_pem = private
        .to_public_key()
        .to_public_key_pem(rsa::pkcs8::LineEnding::LF)
        .unwrap();
    (private, public_pem)
}

fn store_in(dir: &std::path::Path) -> TrustedSignerStore {
    TrustedSignerStore::load(dir.join("trusted_signers.json"))
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
}

#[test]
fn add_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let (_, pem) = keypair();

    let mut store = store_in(dir.path());
    store.add("aethon-team", &pem, "release signing key").unwrap();

    let reloaded = store_in(dir.path());
    assert_eq!(reloaded.len(), 1);
    let entry = reloaded.get("aethon-team").unwrap();
    assert_eq!(entry.pubkey, pem);
    assert_eq!(entry.comment, "release signing key");
}

#[test]
fn add_rejects_garbage_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(dir.path());
    match store.add("bad", "not a pem", "") {
        Err(SignerStoreError::InvalidKey { signer, .. }) => assert_eq!(signer, "bad"),
        other => panic!("expected InvalidKey, got {:?}", other),
    }
    assert!(store.is_empty());
}

#[test]
fn remove_unknown_signer_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(dir.path());
    assert!(matches!(
        store.remove("ghost"),
        Err(SignerStoreError::UnknownSigner(_))
    ));
}

// Adding and then removing a signer restores the store file's bytes.
#[test]
fn add_then_remove_restores_prior_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (_, pem_a) = keypair();
    let (_, pem_b) = keypair();

    let mut store = store_in(dir.path());
    store.add("alpha", &pem_a, "first").unwrap();
    let before = std::fs::read(store.path()).unwrap();

    store.add("beta", &pem_b, "second").unwrap();
    store.remove("beta").unwrap();
    let after = std::fs::read(store.path()).unwrap();

    assert_eq!(before, after);
}

#[test]
fn corrupt_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trusted_signers.json");
    std::fs::write(&path, "{ definitely not json").unwrap();
    let store = TrustedSignerStore::load(&path);
    assert!(store.is_empty());
}

#[test]
fn verify_signature_against_named_signer() {
    let dir = tempfile::tempdir().unwrap();
    let (private, pem) = keypair();
    let mut store = store_in(dir.path());
    store.add("signer", &pem, "").unwrap();

    let message = b"deadbeef";
    let signing_key = SigningKey::<Sha256>::new(private);
    let signature = signing_key
        .sign_with_rng(&mut rand::thread_rng(), message)
        .to_bytes();

    assert!(store.verify_signature(message, &signature, "signer"));
    assert!(!store.verify_signature(b"different", &signature, "signer"));
    assert!(!store.verify_signature(message, &signature, "ghost"));
}

#[test]
fn find_signature_signer_scans_all_keys() {
    let dir = tempfile::tempdir().unwrap();
    let (private_a, pem_a) = keypair();
    let (_, pem_b) = keypair();
    let mut store = store_in(dir.path());
    store.add("alpha", &pem_a, "").unwrap();
    store.add("beta", &pem_b, "").unwrap();

    let message = b"cafe";
    let signature = SigningKey::<Sha256>::new(private_a)
        .sign_with_rng(&mut rand::thread_rng(), message)
        .to_bytes();

    assert_eq!(
        store.find_signature_signer(message, &signature),
        Some("alpha".to_string())
    );
    assert_eq!(store.find_signature_signer(b"other", &signature), None);
}
