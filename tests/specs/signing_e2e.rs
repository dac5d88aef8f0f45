// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signing end-to-end: trust a key, sign a module, run it in paranoid
//! mode, then break trust and watch the engine exclude it.

use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use wr_engine::{Engine, RunOutcome};
use wr_signing::{sign_module, SecurityMode, TrustedSignerStore, VerificationStatus};

use crate::harness::SpecEnv;

const MANIFEST: &str = "name: trusted\nruntime:\n  main: main.rs\noutputs:\n  - name: out\n    type: Any\n";

fn keypair_pems() -> (String, String) {
    let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
    let private_pem = private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
    let public_pem = private
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap();
    (private_pem, public_pem)
}

#[tokio::test]
async fn trusted_signature_admits_module_in_paranoid_mode() {
    let env = SpecEnv::new();
    let module_path = env.write_module("trusted", MANIFEST);
    env.write_pipeline(
        "secure",
        "name: secure\nmodules:\n  - module: trusted\n    run_mode: once\n",
    );
    let probe = env.register_scripted("trusted", |m| m);

    let (private_pem, public_pem) = keypair_pems();
    let signers_path = env.dir.path().join("settings").join("trusted_signers.json");
    let mut signers = TrustedSignerStore::load(&signers_path);
    signers.add("release", &public_pem, "release key").unwrap();
    sign_module(&module_path, &private_pem, None).unwrap();

    let mut options = env.options("secure");
    options.security_mode = SecurityMode::Paranoid;
    let engine = Engine::new(options, env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(probe.iterations(), 1);
    assert!(report.excluded.is_empty());

    // Tamper with the module; the same pipeline now refuses it.
    std::fs::write(module_path.join("extra.rs"), "// injected\n").unwrap();
    let mut options = env.options("secure");
    options.security_mode = SecurityMode::Paranoid;
    let engine = Engine::new(options, env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoModules);
    assert_eq!(
        report.excluded,
        vec![("trusted".to_string(), VerificationStatus::Invalid)]
    );
    // Still only the one successful iteration from the first run.
    assert_eq!(probe.iterations(), 1);
}

#[tokio::test]
async fn untrusting_the_signer_excludes_the_module() {
    let env = SpecEnv::new();
    let module_path = env.write_module("trusted", MANIFEST);
    env.write_pipeline(
        "secure",
        "name: secure\nmodules:\n  - module: trusted\n    run_mode: once\n",
    );
    env.register_scripted("trusted", |m| m);

    let (private_pem, public_pem) = keypair_pems();
    let signers_path = env.dir.path().join("settings").join("trusted_signers.json");
    let mut signers = TrustedSignerStore::load(&signers_path);
    signers.add("release", &public_pem, "").unwrap();
    sign_module(&module_path, &private_pem, None).unwrap();
    signers.remove("release").unwrap();

    let mut options = env.options("secure");
    options.security_mode = SecurityMode::Paranoid;
    let engine = Engine::new(options, env.collaborators());
    let report = engine.start().await.unwrap();

    assert_eq!(report.outcome, RunOutcome::NoModules);
    assert_eq!(
        report.excluded,
        vec![("trusted".to_string(), VerificationStatus::Invalid)]
    );
}
