//! End-to-end tests for the artifact generation workflow.

use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use csrkit::credentials::{Passphrase, UserName};
use csrkit::digest::{digest_reader, DigestValue};
use csrkit::error::ValidationError;
use csrkit::workflow::{self, FailureReport, Stage};
use der::{DecodePem, Encode};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::Verifier;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use x509_cert::request::CertReq;
use x509_cert::spki::DecodePublicKey;

const PASSPHRASE: &[u8] = b"longenough1";

fn passphrase() -> Passphrase {
    Passphrase::new(PASSPHRASE.to_vec(), PASSPHRASE.to_vec()).unwrap()
}

/// Runs the background workflow for `alice_01` and returns its terminal
/// outcome, asserting that exactly one terminal event is delivered and that
/// the completion flag is observable by then.
fn run_to_outcome(
    directory: &Path,
    messages: Arc<Mutex<Vec<String>>>,
) -> Result<DigestValue, FailureReport> {
    let user = UserName::parse("alice_01").unwrap();
    let (tx, rx) = mpsc::channel::<Result<DigestValue, FailureReport>>();
    let tx_failure = tx.clone();
    let sink = Arc::clone(&messages);

    let handle = workflow::run(
        user,
        passphrase(),
        directory.to_path_buf(),
        move |message| sink.lock().unwrap().push(message),
        move |digest| tx.send(Ok(digest)).unwrap(),
        move |report| tx_failure.send(Err(report)).unwrap(),
    );

    let outcome = rx
        .recv_timeout(Duration::from_secs(600))
        .expect("workflow should reach a terminal state");
    assert!(handle.is_finished());
    handle.join();
    assert!(
        rx.try_recv().is_err(),
        "only one terminal event may be delivered"
    );
    outcome
}

#[test]
fn end_to_end_generates_a_consistent_artifact_set() {
    let dir = tempfile::tempdir().unwrap();
    let messages = Arc::new(Mutex::new(Vec::new()));

    let digest = run_to_outcome(dir.path(), Arc::clone(&messages)).expect("workflow succeeds");

    let key_path = dir.path().join("alice_01.key");
    let csr_path = dir.path().join("alice_01.csr");
    let sha_path = dir.path().join("alice_01.sha256");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);

    // The digest file holds the reported value plus a trailing newline.
    let sha_contents = fs::read_to_string(&sha_path).unwrap();
    assert_eq!(sha_contents, format!("{digest}\n"));
    assert_eq!(digest.as_str().len(), 64);

    // The digest recomputes exactly from the request file's bytes.
    let csr_bytes = fs::read(&csr_path).unwrap();
    let recomputed = digest_reader(&mut csr_bytes.as_slice()).unwrap();
    assert_eq!(recomputed, digest);

    // The key file decrypts under the original passphrase, and its public
    // key is the one embedded in the request.
    let key_pem = fs::read_to_string(&key_path).unwrap();
    let private = RsaPrivateKey::from_pkcs8_encrypted_pem(&key_pem, PASSPHRASE).unwrap();

    let csr = CertReq::from_pem(csr_bytes.as_slice()).unwrap();
    let spki_der = csr.info.public_key.to_der().unwrap();
    let embedded = RsaPublicKey::from_public_key_der(&spki_der).unwrap();
    assert_eq!(embedded, RsaPublicKey::from(&private));

    // The request's signature verifies against its own embedded key.
    let verifying_key = VerifyingKey::<Sha1>::new(embedded);
    let message = csr.info.to_der().unwrap();
    let signature = Signature::try_from(csr.signature.as_bytes().unwrap()).unwrap();
    verifying_key.verify(&message, &signature).unwrap();

    assert_eq!(csr.info.subject.to_string(), "CN=alice_01,C=XA");

    // Progress: production order, one terminal summary carrying the digest.
    let messages = messages.lock().unwrap();
    assert!(messages[0].starts_with("Generating 4096-bit RSA key pair"));
    assert_eq!(
        messages
            .iter()
            .filter(|m| m.starts_with("Completed successfully."))
            .count(),
        1
    );
    let last = messages.last().unwrap();
    assert!(last.starts_with("Completed successfully."));
    assert!(last.contains(digest.as_str()));
}

#[test]
fn rerunning_replaces_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let user = UserName::parse("alice_01").unwrap();

    let mut sink = |_message: String| {};
    let first = workflow::execute(&user, passphrase(), dir.path(), &mut sink).unwrap();
    let first_key = fs::read(dir.path().join("alice_01.key")).unwrap();
    let first_csr = fs::read(dir.path().join("alice_01.csr")).unwrap();

    let second = workflow::execute(&user, passphrase(), dir.path(), &mut sink).unwrap();

    // Still exactly three files, all from the second run.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    assert_ne!(first, second);
    assert_ne!(fs::read(dir.path().join("alice_01.key")).unwrap(), first_key);

    let second_csr = fs::read(dir.path().join("alice_01.csr")).unwrap();
    assert_ne!(second_csr, first_csr);
    let recomputed = digest_reader(&mut second_csr.as_slice()).unwrap();
    assert_eq!(recomputed, second);
    assert_eq!(
        fs::read_to_string(dir.path().join("alice_01.sha256")).unwrap(),
        format!("{second}\n")
    );
}

#[test]
fn missing_output_directory_fails_at_the_writing_stage() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist");
    let messages = Arc::new(Mutex::new(Vec::new()));

    let report = run_to_outcome(&missing, Arc::clone(&messages))
        .expect_err("writing into a missing directory must fail");

    assert_eq!(report.stage, Stage::WritingArtifacts);
    let rendered = report.to_string();
    assert!(rendered.starts_with("Fatal: failed to write"));
    assert!(rendered.contains("Caused by:"));
    assert!(!missing.exists());
}

#[test]
fn invalid_input_never_reaches_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(
        UserName::parse("ab").unwrap_err(),
        ValidationError::UsernameTooShort
    );
    assert_eq!(
        Passphrase::new(b"longenough1".to_vec(), b"different01".to_vec()).unwrap_err(),
        ValidationError::PassphraseMismatch
    );

    // Validation is synchronous and happens before any workflow exists.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
