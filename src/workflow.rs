use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{error, info};

use crate::artifacts::ArtifactSet;
use crate::credentials::{Passphrase, UserName};
use crate::digest::DigestValue;
use crate::encrypt;
use crate::error::WorkflowError;
use crate::key::{RsaKeyPair, KEY_BITS};
use crate::request::{RequestOptions, SigningRequest};

/// Lifecycle of a workflow run.
///
/// Transitions are strictly forward; there are no retries and no re-entry.
/// `Failed` is reachable from every non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    GeneratingKey,
    EncryptingKey,
    BuildingRequest,
    WritingArtifacts,
    ComputingDigest,
    Completed,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::NotStarted => "not started",
            Stage::GeneratingKey => "generating key",
            Stage::EncryptingKey => "encrypting key",
            Stage::BuildingRequest => "building request",
            Stage::WritingArtifacts => "writing artifacts",
            Stage::ComputingDigest => "computing digest",
            Stage::Completed => "completed",
            Stage::Failed => "failed",
        })
    }
}

/// The single failure event of a run: the stage that failed and the fault,
/// with its full cause chain rendered by `Display`, innermost last.
#[derive(Debug)]
pub struct FailureReport {
    /// Stage the workflow was in when it failed.
    pub stage: Stage,
    /// The terminal fault.
    pub error: WorkflowError,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fatal: {}", self.error)?;
        let mut source = std::error::Error::source(&self.error);
        while let Some(cause) = source {
            write!(f, "\nCaused by: {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

impl std::error::Error for FailureReport {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Caller-side view of a spawned workflow task.
pub struct WorkflowHandle {
    done: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl WorkflowHandle {
    /// Whether the run has reached `Completed` or `Failed`.
    ///
    /// The flag is set before the terminal callback fires, so any observer
    /// that has seen the callback will also see the flag. A front end uses
    /// this to decide whether closing the view abandons work in progress.
    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Waits for the task to finish. The output files are written either way;
    /// abandoning the handle instead merely drops this view of the task.
    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("workflow task panicked");
        }
    }
}

/// Spawns the workflow on a background thread.
///
/// `progress` receives one human-readable message per stage, in production
/// order, and a final message that includes the digest value; it runs on the
/// task's thread and must not block indefinitely. Exactly one of
/// `on_complete` / `on_failure` is then invoked, always last.
///
/// There is no mid-step cancellation: once key generation has begun the run
/// proceeds to a terminal state even if the caller abandons the handle.
pub fn run<P, C, F>(
    user: UserName,
    passphrase: Passphrase,
    directory: PathBuf,
    mut progress: P,
    on_complete: C,
    on_failure: F,
) -> WorkflowHandle
where
    P: FnMut(String) + Send + 'static,
    C: FnOnce(DigestValue) + Send + 'static,
    F: FnOnce(FailureReport) + Send + 'static,
{
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    let thread = thread::spawn(move || {
        let outcome = execute(&user, passphrase, &directory, &mut progress);
        // Flag first: whoever observes the terminal callback can rely on it.
        flag.store(true, Ordering::Release);
        match outcome {
            Ok(digest) => on_complete(digest),
            Err(report) => on_failure(report),
        }
    });
    WorkflowHandle { done, thread }
}

/// Runs the workflow to completion on the current thread.
///
/// This is the body of [`run`]; it is public for callers that already own a
/// worker context. Inputs are consumed by the run: the passphrase is read
/// once, during key encryption, and wiped afterwards.
pub fn execute<P>(
    user: &UserName,
    passphrase: Passphrase,
    directory: &Path,
    progress: &mut P,
) -> Result<DigestValue, FailureReport>
where
    P: FnMut(String),
{
    let artifacts = ArtifactSet::new(user, directory);

    let mut stage = Stage::GeneratingKey;
    info!(user = %user, "generating key pair");
    progress(format!(
        "Generating {KEY_BITS}-bit RSA key pair (this can take tens of seconds)..."
    ));
    let keys = RsaKeyPair::generate().map_err(|e| fail(stage, e))?;

    stage = Stage::EncryptingKey;
    info!(user = %user, "encrypting private key");
    progress("Encrypting private key...".to_string());
    let sealed = encrypt::encrypt_private_key(&keys, &passphrase).map_err(|e| fail(stage, e))?;
    drop(passphrase);

    stage = Stage::BuildingRequest;
    info!(user = %user, "building certificate signing request");
    progress("Generating certificate signing request...".to_string());
    let request =
        SigningRequest::build(user, &keys, &RequestOptions::default()).map_err(|e| fail(stage, e))?;
    let request_pem = request.to_pem().map_err(|e| fail(stage, e))?;

    stage = Stage::WritingArtifacts;
    info!(user = %user, directory = %directory.display(), "writing artifacts");
    progress(format!(
        "Writing {} and {}...",
        artifacts.private_key_path().display(),
        artifacts.request_path().display()
    ));
    artifacts
        .write_private_key(&sealed)
        .map_err(|e| fail(stage, e))?;
    artifacts
        .write_request(&request_pem)
        .map_err(|e| fail(stage, e))?;

    stage = Stage::ComputingDigest;
    info!(user = %user, "hashing certificate signing request");
    progress(format!(
        "Hashing {} and saving the hash to {}...",
        artifacts.request_path().display(),
        artifacts.digest_path().display()
    ));
    let digest = artifacts.digest_request().map_err(|e| fail(stage, e))?;
    artifacts.write_digest(&digest).map_err(|e| fail(stage, e))?;

    info!(user = %user, stage = %Stage::Completed, digest = %digest, "workflow completed");
    progress(format!(
        "Completed successfully. The SHA-256 hash of your certificate signing request is {digest}."
    ));
    Ok(digest)
}

fn fail(stage: Stage, error: WorkflowError) -> FailureReport {
    error!(stage = %stage, error = %error, "workflow failed");
    FailureReport { stage, error }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn failure_report_renders_the_cause_chain_innermost_last() {
        let report = FailureReport {
            stage: Stage::WritingArtifacts,
            error: WorkflowError::Write {
                path: PathBuf::from("/nope/alice_01.key"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            },
        };

        let rendered = report.to_string();
        assert_eq!(
            rendered,
            "Fatal: failed to write /nope/alice_01.key\nCaused by: permission denied"
        );
    }

    #[test]
    fn stage_names_read_naturally() {
        assert_eq!(Stage::GeneratingKey.to_string(), "generating key");
        assert_eq!(Stage::Completed.to_string(), "completed");
    }
}
