// ABOUTME: Copies opaque local files into the remote project before a rollout.
// ABOUTME: Contents are never inspected; each transfer's exit code goes into the audit trail.

use std::path::PathBuf;

use crate::channel::RemoteChannel;

use super::attempt::{RolloutAttempt, TRANSPORT_FAILURE};
use super::phase::Phase;

/// One file to place on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTransfer {
    pub local: PathBuf,
    /// Absolute destination path on the host.
    pub remote: String,
}

/// Transfer every file in order. Returns false if the attempt halted.
pub(crate) async fn upload_files<C>(
    channel: &C,
    attempt: &mut RolloutAttempt,
    files: &[FileTransfer],
) -> bool
where
    C: RemoteChannel + ?Sized,
{
    if files.is_empty() {
        return true;
    }

    attempt.enter(Phase::Upload);
    for file in files {
        tracing::info!(local = %file.local.display(), remote = %file.remote, "uploading");

        match channel.transfer(&file.local, &file.remote).await {
            Ok(0) => attempt.record(Phase::Upload, 0),
            Ok(code) => {
                let exit_code = i32::try_from(code).unwrap_or(i32::MAX);
                attempt.record(Phase::Upload, exit_code);
                attempt.halt(Some(format!(
                    "upload of {} to {} exited with {}",
                    file.local.display(),
                    file.remote,
                    code
                )));
                return false;
            }
            Err(e) => {
                tracing::error!(remote = %file.remote, error = %e, "upload could not run");
                attempt.record(Phase::Upload, TRANSPORT_FAILURE);
                attempt.halt(Some(e.to_string()));
                return false;
            }
        }
    }
    true
}
