// ABOUTME: The remote channel abstraction the orchestrator runs every step through.
// ABOUTME: Implemented by the SSH session; tests substitute a scripted channel.

use async_trait::async_trait;
use std::path::Path;

use crate::ssh::{self, CommandOutput, Session};

/// Command execution and file transfer against one remote host.
///
/// Authentication, host key policy and transport belong to the implementor.
/// An `Err` means the command's outcome is unknown (timeout, dropped
/// connection); a command that ran and failed is an `Ok` with a non-zero
/// exit code.
#[async_trait]
pub trait RemoteChannel: Send + Sync {
    /// Run a shell command and wait for it to exit.
    async fn execute(&self, command: &str) -> ssh::Result<CommandOutput>;

    /// Copy a local file to `remote_path`, returning the remote exit code.
    async fn transfer(&self, local_path: &Path, remote_path: &str) -> ssh::Result<u32>;
}

#[async_trait]
impl RemoteChannel for Session {
    async fn execute(&self, command: &str) -> ssh::Result<CommandOutput> {
        tracing::debug!(host = self.host(), command, "exec");
        self.exec(command).await
    }

    async fn transfer(&self, local_path: &Path, remote_path: &str) -> ssh::Result<u32> {
        tracing::debug!(
            host = self.host(),
            local = %local_path.display(),
            remote = remote_path,
            "upload"
        );
        let output = self.upload(local_path, remote_path).await?;
        if !output.success() {
            tracing::warn!(remote = remote_path, stderr = %output.stderr.trim(), "upload failed");
        }
        Ok(output.exit_code)
    }
}
