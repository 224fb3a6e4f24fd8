// ABOUTME: Wires detection, installation, upload, rollout and verification into runs.
// ABOUTME: Backs the install, deploy and status commands and enforces the overall timeout.

use std::time::Duration;

use crate::channel::RemoteChannel;
use crate::config::Config;
use crate::error::Result;
use crate::runtime::{Dialect, InstallError, Installer, detect};
use crate::types::ServiceTarget;

use super::attempt::{RolloutAttempt, TRANSPORT_FAILURE};
use super::error::OrchestrationError;
use super::phase::Phase;
use super::sequencer::{RolloutOptions, run_rollout};
use super::upload::{FileTransfer, upload_files};
use super::verify::{VerifyOptions, verify};

/// Everything a run needs, fixed before the first remote command.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    target: ServiceTarget,
    installer: Installer,
    rollout: RolloutOptions,
    files: Vec<FileTransfer>,
    timeout: Duration,
}

impl Orchestrator {
    pub fn new(target: ServiceTarget) -> Self {
        Self {
            target,
            installer: Installer::default(),
            rollout: RolloutOptions::default(),
            files: Vec::new(),
            timeout: Duration::from_secs(30 * 60),
        }
    }

    /// Build from configuration; `no_cache` comes from the command line.
    pub fn from_config(config: &Config, no_cache: bool) -> Result<Self> {
        let target = config.target()?;
        let files = config
            .files
            .iter()
            .map(|file| {
                Ok(FileTransfer {
                    local: file.local_path(&config.base_dir),
                    remote: file.remote_path(&target)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(target)
            .installer(Installer::new(config.install_options()))
            .rollout_options(config.rollout_options(no_cache))
            .files(files)
            .timeout(config.deploy_timeout))
    }

    pub fn installer(mut self, installer: Installer) -> Self {
        self.installer = installer;
        self
    }

    pub fn rollout_options(mut self, options: RolloutOptions) -> Self {
        self.rollout = options;
        self
    }

    pub fn files(mut self, files: Vec<FileTransfer>) -> Self {
        self.files = files;
        self
    }

    /// Overall limit for `deploy`. On expiry the attempt is reported `Unknown`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &ServiceTarget {
        &self.target
    }

    /// Detect, and install whatever is missing.
    pub async fn install<C>(&self, channel: &C) -> std::result::Result<RolloutAttempt, OrchestrationError>
    where
        C: RemoteChannel + ?Sized,
    {
        let mut attempt = RolloutAttempt::new(self.target.clone(), Dialect::None);
        let provisioned = self.provision(channel, &mut attempt).await;
        attempt.finish();
        match provisioned {
            Ok(()) => attempt.into_result(),
            Err(source) => Err(OrchestrationError::InstallationFailed {
                source,
                attempt: Box::new(attempt),
            }),
        }
    }

    /// Full run: detect, install if needed, upload files, then roll out.
    pub async fn deploy<C>(&self, channel: &C) -> std::result::Result<RolloutAttempt, OrchestrationError>
    where
        C: RemoteChannel + ?Sized,
    {
        let mut attempt = RolloutAttempt::new(self.target.clone(), Dialect::None);

        let outcome = tokio::time::timeout(self.timeout, self.run_deploy(channel, &mut attempt)).await;
        attempt.finish();

        match outcome {
            Ok(Ok(())) => attempt.into_result(),
            Ok(Err(source)) => Err(OrchestrationError::InstallationFailed {
                source,
                attempt: Box::new(attempt),
            }),
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, phase = %attempt.phase(), "deploy timed out");
                attempt.mark_timed_out();
                attempt.into_result()
            }
        }
    }

    /// Verify only: no install, no grace period.
    pub async fn status<C>(&self, channel: &C) -> std::result::Result<RolloutAttempt, OrchestrationError>
    where
        C: RemoteChannel + ?Sized,
    {
        let mut attempt = RolloutAttempt::new(self.target.clone(), Dialect::None);

        attempt.enter(Phase::Detect);
        let dialect = detect(channel).await;
        attempt.set_dialect(dialect);

        match dialect.compose() {
            None => attempt.halt(None),
            Some(compose) => {
                attempt.enter(Phase::Verify);
                let options = VerifyOptions {
                    grace_period: Duration::ZERO,
                    ..self.rollout.verify.clone()
                };
                let result = verify(channel, &self.target, compose, &options).await;
                attempt.record(Phase::Verify, result.status_exit_code);
                attempt.set_verification(result);
            }
        }

        attempt.finish();
        attempt.into_result()
    }

    async fn run_deploy<C>(
        &self,
        channel: &C,
        attempt: &mut RolloutAttempt,
    ) -> std::result::Result<(), InstallError>
    where
        C: RemoteChannel + ?Sized,
    {
        self.provision(channel, attempt).await?;

        if !upload_files(channel, attempt, &self.files).await {
            return Ok(());
        }

        run_rollout(channel, attempt, &self.rollout).await;
        Ok(())
    }

    async fn provision<C>(
        &self,
        channel: &C,
        attempt: &mut RolloutAttempt,
    ) -> std::result::Result<(), InstallError>
    where
        C: RemoteChannel + ?Sized,
    {
        attempt.enter(Phase::Detect);
        let dialect = detect(channel).await;
        attempt.set_dialect(dialect);
        tracing::info!(%dialect, "detected compose dialect");

        if dialect.is_resolved() {
            return Ok(());
        }

        attempt.enter(Phase::Install);
        match self.installer.ensure_installed(channel, dialect).await {
            Ok(installed) => {
                attempt.record(Phase::Install, 0);
                attempt.set_dialect(installed);
                tracing::info!(dialect = %installed, "compose installed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "installation failed");
                attempt.record(Phase::Install, install_exit_code(&e));
                attempt.halt(Some(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Exit code recorded for a failed install: the failing command's own code
/// where there is one.
fn install_exit_code(error: &InstallError) -> i32 {
    match error {
        InstallError::CommandFailed { exit_code, .. } => {
            i32::try_from(*exit_code).unwrap_or(i32::MAX)
        }
        InstallError::Transport { .. } => TRANSPORT_FAILURE,
        InstallError::UnknownPlatform(_) | InstallError::StillMissing(_) => 1,
    }
}
