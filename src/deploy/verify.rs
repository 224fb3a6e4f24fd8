// ABOUTME: Post-start verification from recent logs and the running-container listing.
// ABOUTME: Separates "the service is down" from "we could not find out".

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::channel::RemoteChannel;
use crate::runtime::ComposeDialect;
use crate::types::ServiceTarget;

use super::attempt::TRANSPORT_FAILURE;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_LOG_TAIL: u32 = 50;

/// Health classification of the service after a rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The service has a running container.
    Healthy,
    /// The service has no running container (never created, exited, restarting).
    Unhealthy,
    /// The status query itself failed.
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// What the verifier observed.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub status: HealthStatus,
    /// Last lines of the service log. Empty if the log query failed.
    pub recent_log: String,
    /// Raw output of the running-container listing.
    pub status_listing: String,
    /// Exit code of the status query, `-1` if it could not run.
    pub status_exit_code: i32,
}

#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Wait before querying, so a starting process is not reported as down.
    pub grace_period: Duration,
    /// Number of log lines to capture.
    pub log_tail: u32,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            log_tail: DEFAULT_LOG_TAIL,
        }
    }
}

/// Inspect the service after start.
///
/// A failed log query is logged and leaves `recent_log` empty; only the
/// status query decides between `Unhealthy` and `Unknown`.
pub async fn verify<C>(
    channel: &C,
    target: &ServiceTarget,
    compose: &dyn ComposeDialect,
    options: &VerifyOptions,
) -> VerificationResult
where
    C: RemoteChannel + ?Sized,
{
    if !options.grace_period.is_zero() {
        tracing::debug!(grace = ?options.grace_period, "waiting before verification");
        tokio::time::sleep(options.grace_period).await;
    }

    let recent_log = match channel
        .execute(&compose.logs_command(target, options.log_tail))
        .await
    {
        Ok(output) if output.success() => output.stdout,
        Ok(output) => {
            tracing::warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "could not fetch service logs"
            );
            String::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not fetch service logs");
            String::new()
        }
    };

    let (status, status_listing, status_exit_code) = match channel
        .execute(&compose.running_services_command(target))
        .await
    {
        Ok(output) if output.success() => {
            let status = classify(&output.stdout, target.service_name().as_str());
            (status, output.stdout, 0)
        }
        Ok(output) => {
            tracing::warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "status query failed"
            );
            let code = i32::try_from(output.exit_code).unwrap_or(i32::MAX);
            (HealthStatus::Unknown, output.stderr, code)
        }
        Err(e) => {
            tracing::warn!(error = %e, "status query could not run");
            (HealthStatus::Unknown, String::new(), TRANSPORT_FAILURE)
        }
    };

    tracing::info!(service = %target.service_name(), %status, "verification finished");

    VerificationResult {
        status,
        recent_log,
        status_listing,
        status_exit_code,
    }
}

/// Classify a `ps --services --filter status=running` listing.
pub fn classify(listing: &str, service: &str) -> HealthStatus {
    if listing.lines().any(|line| line.trim() == service) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}
