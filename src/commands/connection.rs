// ABOUTME: Shared helpers for opening and closing the SSH session.
// ABOUTME: Also renders a finished run so every command reports the same way.

use hoist::config::Config;
use hoist::deploy::{OrchestrationError, RolloutAttempt};
use hoist::diagnostics::{Diagnostics, Warning};
use hoist::error::Result;
use hoist::output::Output;
use hoist::ssh::Session;

/// Connect to the configured host.
pub async fn connect(config: &Config, output: &Output) -> Result<Session> {
    let session_config = config.session_config()?;
    output.progress(&format!(
        "  → Connecting to {}@{}:{}...",
        session_config.user, session_config.host, session_config.port
    ));
    Ok(Session::connect(session_config).await?)
}

/// Disconnect, recording a warning instead of failing.
pub async fn disconnect(session: Session, diag: &mut Diagnostics) {
    let host = session.host().to_string();
    if let Err(e) = session.disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            host, e
        )));
    }
}

/// Print the audit trail of a run, and the log excerpt if the service is not healthy.
pub fn report(
    result: &std::result::Result<RolloutAttempt, OrchestrationError>,
    output: &Output,
    diag: &mut Diagnostics,
) {
    let (attempt, failed) = match result {
        Ok(attempt) => (attempt, false),
        Err(e) => (e.attempt(), true),
    };

    output.audit(attempt);

    if let Some(verification) = attempt.verification() {
        if verification.recent_log.trim().is_empty() {
            diag.warn(Warning::missing_log(format!(
                "no log output captured for {}",
                attempt.target().service_name()
            )));
        } else if failed {
            output.log(&verification.recent_log);
        }
    }
}

/// Emit collected warnings.
pub fn flush_warnings(diag: &Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
