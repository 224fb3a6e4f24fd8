// ABOUTME: The stop -> build -> start -> verify rollout for one compose service.
// ABOUTME: Halts on the first failing phase and never compensates for applied steps.

use crate::channel::RemoteChannel;
use crate::runtime::Dialect;
use crate::types::ServiceTarget;

use super::attempt::{RolloutAttempt, TRANSPORT_FAILURE};
use super::phase::Phase;
use super::verify::{VerifyOptions, verify};

/// Caller choices for a rollout.
#[derive(Debug, Clone, Default)]
pub struct RolloutOptions {
    /// Rebuild the image without the layer cache.
    pub no_cache: bool,
    pub verify: VerifyOptions,
}

/// Roll out `target` with default options.
pub async fn rollout<C>(channel: &C, target: &ServiceTarget, dialect: Dialect) -> RolloutAttempt
where
    C: RemoteChannel + ?Sized,
{
    rollout_with(channel, target, dialect, &RolloutOptions::default()).await
}

/// Roll out `target`, returning the finished audit trail.
///
/// An unresolved dialect halts the attempt at `Detect` before any command
/// runs.
pub async fn rollout_with<C>(
    channel: &C,
    target: &ServiceTarget,
    dialect: Dialect,
    options: &RolloutOptions,
) -> RolloutAttempt
where
    C: RemoteChannel + ?Sized,
{
    let mut attempt = RolloutAttempt::new(target.clone(), dialect);
    run_rollout(channel, &mut attempt, options).await;
    attempt.finish();
    attempt
}

/// Drive `attempt` from `Stop` through `Verify` using its dialect.
pub(crate) async fn run_rollout<C>(
    channel: &C,
    attempt: &mut RolloutAttempt,
    options: &RolloutOptions,
) where
    C: RemoteChannel + ?Sized,
{
    let Some(compose) = attempt.dialect().compose() else {
        tracing::error!("refusing to roll out without a resolved compose dialect");
        attempt.halt(Some("no compose dialect resolved".to_string()));
        return;
    };
    let target = attempt.target().clone();

    let steps = [
        (Phase::Stop, compose.stop_command(&target)),
        (Phase::Build, compose.build_command(&target, options.no_cache)),
        (Phase::Start, compose.start_command(&target)),
    ];

    for (phase, command) in &steps {
        if !run_phase(channel, attempt, *phase, command).await {
            return;
        }
    }

    attempt.enter(Phase::Verify);
    let result = verify(channel, &target, compose, &options.verify).await;
    attempt.record(Phase::Verify, result.status_exit_code);
    attempt.set_verification(result);
}

/// Run one phase command. Returns false if the attempt halted.
async fn run_phase<C>(
    channel: &C,
    attempt: &mut RolloutAttempt,
    phase: Phase,
    command: &str,
) -> bool
where
    C: RemoteChannel + ?Sized,
{
    attempt.enter(phase);
    tracing::info!(%phase, service = %attempt.target().service_name(), "running phase");

    match channel.execute(command).await {
        Ok(output) => {
            let exit_code = i32::try_from(output.exit_code).unwrap_or(i32::MAX);
            attempt.record(phase, exit_code);
            if output.success() {
                return true;
            }
            tracing::error!(%phase, exit_code, stderr = %output.stderr.trim(), "phase failed");
            attempt.halt(Some(tail(&output.stderr, 20)));
            false
        }
        Err(e) => {
            tracing::error!(%phase, error = %e, "phase could not run");
            attempt.record(phase, TRANSPORT_FAILURE);
            attempt.halt(Some(e.to_string()));
            false
        }
    }
}

/// Last `lines` lines of command output.
fn tail(output: &str, lines: usize) -> String {
    let all: Vec<&str> = output.trim_end().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail("a\n", 5), "a");
        assert_eq!(tail("", 5), "");
    }
}
