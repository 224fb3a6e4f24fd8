// ABOUTME: In-memory audit trail of one orchestration run.
// ABOUTME: Records every executed phase with its exit code and the final verification.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::runtime::Dialect;
use crate::types::ServiceTarget;

use super::error::OrchestrationError;
use super::phase::Phase;
use super::verify::{HealthStatus, VerificationResult};

/// Exit code recorded when a phase's command could not run at all.
pub const TRANSPORT_FAILURE: i32 = -1;

/// One orchestration run against one target.
///
/// Created at the start of a run and appended to as phases complete. Nothing
/// here is persisted; the caller reports it and drops it.
#[derive(Debug, Clone, Serialize)]
pub struct RolloutAttempt {
    target: ServiceTarget,
    dialect: Dialect,
    phase: Phase,
    exit_codes: Vec<(Phase, i32)>,
    halted: bool,
    timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<VerificationResult>,
    started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

/// Where a finished run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Neither dialect resolved and nothing was installed.
    NoDialect,
    /// A phase returned non-zero (or could not run) and the run stopped there.
    Halted { phase: Phase, exit_code: i32 },
    /// Verification ran (or the run timed out) with this result.
    Verified(HealthStatus),
    /// The run ended without reaching verification (`install`).
    Provisioned,
}

impl RolloutAttempt {
    pub fn new(target: ServiceTarget, dialect: Dialect) -> Self {
        Self {
            target,
            dialect,
            phase: Phase::Detect,
            exit_codes: Vec::new(),
            halted: false,
            timed_out: false,
            failure_detail: None,
            verification: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn target(&self) -> &ServiceTarget {
        &self.target
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The phase the run is in, or the one it halted in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn exit_codes(&self) -> &[(Phase, i32)] {
        &self.exit_codes
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// stderr (or transport error) of the phase that halted the run.
    pub fn failure_detail(&self) -> Option<&str> {
        self.failure_detail.as_deref()
    }

    pub fn verification(&self) -> Option<&VerificationResult> {
        self.verification.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Health as far as this run knows. A timed-out run is always `Unknown`.
    pub fn status(&self) -> HealthStatus {
        if self.timed_out {
            return HealthStatus::Unknown;
        }
        self.verification
            .as_ref()
            .map(|v| v.status)
            .unwrap_or(HealthStatus::Unknown)
    }

    pub fn outcome(&self) -> Outcome {
        if self.timed_out {
            return Outcome::Verified(HealthStatus::Unknown);
        }
        if self.halted {
            if self.phase == Phase::Detect {
                return Outcome::NoDialect;
            }
            let exit_code = self
                .exit_codes
                .iter()
                .rev()
                .find(|(phase, _)| *phase == self.phase)
                .map(|(_, code)| *code)
                .unwrap_or(TRANSPORT_FAILURE);
            return Outcome::Halted {
                phase: self.phase,
                exit_code,
            };
        }
        match &self.verification {
            Some(v) => Outcome::Verified(v.status),
            None => Outcome::Provisioned,
        }
    }

    /// Convert into the error taxonomy. `Ok` for healthy and provisioned runs.
    pub fn into_result(self) -> Result<Self, OrchestrationError> {
        match self.outcome() {
            Outcome::Provisioned | Outcome::Verified(HealthStatus::Healthy) => Ok(self),
            Outcome::NoDialect => Err(OrchestrationError::DetectionAmbiguous {
                attempt: Box::new(self),
            }),
            Outcome::Halted { phase, exit_code } => Err(OrchestrationError::PhaseFailed {
                phase,
                exit_code,
                attempt: Box::new(self),
            }),
            Outcome::Verified(HealthStatus::Unhealthy) => Err(OrchestrationError::Unhealthy {
                attempt: Box::new(self),
            }),
            Outcome::Verified(HealthStatus::Unknown) => {
                Err(OrchestrationError::VerificationInconclusive {
                    attempt: Box::new(self),
                })
            }
        }
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        debug_assert!(phase >= self.phase, "phases only move forward");
        tracing::debug!(%phase, "entering phase");
        self.phase = phase;
    }

    pub(crate) fn set_dialect(&mut self, dialect: Dialect) {
        self.dialect = dialect;
    }

    pub(crate) fn record(&mut self, phase: Phase, exit_code: i32) {
        self.exit_codes.push((phase, exit_code));
    }

    pub(crate) fn halt(&mut self, detail: Option<String>) {
        self.halted = true;
        self.failure_detail = detail.filter(|d| !d.is_empty());
    }

    pub(crate) fn set_verification(&mut self, result: VerificationResult) {
        self.verification = Some(result);
    }

    pub(crate) fn mark_timed_out(&mut self) {
        self.timed_out = true;
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceName;

    fn attempt() -> RolloutAttempt {
        let target =
            ServiceTarget::new(ServiceName::new("bot").unwrap(), "/opt/bot", "compose.yaml")
                .unwrap();
        RolloutAttempt::new(target, Dialect::Plugin)
    }

    fn verification(status: HealthStatus) -> VerificationResult {
        VerificationResult {
            status,
            recent_log: String::new(),
            status_listing: String::new(),
            status_exit_code: 0,
        }
    }

    #[test]
    fn fresh_attempt_starts_at_detect() {
        let attempt = attempt();
        assert_eq!(attempt.phase(), Phase::Detect);
        assert!(attempt.exit_codes().is_empty());
        assert_eq!(attempt.outcome(), Outcome::Provisioned);
    }

    #[test]
    fn halt_at_detect_is_no_dialect() {
        let mut attempt = attempt();
        attempt.halt(None);
        assert_eq!(attempt.outcome(), Outcome::NoDialect);
        let err = attempt.into_result().unwrap_err();
        assert!(matches!(err, OrchestrationError::DetectionAmbiguous { .. }));
    }

    #[test]
    fn halted_phase_reports_its_exit_code() {
        let mut attempt = attempt();
        attempt.enter(Phase::Stop);
        attempt.record(Phase::Stop, 0);
        attempt.enter(Phase::Build);
        attempt.record(Phase::Build, 17);
        attempt.halt(Some("no space left on device".to_string()));

        assert_eq!(
            attempt.outcome(),
            Outcome::Halted {
                phase: Phase::Build,
                exit_code: 17
            }
        );
        assert_eq!(attempt.failure_detail(), Some("no space left on device"));
    }

    #[test]
    fn healthy_verification_is_ok() {
        let mut attempt = attempt();
        attempt.enter(Phase::Verify);
        attempt.set_verification(verification(HealthStatus::Healthy));
        assert!(attempt.into_result().is_ok());
    }

    #[test]
    fn timeout_overrides_verification() {
        let mut attempt = attempt();
        attempt.enter(Phase::Verify);
        attempt.set_verification(verification(HealthStatus::Healthy));
        attempt.mark_timed_out();
        assert_eq!(attempt.status(), HealthStatus::Unknown);
        let err = attempt.into_result().unwrap_err();
        assert!(matches!(
            err,
            OrchestrationError::VerificationInconclusive { .. }
        ));
    }

    #[test]
    fn empty_failure_detail_is_dropped() {
        let mut attempt = attempt();
        attempt.enter(Phase::Stop);
        attempt.halt(Some(String::new()));
        assert!(attempt.failure_detail().is_none());
    }
}
