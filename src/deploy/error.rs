// ABOUTME: Orchestration error taxonomy with SNAFU, each carrying the run's audit trail.
// ABOUTME: Maps every failure class to the CLI exit code for programmatic handling.

use snafu::Snafu;

use crate::runtime::InstallError;

use super::attempt::RolloutAttempt;
use super::phase::Phase;

/// Failure of an orchestration run.
///
/// Every variant owns the full `RolloutAttempt` so callers can report which
/// phases ran and what they returned. Nothing is retried.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OrchestrationError {
    #[snafu(display("neither docker-compose nor the compose plugin is available"))]
    DetectionAmbiguous { attempt: Box<RolloutAttempt> },

    #[snafu(display("installation failed: {source}"))]
    InstallationFailed {
        source: InstallError,
        attempt: Box<RolloutAttempt>,
    },

    #[snafu(display("{phase} phase failed with exit code {exit_code}"))]
    PhaseFailed {
        phase: Phase,
        exit_code: i32,
        attempt: Box<RolloutAttempt>,
    },

    #[snafu(display(
        "service {} is not running after start",
        attempt.target().service_name()
    ))]
    Unhealthy { attempt: Box<RolloutAttempt> },

    #[snafu(display("could not determine the state of service {}", attempt.target().service_name()))]
    VerificationInconclusive { attempt: Box<RolloutAttempt> },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No compose dialect resolved and no install was attempted.
    DetectionAmbiguous,
    /// Install attempted, dialect still unavailable.
    InstallationFailed,
    /// A rollout phase returned non-zero.
    PhaseFailed,
    /// Verification found the service down.
    Unhealthy,
    /// Verification could not determine the state.
    Inconclusive,
}

impl ErrorKind {
    /// Process exit code reported by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::DetectionAmbiguous | ErrorKind::InstallationFailed => 1,
            ErrorKind::PhaseFailed => 2,
            ErrorKind::Unhealthy => 3,
            ErrorKind::Inconclusive => 4,
        }
    }
}

impl OrchestrationError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestrationError::DetectionAmbiguous { .. } => ErrorKind::DetectionAmbiguous,
            OrchestrationError::InstallationFailed { .. } => ErrorKind::InstallationFailed,
            OrchestrationError::PhaseFailed { .. } => ErrorKind::PhaseFailed,
            OrchestrationError::Unhealthy { .. } => ErrorKind::Unhealthy,
            OrchestrationError::VerificationInconclusive { .. } => ErrorKind::Inconclusive,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// The audit trail of the failed run.
    pub fn attempt(&self) -> &RolloutAttempt {
        match self {
            OrchestrationError::DetectionAmbiguous { attempt }
            | OrchestrationError::InstallationFailed { attempt, .. }
            | OrchestrationError::PhaseFailed { attempt, .. }
            | OrchestrationError::Unhealthy { attempt }
            | OrchestrationError::VerificationInconclusive { attempt } => attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(ErrorKind::DetectionAmbiguous.exit_code(), 1);
        assert_eq!(ErrorKind::InstallationFailed.exit_code(), 1);
        assert_eq!(ErrorKind::PhaseFailed.exit_code(), 2);
        assert_eq!(ErrorKind::Unhealthy.exit_code(), 3);
        assert_eq!(ErrorKind::Inconclusive.exit_code(), 4);
    }
}
