// ABOUTME: Rollout orchestration: phases, audit trail, sequencer and verifier.
// ABOUTME: Exports the error taxonomy every run is reported through.

mod attempt;
mod error;
mod orchestrator;
mod phase;
mod sequencer;
mod upload;
mod verify;

pub use attempt::{Outcome, RolloutAttempt, TRANSPORT_FAILURE};
pub use error::{ErrorKind, OrchestrationError};
pub use orchestrator::Orchestrator;
pub use phase::Phase;
pub use sequencer::{RolloutOptions, rollout, rollout_with};
pub use upload::FileTransfer;
pub use verify::{
    DEFAULT_GRACE_PERIOD, DEFAULT_LOG_TAIL, HealthStatus, VerificationResult, VerifyOptions,
    classify, verify,
};
