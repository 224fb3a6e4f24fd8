// ABOUTME: Phases of an orchestration run, in execution order.
// ABOUTME: Doubles as the state of the run's linear state machine.

use serde::Serialize;
use std::fmt;

/// A step of an orchestration run.
///
/// Runs only ever move forward through these in declaration order; a
/// rollout proper covers `Stop` through `Verify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Detect,
    Install,
    /// Copy configured files into the project directory.
    Upload,
    Stop,
    Build,
    Start,
    Verify,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Detect => "detect",
            Phase::Install => "install",
            Phase::Upload => "upload",
            Phase::Stop => "stop",
            Phase::Build => "build",
            Phase::Start => "start",
            Phase::Verify => "verify",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
