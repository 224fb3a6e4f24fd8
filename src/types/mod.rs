// ABOUTME: Validated domain types shared across the orchestrator.
// ABOUTME: Service names and the deployable target built from configuration.

mod service_name;
mod service_target;

pub use service_name::{ServiceName, ServiceNameError};
pub use service_target::{ServiceTarget, ServiceTargetError};
