// ABOUTME: Status command implementation.
// ABOUTME: Runs the verifier alone against the currently deployed service.

use super::connection::{connect, disconnect, flush_warnings, report};
use hoist::config::Config;
use hoist::deploy::Orchestrator;
use hoist::diagnostics::Diagnostics;
use hoist::error::Result;
use hoist::output::Output;

pub async fn status(config: Config, output: Output) -> Result<()> {
    let mut diag = Diagnostics::default();
    let orchestrator = Orchestrator::from_config(&config, false)?;

    let session = connect(&config, &output).await?;
    let result = orchestrator.status(&session).await;
    disconnect(session, &mut diag).await;

    report(&result, &output, &mut diag);
    flush_warnings(&diag, &output);

    let attempt = result?;
    output.success(&format!(
        "{} is {}",
        attempt.target().service_name(),
        attempt.status()
    ));
    Ok(())
}
