// ABOUTME: Install command implementation.
// ABOUTME: Runs capability detection and provisions compose if it is missing.

use super::connection::{connect, disconnect, flush_warnings, report};
use hoist::config::Config;
use hoist::deploy::Orchestrator;
use hoist::diagnostics::Diagnostics;
use hoist::error::Result;
use hoist::output::Output;

pub async fn install(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();
    let orchestrator = Orchestrator::from_config(&config, false)?;

    output.progress(&format!("Provisioning {}", config.host.host));

    let session = connect(&config, &output).await?;
    output.progress("  → Detecting compose...");
    let result = orchestrator.install(&session).await;
    disconnect(session, &mut diag).await;

    report(&result, &output, &mut diag);
    flush_warnings(&diag, &output);

    let attempt = result?;
    output.success(&format!("Compose available ({})", attempt.dialect()));
    Ok(())
}
