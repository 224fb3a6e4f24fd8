// ABOUTME: Deploy command implementation.
// ABOUTME: Runs detection, provisioning, file upload and the full rollout.

use super::connection::{connect, disconnect, flush_warnings, report};
use hoist::config::Config;
use hoist::deploy::Orchestrator;
use hoist::diagnostics::Diagnostics;
use hoist::error::Result;
use hoist::output::Output;

pub async fn deploy(config: Config, no_cache: bool, mut output: Output) -> Result<()> {
    output.start_timer();
    let mut diag = Diagnostics::default();
    let orchestrator = Orchestrator::from_config(&config, no_cache)?;

    output.progress(&format!(
        "Deploying {} to {}{}",
        config.service,
        config.host.host,
        if config.no_cache || no_cache {
            " (no cache)"
        } else {
            ""
        }
    ));

    let session = connect(&config, &output).await?;
    output.progress("  → Rolling out...");
    let result = orchestrator.deploy(&session).await;
    disconnect(session, &mut diag).await;

    report(&result, &output, &mut diag);
    flush_warnings(&diag, &output);

    let attempt = result?;
    output.success(&format!(
        "Deployed {} ({})",
        attempt.target().service_name(),
        attempt.status()
    ));
    Ok(())
}
