// ABOUTME: Capability detection for the remote host's container tooling.
// ABOUTME: Probes the standalone compose binary first, then the runtime plugin.

use super::dialect::{ComposeDialect, Dialect, PluginCompose, StandaloneCompose};
use crate::channel::RemoteChannel;

const RUNTIME_VERSION_COMMAND: &str = "docker --version";

/// Detect which compose dialect the host supports.
///
/// Detection order:
/// 1. Standalone binary (`docker-compose --version`)
/// 2. Runtime plugin (`docker compose version`)
///
/// The standalone binary wins when both resolve, so hosts that were already
/// set up around `docker-compose` keep using it.
pub async fn detect<C>(channel: &C) -> Dialect
where
    C: RemoteChannel + ?Sized,
{
    if detect_standalone(channel).await {
        return Dialect::Standalone;
    }

    if probe(channel, &PluginCompose.version_command()).await {
        return Dialect::Plugin;
    }

    Dialect::None
}

/// Whether the standalone compose binary resolves.
pub async fn detect_standalone<C>(channel: &C) -> bool
where
    C: RemoteChannel + ?Sized,
{
    probe(channel, &StandaloneCompose.version_command()).await
}

/// Whether the container runtime itself is installed.
pub async fn runtime_present<C>(channel: &C) -> bool
where
    C: RemoteChannel + ?Sized,
{
    probe(channel, RUNTIME_VERSION_COMMAND).await
}

/// Run a read-only probe. Transport errors count as "not resolved".
async fn probe<C>(channel: &C, command: &str) -> bool
where
    C: RemoteChannel + ?Sized,
{
    match channel.execute(command).await {
        Ok(output) if output.success() => {
            tracing::debug!(command, version = %output.stdout.trim(), "probe resolved");
            true
        }
        Ok(output) => {
            tracing::debug!(command, exit_code = output.exit_code, "probe failed");
            false
        }
        Err(e) => {
            tracing::debug!(command, error = %e, "probe could not run");
            false
        }
    }
}
