// ABOUTME: Integration tests for compose dialect detection.
// ABOUTME: Covers the standalone-first precedence rule and failing probes.

mod support;

use hoist::runtime::{Dialect, detect, runtime_present};
use support::scripted_channel::{ScriptedChannel, exit, ok, transport_error};

const STANDALONE: &str = "docker-compose --version";
const PLUGIN: &str = "docker compose version";

#[tokio::test]
async fn only_standalone_resolves() {
    support::init_tracing();
    let host = ScriptedChannel::new().on(STANDALONE, ok("docker-compose version 1.29.2"));

    assert_eq!(detect(&host).await, Dialect::Standalone);
}

#[tokio::test]
async fn only_plugin_resolves() {
    let host = ScriptedChannel::new().on(PLUGIN, ok("Docker Compose version v2.24.5"));

    assert_eq!(detect(&host).await, Dialect::Plugin);
}

#[tokio::test]
async fn standalone_wins_when_both_resolve() {
    let host = ScriptedChannel::new()
        .on(STANDALONE, ok("Docker Compose version v2.24.5"))
        .on(PLUGIN, ok("Docker Compose version v2.24.5"));

    assert_eq!(detect(&host).await, Dialect::Standalone);
    // The plugin is never probed once the standalone binary answers.
    assert_eq!(host.count(PLUGIN), 0);
}

#[tokio::test]
async fn neither_resolves() {
    let host = ScriptedChannel::new()
        .on(STANDALONE, exit(127, "docker-compose: not found"))
        .on(PLUGIN, exit(1, "docker: 'compose' is not a docker command."));

    assert_eq!(detect(&host).await, Dialect::None);
}

#[tokio::test]
async fn transport_error_counts_as_unresolved() {
    let host = ScriptedChannel::new()
        .on(STANDALONE, transport_error())
        .on(PLUGIN, ok("Docker Compose version v2.24.5"));

    assert_eq!(detect(&host).await, Dialect::Plugin);
}

#[tokio::test]
async fn detection_only_runs_probes() {
    let host = ScriptedChannel::new().on(PLUGIN, ok("Docker Compose version v2.24.5"));

    detect(&host).await;

    assert_eq!(host.calls(), vec![STANDALONE.to_string(), PLUGIN.to_string()]);
}

#[tokio::test]
async fn runtime_presence_uses_docker_version() {
    let present = ScriptedChannel::new().on("docker --version", ok("Docker version 25.0.3"));
    let absent = ScriptedChannel::new();

    assert!(runtime_present(&present).await);
    assert!(!runtime_present(&absent).await);
}
