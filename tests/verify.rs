// ABOUTME: Integration tests for post-start verification.
// ABOUTME: A failed status query must read as unknown, never as a down service.

mod support;

use hoist::deploy::{HealthStatus, TRANSPORT_FAILURE, VerifyOptions, verify};
use hoist::runtime::Dialect;
use hoist::types::{ServiceName, ServiceTarget};
use std::time::Duration;
use support::scripted_channel::{ScriptedChannel, exit, ok, transport_error};

const LOGS: &str = " logs --no-color --tail";
const PS: &str = " ps --services --filter status=running";

fn target() -> ServiceTarget {
    ServiceTarget::new(ServiceName::new("bot").unwrap(), "/opt/bot", "compose.yaml").unwrap()
}

fn options() -> VerifyOptions {
    VerifyOptions {
        grace_period: Duration::ZERO,
        log_tail: 20,
    }
}

async fn run(host: &ScriptedChannel) -> hoist::deploy::VerificationResult {
    let compose = Dialect::Plugin.compose().unwrap();
    verify(host, &target(), compose, &options()).await
}

#[tokio::test]
async fn running_service_is_healthy() {
    let host = ScriptedChannel::new()
        .on(LOGS, ok("bot-1  | ready\n"))
        .on(PS, ok("db\nbot\n"));

    let result = run(&host).await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert_eq!(result.recent_log, "bot-1  | ready\n");
    assert_eq!(result.status_exit_code, 0);
    assert_eq!(host.count("--tail 20 bot"), 1);
}

#[tokio::test]
async fn absent_service_is_unhealthy() {
    let host = ScriptedChannel::new()
        .on(LOGS, ok("bot-1 exited with code 1\n"))
        .on(PS, ok("db\n"));

    let result = run(&host).await;

    assert_eq!(result.status, HealthStatus::Unhealthy);
    assert!(result.recent_log.contains("exited with code 1"));
}

#[tokio::test]
async fn status_transport_error_is_unknown() {
    let host = ScriptedChannel::new()
        .on(LOGS, ok(""))
        .on(PS, transport_error());

    let result = run(&host).await;

    assert_eq!(result.status, HealthStatus::Unknown);
    assert_eq!(result.status_exit_code, TRANSPORT_FAILURE);
}

#[tokio::test]
async fn failing_status_query_is_unknown() {
    let host = ScriptedChannel::new()
        .on(LOGS, ok(""))
        .on(PS, exit(1, "Cannot connect to the Docker daemon"));

    let result = run(&host).await;

    assert_eq!(result.status, HealthStatus::Unknown);
    assert_eq!(result.status_exit_code, 1);
}

#[tokio::test]
async fn failed_log_query_does_not_decide_status() {
    let host = ScriptedChannel::new()
        .on(LOGS, transport_error())
        .on(PS, ok("bot\n"));

    let result = run(&host).await;

    assert_eq!(result.status, HealthStatus::Healthy);
    assert!(result.recent_log.is_empty());
}

#[tokio::test]
async fn logs_are_fetched_before_status() {
    let host = ScriptedChannel::new()
        .on(LOGS, ok(""))
        .on(PS, ok("bot\n"));

    run(&host).await;

    let calls = host.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].contains(LOGS));
    assert!(calls[1].contains(PS));
}
