// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes, including the run's audit trail.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::RolloutAttempt;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_stdout("success", message),
        }
    }

    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit_stderr("warning", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_stderr("error", message),
        }
    }

    /// Print the audit trail of a run: dialect, every phase with its exit
    /// code, and the verification result if there is one.
    pub fn audit(&self, attempt: &RolloutAttempt) {
        match self.mode {
            OutputMode::Json => {
                let event = AuditEvent {
                    event: "attempt",
                    attempt,
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
            OutputMode::Quiet => {}
            OutputMode::Normal => {
                for line in audit_lines(attempt) {
                    println!("{line}");
                }
            }
        }
    }

    /// Print captured service log lines.
    pub fn log(&self, log: &str) {
        if self.mode == OutputMode::Json || log.trim().is_empty() {
            return;
        }
        println!("  --- recent log ---");
        for line in log.trim_end().lines() {
            println!("  | {line}");
        }
    }

    fn emit_stdout(&self, event: &str, message: &str) {
        if let Ok(json) = serde_json::to_string(&self.event(event, message)) {
            println!("{json}");
        }
    }

    fn emit_stderr(&self, event: &str, message: &str) {
        if let Ok(json) = serde_json::to_string(&self.event(event, message)) {
            eprintln!("{json}");
        }
    }

    fn event<'a>(&self, event: &'a str, message: &'a str) -> JsonEvent<'a> {
        JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        }
    }
}

/// Human-readable audit trail lines.
pub fn audit_lines(attempt: &RolloutAttempt) -> Vec<String> {
    let mut lines = vec![format!(
        "  service {} ({}), dialect {}",
        attempt.target().service_name(),
        attempt.target().remote_directory(),
        attempt.dialect()
    )];

    for (phase, code) in attempt.exit_codes() {
        let mark = if *code == 0 { "ok" } else { "FAILED" };
        lines.push(format!("  {:<8} exit {:>3}  {}", phase.as_str(), code, mark));
    }

    if attempt.is_halted() {
        lines.push(format!("  halted in {}", attempt.phase()));
        if let Some(detail) = attempt.failure_detail() {
            for line in detail.lines() {
                lines.push(format!("    {line}"));
            }
        }
    }
    if attempt.timed_out() {
        lines.push(format!("  timed out during {}", attempt.phase()));
    }
    if let Some(verification) = attempt.verification() {
        lines.push(format!("  status   {}", verification.status));
    }
    lines
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct AuditEvent<'a> {
    event: &'a str,
    attempt: &'a RolloutAttempt,
}
