// ABOUTME: In-memory RemoteChannel that answers commands from a script.
// ABOUTME: Records every command and transfer so tests can assert on what ran.

use async_trait::async_trait;
use hoist::channel::RemoteChannel;
use hoist::ssh::{self, CommandOutput};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How the fake host answers a command.
#[derive(Debug, Clone)]
pub enum Response {
    Exit {
        code: u32,
        stdout: String,
        stderr: String,
    },
    /// The command never produced an exit status.
    TransportError,
    /// Sleep, then answer.
    Slow(Duration, Box<Response>),
}

pub fn ok(stdout: &str) -> Response {
    Response::Exit {
        code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn exit(code: u32, stderr: &str) -> Response {
    Response::Exit {
        code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub fn transport_error() -> Response {
    Response::TransportError
}

pub fn slow(delay: Duration, response: Response) -> Response {
    Response::Slow(delay, Box::new(response))
}

struct Rule {
    pattern: String,
    response: Response,
    once: bool,
    used: bool,
}

/// A fake host. The first rule whose pattern is a substring of the command
/// answers it; `once` rules are skipped after their first use. Unmatched
/// commands exit 127 like a missing binary.
#[derive(Default)]
pub struct ScriptedChannel {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
    transfers: Mutex<Vec<(PathBuf, String)>>,
    transfer_results: Mutex<HashMap<String, Response>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, response: Response) -> Self {
        self.push(pattern, response, false);
        self
    }

    pub fn on_once(self, pattern: &str, response: Response) -> Self {
        self.push(pattern, response, true);
        self
    }

    pub fn on_transfer(self, remote: &str, response: Response) -> Self {
        self.transfer_results
            .lock()
            .insert(remote.to_string(), response);
        self
    }

    fn push(&self, pattern: &str, response: Response, once: bool) {
        self.rules.lock().push(Rule {
            pattern: pattern.to_string(),
            response,
            once,
            used: false,
        });
    }

    /// Every command executed, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Number of executed commands containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.contains(pattern)).count()
    }

    pub fn transfers(&self) -> Vec<(PathBuf, String)> {
        self.transfers.lock().clone()
    }

    fn lookup(&self, command: &str) -> Response {
        let mut rules = self.rules.lock();
        for rule in rules.iter_mut() {
            if rule.once && rule.used {
                continue;
            }
            if command.contains(&rule.pattern) {
                rule.used = true;
                return rule.response.clone();
            }
        }
        exit(127, "command not found")
    }
}

async fn answer(mut response: Response) -> ssh::Result<CommandOutput> {
    loop {
        match response {
            Response::Exit {
                code,
                stdout,
                stderr,
            } => {
                return Ok(CommandOutput {
                    exit_code: code,
                    stdout,
                    stderr,
                });
            }
            Response::TransportError => {
                return Err(ssh::Error::CommandTimeout(Duration::from_secs(300)));
            }
            Response::Slow(delay, inner) => {
                tokio::time::sleep(delay).await;
                response = *inner;
            }
        }
    }
}

#[async_trait]
impl RemoteChannel for ScriptedChannel {
    async fn execute(&self, command: &str) -> ssh::Result<CommandOutput> {
        self.calls.lock().push(command.to_string());
        let response = self.lookup(command);
        answer(response).await
    }

    async fn transfer(&self, local_path: &Path, remote_path: &str) -> ssh::Result<u32> {
        self.transfers
            .lock()
            .push((local_path.to_path_buf(), remote_path.to_string()));
        let response = self
            .transfer_results
            .lock()
            .get(remote_path)
            .cloned()
            .unwrap_or_else(|| ok(""));
        answer(response).await.map(|output| output.exit_code)
    }
}
