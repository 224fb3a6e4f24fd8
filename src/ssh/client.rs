// ABOUTME: russh session to the deployment host.
// ABOUTME: Connects, authenticates, and runs the commands and uploads a rollout needs.

use super::error::{Error, Result};
use crate::shell;
use russh::client::{self, Config, Handle, Msg};
use russh::keys::agent::client::AgentClient;
use russh::keys::known_hosts::{
    check_known_hosts, check_known_hosts_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key, ssh_key};
use russh::{Channel, ChannelMsg, Disconnect};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;

const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_KEYS: [&str; 3] = [".ssh/id_ed25519", ".ssh/id_rsa", ".ssh/id_ecdsa"];

/// Where and how to connect. Built from `hoist.yml`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Explicit private key. Without one the agent is tried, then `~/.ssh`.
    pub key_path: Option<PathBuf>,
    /// Accept and remember a host key that is not in known_hosts yet.
    pub trust_on_first_use: bool,
    pub known_hosts_path: Option<PathBuf>,
    /// Limit for each remote command, uploads included.
    pub command_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 22,
            user: user.into(),
            key_path: None,
            trust_on_first_use: false,
            known_hosts_path: None,
            command_timeout: Duration::from_secs(300),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn trust_on_first_use(mut self, trust: bool) -> Self {
        self.trust_on_first_use = trust;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

/// What a remote command printed and how it exited.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub exit_code: u32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Host key policy for one connection.
pub(crate) struct HostKeyCheck {
    host: String,
    port: u16,
    trust_on_first_use: bool,
    known_hosts_path: Option<PathBuf>,
}

impl HostKeyCheck {
    fn from_config(config: &SessionConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            trust_on_first_use: config.trust_on_first_use,
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }

    fn remember(&self, key: &ssh_key::PublicKey) {
        let learned = match &self.known_hosts_path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        };
        if let Err(e) = learned {
            tracing::warn!(host = %self.host, error = %e, "could not record host key");
        }
    }
}

impl client::Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let known = match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, server_public_key, path),
            None => check_known_hosts(&self.host, self.port, server_public_key),
        };

        match known {
            Ok(true) => Ok(true),
            Err(russh::keys::Error::KeyChanged { line }) => {
                tracing::error!(host = %self.host, port = self.port, line, "host key changed");
                Ok(false)
            }
            // Unknown host, or no readable known_hosts file.
            Ok(false) | Err(_) if self.trust_on_first_use => {
                tracing::warn!(host = %self.host, port = self.port, "trusting unknown host key");
                self.remember(server_public_key);
                Ok(true)
            }
            Ok(false) | Err(_) => Ok(false),
        }
    }
}

enum Credentials {
    Agent(AgentClient<UnixStream>),
    Key(Arc<ssh_key::PrivateKey>),
}

/// Explicit key, then the agent, then the first default key that loads.
async fn find_credentials(config: &SessionConfig) -> Result<Credentials> {
    if let Some(path) = &config.key_path {
        let key = load_secret_key(path, None).map_err(|e| Error::KeyLoadFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        return Ok(Credentials::Key(Arc::new(key)));
    }

    if let Ok(agent) = AgentClient::connect_env().await {
        return Ok(Credentials::Agent(agent));
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::AgentUnavailable("no agent and HOME is not set".to_string()))?;
    DEFAULT_KEYS
        .iter()
        .find_map(|relative| load_secret_key(Path::new(&home).join(relative), None).ok())
        .map(|key| Credentials::Key(Arc::new(key)))
        .ok_or_else(|| Error::AgentUnavailable("no agent and no key in ~/.ssh".to_string()))
}

/// An authenticated session. Commands run one at a time on fresh channels.
pub struct Session {
    config: SessionConfig,
    handle: Handle<HostKeyCheck>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("user", &self.config.user)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub async fn connect(config: SessionConfig) -> Result<Self> {
        let credentials = find_credentials(&config).await?;

        let russh_config = Config {
            inactivity_timeout: Some(INACTIVITY_TIMEOUT),
            ..Default::default()
        };
        let mut handle = client::connect(
            Arc::new(russh_config),
            (config.host.as_str(), config.port),
            HostKeyCheck::from_config(&config),
        )
        .await
        .map_err(|e| Error::Connection(format!("{}:{}: {}", config.host, config.port, e)))?;

        if !authenticate(&mut handle, &config.user, credentials).await? {
            return Err(Error::AuthenticationFailed);
        }

        tracing::debug!(host = %config.host, port = config.port, user = %config.user, "connected");
        Ok(Self { config, handle })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Run `command` and wait for its exit status.
    pub async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.run(command, None).await
    }

    /// Write a local file to `remote_path` through `cat`, creating parent
    /// directories. Needs nothing on the host beyond a POSIX shell.
    pub async fn upload(&self, local_path: &Path, remote_path: &str) -> Result<CommandOutput> {
        let contents = tokio::fs::read(local_path)
            .await
            .map_err(|source| Error::LocalFile {
                path: local_path.to_path_buf(),
                source,
            })?;

        let target = shell::quote(remote_path);
        let command = format!("mkdir -p \"$(dirname {target})\" && cat > {target}");
        self.run(&command, Some(&contents)).await
    }

    pub async fn disconnect(self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)
    }

    async fn run(&self, command: &str, stdin: Option<&[u8]>) -> Result<CommandOutput> {
        let limit = self.config.command_timeout;
        tokio::time::timeout(limit, self.run_on_channel(command, stdin))
            .await
            .map_err(|_| Error::CommandTimeout(limit))?
    }

    async fn run_on_channel(&self, command: &str, stdin: Option<&[u8]>) -> Result<CommandOutput> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| Error::CommandFailed(format!("open channel: {e}")))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| Error::CommandFailed(format!("exec: {e}")))?;

        if let Some(data) = stdin {
            channel
                .data(data)
                .await
                .map_err(|e| Error::CommandFailed(format!("send stdin: {e}")))?;
            channel
                .eof()
                .await
                .map_err(|e| Error::CommandFailed(format!("close stdin: {e}")))?;
        }

        collect_output(channel).await
    }
}

async fn authenticate(
    handle: &mut Handle<HostKeyCheck>,
    user: &str,
    credentials: Credentials,
) -> Result<bool> {
    match credentials {
        Credentials::Agent(mut agent) => {
            let identities = agent
                .request_identities()
                .await
                .map_err(|e| Error::AgentUnavailable(format!("list identities: {e}")))?;
            if identities.is_empty() {
                return Err(Error::AgentUnavailable("agent holds no keys".to_string()));
            }

            for identity in identities {
                let accepted = handle
                    .authenticate_publickey_with(user, identity, None, &mut agent)
                    .await
                    .is_ok_and(|result| result.success());
                if accepted {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Credentials::Key(key) => {
            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .map_err(Error::Protocol)?
                .flatten();
            let result = handle
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(key, hash_alg))
                .await
                .map_err(Error::Protocol)?;
            Ok(result.success())
        }
    }
}

/// Drain a channel until the command has both exited and closed its output.
async fn collect_output(mut channel: Channel<Msg>) -> Result<CommandOutput> {
    let mut output = CommandOutput::default();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut exit_status = None;
    let mut eof = false;

    while let Some(message) = channel.wait().await {
        match message {
            ChannelMsg::Data { data } => stdout.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, ext: 1 } => stderr.extend_from_slice(&data),
            ChannelMsg::ExitStatus { exit_status: code } => exit_status = Some(code),
            ChannelMsg::Eof => eof = true,
            ChannelMsg::Close => break,
            _ => {}
        }
        if eof && exit_status.is_some() {
            break;
        }
    }

    // A channel that ends without an exit status leaves the outcome unknown.
    output.exit_code = exit_status.ok_or(Error::ChannelClosed)?;
    output.stdout = String::from_utf8_lossy(&stdout).into_owned();
    output.stderr = String::from_utf8_lossy(&stderr).into_owned();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_config_defaults() {
        let config = SessionConfig::new("203.0.113.7", "deploy");
        assert_eq!(config.port, 22);
        assert!(config.key_path.is_none());
        assert!(!config.trust_on_first_use);
        assert_eq!(config.command_timeout, Duration::from_secs(300));
    }

    #[test]
    fn host_key_check_follows_config() {
        let config = SessionConfig::new("bots.example.com", "deploy")
            .port(2222)
            .trust_on_first_use(true)
            .known_hosts_path("/tmp/known_hosts");
        let check = HostKeyCheck::from_config(&config);

        assert_eq!(check.host, "bots.example.com");
        assert_eq!(check.port, 2222);
        assert!(check.trust_on_first_use);
        assert_eq!(check.known_hosts_path, Some(PathBuf::from("/tmp/known_hosts")));
    }
}
