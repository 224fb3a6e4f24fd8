// ABOUTME: Configuration types and parsing for hoist.yml.
// ABOUTME: Read once at startup; everything downstream receives explicit values.

mod deserialize;
mod env_value;
mod init;
mod server;

pub use env_value::EnvValue;
pub use init::init_config;
pub use server::ServerAddress;

use crate::deploy::{RolloutOptions, VerifyOptions};
use crate::error::{Error, Result};
use crate::runtime::{DEFAULT_COMPOSE_VERSION, DEFAULT_INSTALL_PATH, InstallOptions};
use crate::ssh::SessionConfig;
use crate::types::{ServiceName, ServiceTarget};
use deserialize::{deserialize_server_address, deserialize_service_name};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "hoist.yml";
pub const CONFIG_FILENAME_ALT: &str = "hoist.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".hoist/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Compose service to roll out.
    #[serde(deserialize_with = "deserialize_service_name")]
    pub service: ServiceName,

    /// `[user@]host[:port]`
    #[serde(deserialize_with = "deserialize_server_address")]
    pub host: ServerAddress,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,

    /// Private key used to authenticate. Falls back to the SSH agent, then
    /// the default key locations.
    #[serde(default)]
    pub key: Option<EnvValue>,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    #[serde(default)]
    pub trust_first_connection: bool,

    /// Absolute project directory on the host.
    pub remote_dir: String,

    #[serde(default = "default_compose_file")]
    pub compose_file: String,

    #[serde(default)]
    pub no_cache: bool,

    /// Files copied into the project directory before every rollout.
    #[serde(default)]
    pub files: Vec<FileMapping>,

    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub grace_period: Duration,

    #[serde(default = "default_log_tail")]
    pub log_tail: u32,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    #[serde(default = "default_deploy_timeout", with = "humantime_serde")]
    pub deploy_timeout: Duration,

    #[serde(default = "default_compose_version")]
    pub compose_version: String,

    #[serde(default = "default_install_path")]
    pub install_path: String,

    /// Run install commands through `sudo`.
    #[serde(default)]
    pub sudo: bool,

    /// Directory the config was loaded from; relative local paths resolve here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// An opaque local file and where it goes on the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileMapping {
    pub local: PathBuf,
    /// Destination, relative to `remote_dir` unless absolute. Defaults to the
    /// local file name.
    #[serde(default)]
    pub remote: Option<String>,
}

impl FileMapping {
    pub fn local_path(&self, base_dir: &Path) -> PathBuf {
        if self.local.is_absolute() {
            self.local.clone()
        } else {
            base_dir.join(&self.local)
        }
    }

    pub fn remote_path(&self, target: &ServiceTarget) -> Result<String> {
        let relative = match &self.remote {
            Some(remote) => remote.clone(),
            None => self
                .local
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "files: cannot derive a remote name from {}",
                        self.local.display()
                    ))
                })?,
        };
        Ok(target.remote_path(&relative))
    }
}

fn default_compose_file() -> String {
    "docker-compose.yml".to_string()
}

fn default_grace_period() -> Duration {
    crate::deploy::DEFAULT_GRACE_PERIOD
}

fn default_log_tail() -> u32 {
    crate::deploy::DEFAULT_LOG_TAIL
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_deploy_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_compose_version() -> String {
    DEFAULT_COMPOSE_VERSION.to_string()
}

fn default_install_path() -> String {
    DEFAULT_INSTALL_PATH.to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        // `.hoist/config.yml` lives one level below the project root.
        if config.base_dir.ends_with(".hoist") {
            config.base_dir.pop();
        }
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        self.target()?;
        if self.log_tail == 0 {
            return Err(Error::InvalidConfig("log_tail must be at least 1".to_string()));
        }
        for file in &self.files {
            if file.local.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("files: local path cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// The deployable unit described by this config.
    pub fn target(&self) -> Result<ServiceTarget> {
        ServiceTarget::new(self.service.clone(), &self.remote_dir, &self.compose_file)
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// SSH user: explicit `user`, then the one in `host`, then `$USER`, then root.
    pub fn ssh_user(&self) -> String {
        self.user
            .clone()
            .or_else(|| self.host.user.clone())
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()))
    }

    pub fn ssh_port(&self) -> u16 {
        self.port.or(self.host.port).unwrap_or(22)
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut session = SessionConfig::new(&self.host.host, self.ssh_user())
            .port(self.ssh_port())
            .trust_on_first_use(self.trust_first_connection)
            .command_timeout(self.command_timeout);

        if let Some(key) = &self.key {
            session = session.key_path(key.resolve_path()?);
        }
        if let Some(known_hosts) = &self.known_hosts {
            session = session.known_hosts_path(known_hosts);
        }
        Ok(session)
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            compose_version: self.compose_version.clone(),
            install_path: self.install_path.clone(),
            sudo: self.sudo,
        }
    }

    /// Rollout options; `force_no_cache` comes from the command line.
    pub fn rollout_options(&self, force_no_cache: bool) -> RolloutOptions {
        RolloutOptions {
            no_cache: self.no_cache || force_no_cache,
            verify: VerifyOptions {
                grace_period: self.grace_period,
                log_tail: self.log_tail,
            },
        }
    }

    /// Starting point for `init`, deploying `service` from `/opt/<service>`.
    pub fn template(service: ServiceName) -> Self {
        Config {
            remote_dir: format!("/opt/{service}"),
            service,
            host: ServerAddress {
                host: "server.example.com".to_string(),
                port: None,
                user: Some("deploy".to_string()),
            },
            port: None,
            user: None,
            key: None,
            known_hosts: None,
            trust_first_connection: false,
            compose_file: default_compose_file(),
            no_cache: false,
            files: vec![],
            grace_period: default_grace_period(),
            log_tail: default_log_tail(),
            command_timeout: default_command_timeout(),
            deploy_timeout: default_deploy_timeout(),
            compose_version: default_compose_version(),
            install_path: default_install_path(),
            sudo: false,
            base_dir: PathBuf::new(),
        }
    }
}
