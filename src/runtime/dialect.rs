// ABOUTME: Compose command dialects and the strategy objects that render their commands.
// ABOUTME: All dialect-specific command strings live here and nowhere else.

use serde::Serialize;
use std::fmt;

use super::sealed::Sealed;
use crate::shell::quote;
use crate::types::ServiceTarget;

/// Which compose command form a host exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Legacy standalone binary, invoked as `docker-compose`.
    Standalone,
    /// Runtime plugin, invoked as `docker compose`.
    Plugin,
    /// Neither form resolved.
    None,
}

impl Dialect {
    /// The command strategy for this dialect, or `None` if detection failed.
    pub fn compose(self) -> Option<&'static dyn ComposeDialect> {
        match self {
            Dialect::Standalone => Some(&StandaloneCompose),
            Dialect::Plugin => Some(&PluginCompose),
            Dialect::None => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        self != Dialect::None
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Standalone => write!(f, "standalone"),
            Dialect::Plugin => write!(f, "plugin"),
            Dialect::None => write!(f, "none"),
        }
    }
}

/// Renders compose lifecycle commands for one dialect.
///
/// Implementations only differ in how compose is invoked; every lifecycle
/// command names the compose file and project directory explicitly so the
/// remote shell's working directory never matters.
pub trait ComposeDialect: Sealed + Send + Sync + fmt::Debug {
    /// The dialect this strategy renders.
    fn dialect(&self) -> Dialect;

    /// Invocation prefix, e.g. `docker-compose`.
    fn program(&self) -> &'static str;

    /// Command that succeeds only if this dialect is usable on the host.
    fn version_command(&self) -> String;

    /// Prefix shared by every lifecycle command for `target`.
    fn project(&self, target: &ServiceTarget) -> String {
        format!(
            "{} -f {} --project-directory {}",
            self.program(),
            quote(target.compose_file_path()),
            quote(target.remote_directory())
        )
    }

    /// Stop and remove the service's containers. Exits 0 when none exist.
    fn stop_command(&self, target: &ServiceTarget) -> String {
        format!(
            "{} rm --stop --force {}",
            self.project(target),
            quote(target.service_name().as_str())
        )
    }

    /// Rebuild the service image.
    fn build_command(&self, target: &ServiceTarget, no_cache: bool) -> String {
        let flag = if no_cache { " --no-cache" } else { "" };
        format!(
            "{} build{} {}",
            self.project(target),
            flag,
            quote(target.service_name().as_str())
        )
    }

    /// Start the service detached.
    fn start_command(&self, target: &ServiceTarget) -> String {
        format!(
            "{} up -d {}",
            self.project(target),
            quote(target.service_name().as_str())
        )
    }

    /// Last `tail` lines of the service's log stream.
    fn logs_command(&self, target: &ServiceTarget, tail: u32) -> String {
        format!(
            "{} logs --no-color --tail {} {}",
            self.project(target),
            tail,
            quote(target.service_name().as_str())
        )
    }

    /// Names of the project's services with a running container, one per line.
    fn running_services_command(&self, target: &ServiceTarget) -> String {
        format!(
            "{} ps --services --filter status=running",
            self.project(target)
        )
    }
}

/// `docker-compose ...`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandaloneCompose;

impl Sealed for StandaloneCompose {}

impl ComposeDialect for StandaloneCompose {
    fn dialect(&self) -> Dialect {
        Dialect::Standalone
    }

    fn program(&self) -> &'static str {
        "docker-compose"
    }

    // v1 binaries predate `version --short`, `--version` works on every release.
    fn version_command(&self) -> String {
        "docker-compose --version".to_string()
    }
}

/// `docker compose ...`
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginCompose;

impl Sealed for PluginCompose {}

impl ComposeDialect for PluginCompose {
    fn dialect(&self) -> Dialect {
        Dialect::Plugin
    }

    fn program(&self) -> &'static str {
        "docker compose"
    }

    fn version_command(&self) -> String {
        "docker compose version".to_string()
    }
}
