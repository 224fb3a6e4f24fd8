// ABOUTME: The deployable unit: a compose service inside a remote project directory.
// ABOUTME: Built once from configuration and passed explicitly to every remote step.

use super::ServiceName;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceTargetError {
    #[error("remote directory cannot be empty")]
    EmptyRemoteDir,

    #[error("remote directory must be an absolute path: {0}")]
    RelativeRemoteDir(String),

    #[error("compose file path cannot be empty")]
    EmptyComposeFile,
}

/// One service on the remote host.
///
/// `compose_file_path` is always absolute: a relative path given at
/// construction is resolved against `remote_directory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceTarget {
    service_name: ServiceName,
    remote_directory: String,
    compose_file_path: String,
}

impl ServiceTarget {
    pub fn new(
        service_name: ServiceName,
        remote_directory: &str,
        compose_file: &str,
    ) -> Result<Self, ServiceTargetError> {
        let remote_directory = remote_directory.trim();
        if remote_directory.is_empty() {
            return Err(ServiceTargetError::EmptyRemoteDir);
        }
        if !remote_directory.starts_with('/') {
            return Err(ServiceTargetError::RelativeRemoteDir(
                remote_directory.to_string(),
            ));
        }

        let compose_file = compose_file.trim();
        if compose_file.is_empty() {
            return Err(ServiceTargetError::EmptyComposeFile);
        }

        let remote_directory = match remote_directory.trim_end_matches('/') {
            "" => "/".to_string(),
            dir => dir.to_string(),
        };

        let compose_file_path = if compose_file.starts_with('/') {
            compose_file.to_string()
        } else {
            join(&remote_directory, compose_file)
        };

        Ok(Self {
            service_name,
            remote_directory,
            compose_file_path,
        })
    }

    pub fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    pub fn remote_directory(&self) -> &str {
        &self.remote_directory
    }

    pub fn compose_file_path(&self) -> &str {
        &self.compose_file_path
    }

    /// Resolve a path relative to the remote project directory.
    pub fn remote_path(&self, relative: &str) -> String {
        if relative.starts_with('/') {
            relative.to_string()
        } else {
            join(&self.remote_directory, relative)
        }
    }
}

fn join(dir: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches("./");
    if dir == "/" {
        format!("/{relative}")
    } else {
        format!("{dir}/{relative}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name() -> ServiceName {
        ServiceName::new("bot").unwrap()
    }

    #[test]
    fn relative_compose_file_is_resolved_against_remote_dir() {
        let target = ServiceTarget::new(name(), "/opt/bot/", "docker-compose.yml").unwrap();
        assert_eq!(target.remote_directory(), "/opt/bot");
        assert_eq!(target.compose_file_path(), "/opt/bot/docker-compose.yml");
    }

    #[test]
    fn absolute_compose_file_is_kept() {
        let target = ServiceTarget::new(name(), "/opt/bot", "/etc/compose/bot.yml").unwrap();
        assert_eq!(target.compose_file_path(), "/etc/compose/bot.yml");
    }

    #[test]
    fn dot_slash_prefix_is_dropped() {
        let target = ServiceTarget::new(name(), "/opt/bot", "./compose.yaml").unwrap();
        assert_eq!(target.compose_file_path(), "/opt/bot/compose.yaml");
    }

    #[test]
    fn relative_remote_dir_is_rejected() {
        let err = ServiceTarget::new(name(), "opt/bot", "compose.yaml").unwrap_err();
        assert!(matches!(err, ServiceTargetError::RelativeRemoteDir(_)));
    }

    #[test]
    fn empty_compose_file_is_rejected() {
        let err = ServiceTarget::new(name(), "/opt/bot", " ").unwrap_err();
        assert!(matches!(err, ServiceTargetError::EmptyComposeFile));
    }

    #[test]
    fn remote_path_joins_relative_paths() {
        let target = ServiceTarget::new(name(), "/opt/bot", "compose.yaml").unwrap();
        assert_eq!(target.remote_path(".env"), "/opt/bot/.env");
        assert_eq!(target.remote_path("config/creds.json"), "/opt/bot/config/creds.json");
        assert_eq!(target.remote_path("/etc/bot.env"), "/etc/bot.env");
    }
}
