// ABOUTME: Idempotent provisioning of the container runtime and the compose binary.
// ABOUTME: Installs at most once per run and confirms with a fresh detection probe.

use super::detection::{detect, detect_standalone, runtime_present};
use super::dialect::Dialect;
use crate::channel::RemoteChannel;
use crate::shell::quote;
use crate::ssh;

pub const DEFAULT_COMPOSE_VERSION: &str = "v2.24.5";
pub const DEFAULT_INSTALL_PATH: &str = "/usr/local/bin/docker-compose";
pub const RUNTIME_INSTALL_COMMAND: &str = "curl -fsSL https://get.docker.com | sh";

/// Errors from provisioning. Any of these ends the run.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("{step} exited with code {exit_code}: {stderr}")]
    CommandFailed {
        step: &'static str,
        exit_code: u32,
        stderr: String,
    },

    #[error("{step} could not run: {source}")]
    Transport {
        step: &'static str,
        #[source]
        source: ssh::Error,
    },

    #[error("host reported an empty {0}")]
    UnknownPlatform(&'static str),

    #[error("compose binary installed at {0} but still does not resolve")]
    StillMissing(String),
}

/// Where to fetch the standalone binary from and where to put it.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Pinned compose release tag.
    pub compose_version: String,
    /// Destination of the standalone binary on the host.
    pub install_path: String,
    /// Prefix privileged commands with `sudo`.
    pub sudo: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            compose_version: DEFAULT_COMPOSE_VERSION.to_string(),
            install_path: DEFAULT_INSTALL_PATH.to_string(),
            sudo: false,
        }
    }
}

/// Release asset URL for the standalone binary.
///
/// `os` and `arch` are the raw `uname -s` / `uname -m` values; they are
/// normalised to the names compose publishes assets under.
pub fn download_url(version: &str, os: &str, arch: &str) -> String {
    let os = os.trim().to_ascii_lowercase();
    let arch = match arch.trim() {
        "arm64" => "aarch64",
        "armv7l" => "armv7",
        "armv6l" => "armv6",
        other => other,
    };
    format!("https://github.com/docker/compose/releases/download/{version}/docker-compose-{os}-{arch}")
}

/// Provisions missing tooling based on detector results.
#[derive(Debug, Clone, Default)]
pub struct Installer {
    options: InstallOptions,
}

impl Installer {
    pub fn new(options: InstallOptions) -> Self {
        Self { options }
    }

    /// Make sure a compose dialect is usable, installing it if needed.
    ///
    /// A resolved `dialect` is returned unchanged without touching the host.
    /// Otherwise the runtime (if absent) and the standalone binary are
    /// installed once, and the standalone probe decides the outcome.
    pub async fn ensure_installed<C>(
        &self,
        channel: &C,
        dialect: Dialect,
    ) -> Result<Dialect, InstallError>
    where
        C: RemoteChannel + ?Sized,
    {
        if dialect.is_resolved() {
            tracing::debug!(%dialect, "compose already available, nothing to install");
            return Ok(dialect);
        }

        if !runtime_present(channel).await {
            tracing::info!("container runtime missing, installing");
            self.run(channel, "runtime install", RUNTIME_INSTALL_COMMAND)
                .await?;

            // The runtime installer ships the compose plugin on most distros.
            let redetected = detect(channel).await;
            if redetected.is_resolved() {
                tracing::info!(dialect = %redetected, "compose available after runtime install");
                return Ok(redetected);
            }
        }

        let os = self.run(channel, "uname -s", "uname -s").await?;
        let os = os.trim();
        if os.is_empty() {
            return Err(InstallError::UnknownPlatform("operating system"));
        }
        let arch = self.run(channel, "uname -m", "uname -m").await?;
        let arch = arch.trim();
        if arch.is_empty() {
            return Err(InstallError::UnknownPlatform("architecture"));
        }

        let url = download_url(&self.options.compose_version, os, arch);
        let path = quote(&self.options.install_path);
        tracing::info!(%url, path = %self.options.install_path, "installing standalone compose");

        self.run(
            channel,
            "download",
            &self.privileged(&format!("curl -fsSL {} -o {}", quote(&url), path)),
        )
        .await?;
        self.run(channel, "chmod", &self.privileged(&format!("chmod +x {path}")))
            .await?;

        if detect_standalone(channel).await {
            Ok(Dialect::Standalone)
        } else {
            Err(InstallError::StillMissing(self.options.install_path.clone()))
        }
    }

    fn privileged(&self, command: &str) -> String {
        if self.options.sudo {
            format!("sudo {command}")
        } else {
            command.to_string()
        }
    }

    async fn run<C>(
        &self,
        channel: &C,
        step: &'static str,
        command: &str,
    ) -> Result<String, InstallError>
    where
        C: RemoteChannel + ?Sized,
    {
        let output = channel
            .execute(command)
            .await
            .map_err(|source| InstallError::Transport { step, source })?;

        if !output.success() {
            return Err(InstallError::CommandFailed {
                step,
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_lowercase_os() {
        assert_eq!(
            download_url("v2.24.5", "Linux\n", "x86_64\n"),
            "https://github.com/docker/compose/releases/download/v2.24.5/docker-compose-linux-x86_64"
        );
    }

    #[test]
    fn url_maps_arm_names_to_release_assets() {
        assert!(download_url("v2.24.5", "Darwin", "arm64").ends_with("docker-compose-darwin-aarch64"));
        assert!(download_url("v2.24.5", "Linux", "armv7l").ends_with("docker-compose-linux-armv7"));
        assert!(download_url("v2.24.5", "Linux", "aarch64").ends_with("docker-compose-linux-aarch64"));
    }

    #[test]
    fn sudo_prefix_is_opt_in() {
        let plain = Installer::default();
        assert_eq!(plain.privileged("chmod +x /x"), "chmod +x /x");

        let sudo = Installer::new(InstallOptions {
            sudo: true,
            ..Default::default()
        });
        assert_eq!(sudo.privileged("chmod +x /x"), "sudo chmod +x /x");
    }
}
