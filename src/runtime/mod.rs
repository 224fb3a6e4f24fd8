// ABOUTME: Container tooling on the remote host: dialect detection and provisioning.
// ABOUTME: Produces the Dialect consumed by the installer and the rollout sequencer.

mod detection;
mod dialect;
mod install;
pub(crate) mod sealed;

pub use detection::{detect, detect_standalone, runtime_present};
pub use dialect::{ComposeDialect, Dialect, PluginCompose, StandaloneCompose};
pub use install::{
    DEFAULT_COMPOSE_VERSION, DEFAULT_INSTALL_PATH, InstallError, InstallOptions, Installer,
    RUNTIME_INSTALL_COMMAND, download_url,
};
