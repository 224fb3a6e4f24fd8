// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates hoist.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ServiceName;

use super::{CONFIG_FILENAME, Config, ServerAddress};

const DEFAULT_SERVICE: &str = "app";

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    host: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let service = ServiceName::new(service.unwrap_or(DEFAULT_SERVICE))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let mut config = Config::template(service);

    if let Some(h) = host {
        config.host = ServerAddress::parse(h).map_err(Error::InvalidConfig)?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    let mut host = String::new();
    if let Some(user) = &config.host.user {
        host.push_str(user);
        host.push('@');
    }
    host.push_str(&config.host.host);
    if let Some(port) = config.host.port {
        host.push_str(&format!(":{}", port));
    }

    format!(
        r#"service: {}
host: {}
remote_dir: {}
compose_file: {}
# key: ~/.ssh/id_ed25519
# SSH host key verification (default: false)
# Set to true to enable Trust-On-First-Use, or pre-populate ~/.ssh/known_hosts
# trust_first_connection: true
# files:
#   - local: .env
#     remote: .env
"#,
        config.service, host, config.remote_dir, config.compose_file
    )
}
