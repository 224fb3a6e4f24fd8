// ABOUTME: Config values that may come from the operator's environment.
// ABOUTME: Used for authentication material so key paths stay out of committed files.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// A literal value or a reference to an environment variable.
///
/// ```yaml
/// key: ~/.ssh/deploy_ed25519
/// key: { env: HOIST_SSH_KEY, default: ~/.ssh/id_ed25519 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }

    /// Resolve to a local path, expanding a leading `~/`.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        let value = self.resolve()?;
        match value.strip_prefix("~/") {
            Some(rest) => {
                let home = std::env::var("HOME")
                    .map_err(|_| Error::MissingEnvVar("HOME".to_string()))?;
                Ok(PathBuf::from(home).join(rest))
            }
            None => Ok(PathBuf::from(value)),
        }
    }
}
