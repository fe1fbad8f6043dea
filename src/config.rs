use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::policy::SecurityPolicy;

/// Approval group used when neither the policy file nor the CLI names one.
pub const DEFAULT_APPROVAL_GROUP: &str = "Security";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read policy file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode policy file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no security resource types configured; pass --security-type or --policy")]
    EmptyRegistry,
}

/// On-disk policy document.
///
/// ```json
/// {
///   "security_resource_types": ["jamfpro_api_integration"],
///   "approval_group": "Security"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub security_resource_types: Vec<String>,
    #[serde(default)]
    pub approval_group: Option<String>,
}

impl PolicyFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Default policy location under the user's config dir
/// (`~/.config/plangate/policy.json` on Linux).
pub fn default_policy_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("plangate").join("policy.json"))
}

/// Build the effective policy from an optional policy file plus CLI inputs.
///
/// Types from the file and from repeated `--security-type` flags are merged.
/// The approval group resolves flag > file > default. An empty merged
/// registry is rejected: a scanner with nothing to match silently approves
/// everything.
pub fn resolve_policy(
    policy_path: Option<&Path>,
    extra_types: &[String],
    approval_group: Option<&str>,
) -> Result<SecurityPolicy, ConfigError> {
    let file = match policy_path {
        Some(path) => Some(PolicyFile::from_path(path)?),
        None => match default_policy_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using default policy file");
                Some(PolicyFile::from_path(&path)?)
            }
            _ => None,
        },
    };

    let mut types: Vec<String> = extra_types.to_vec();
    if let Some(file) = &file {
        types.extend(file.security_resource_types.iter().cloned());
    }
    if types.is_empty() {
        return Err(ConfigError::EmptyRegistry);
    }

    let label = approval_group
        .map(str::to_string)
        .or_else(|| file.and_then(|f| f.approval_group))
        .unwrap_or_else(|| DEFAULT_APPROVAL_GROUP.to_string());

    Ok(SecurityPolicy::new(types, label))
}
