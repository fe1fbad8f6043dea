use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("failed to read plan file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode plan JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Subset of the Terraform plan representation (`terraform show -json`).
///
/// Only `resource_changes` drives the security scan; the remaining fields are
/// modeled so callers can inspect plan metadata without re-parsing. Unknown
/// fields in the source document are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub terraform_version: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
    #[serde(default)]
    pub planned_values: Option<PlannedValues>,
    pub resource_changes: Vec<ResourceChange>,
    #[serde(default)]
    pub configuration: Option<Configuration>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub errored: bool,
}

impl Plan {
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let bytes = std::fs::read(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, PlanError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_str(content: &str) -> Result<Self, PlanError> {
        Self::from_slice(content.as_bytes())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannedValues {
    #[serde(default)]
    pub root_module: RootModule,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootModule {
    #[serde(default)]
    pub resources: Vec<PlannedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlannedResource {
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

/// One proposed mutation to one resource instance.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "provider_name")]
    pub provider: Option<String>,
    pub change: Change,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    pub actions: Vec<Action>,
    #[serde(default)]
    pub before: serde_json::Value,
    #[serde(default)]
    pub after: serde_json::Value,
    #[serde(default)]
    pub after_unknown: serde_json::Value,
    #[serde(default)]
    pub before_sensitive: serde_json::Value,
    #[serde(default)]
    pub after_sensitive: serde_json::Value,
}

/// Lifecycle action proposed for a resource instance.
///
/// A Terraform "replace" shows up as `["delete", "create"]` (or the reverse)
/// on a single change. Action kinds introduced by future Terraform releases
/// deserialize into `Other` instead of failing the whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Read,
    NoOp,
    #[serde(untagged)]
    Other(String),
}

impl Action {
    /// True for the action kinds that mutate real infrastructure.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Action::Create | Action::Update | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Read => write!(f, "read"),
            Action::NoOp => write!(f, "no-op"),
            Action::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// Provider and module metadata from the plan's `configuration` block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub provider_config: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub root_module: serde_json::Value,
}
