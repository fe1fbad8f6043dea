use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::git::{self, GitError};
use crate::terraform::{self, ResourceMap, TerraformError};

#[derive(Debug, Error)]
pub enum VersionError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Terraform(#[from] TerraformError),
}

/// Which semver component a set of configuration changes warrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Increment {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Increment::Major => write!(f, "major"),
            Increment::Minor => write!(f, "minor"),
            Increment::Patch => write!(f, "patch"),
        }
    }
}

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v(\d+)\.(\d+)\.(\d+)").expect("tag pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SemVer {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemVer {
    /// Parse a `vX.Y.Z` tag, tolerating a trailing suffix such as the
    /// configuration digest this tool itself appends.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        let captures = TAG_PATTERN.captures(tag)?;
        Some(Self {
            major: captures[1].parse().ok()?,
            minor: captures[2].parse().ok()?,
            patch: captures[3].parse().ok()?,
        })
    }

    pub fn bump(self, increment: Increment) -> Self {
        match increment {
            Increment::Major => Self {
                major: self.major + 1,
                minor: 0,
                patch: 0,
            },
            Increment::Minor => Self {
                major: self.major,
                minor: self.minor + 1,
                patch: 0,
            },
            Increment::Patch => Self {
                major: self.major,
                minor: self.minor,
                patch: self.patch + 1,
            },
        }
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Compare the configuration at the last release against the working tree.
///
/// Rule order, most to least significant:
/// 1. a resource type not present at the baseline -> major
/// 2. a new instance of an existing type -> minor
/// 3. a changed field set on an existing instance -> minor
/// 4. a changed field value on an existing instance -> patch
/// 5. otherwise -> patch
pub fn determine_increment(baseline: &ResourceMap, current: &ResourceMap) -> Increment {
    let baseline_types: BTreeSet<&str> = baseline
        .keys()
        .map(|key| key.resource_type.as_str())
        .collect();

    if current
        .keys()
        .any(|key| !baseline_types.contains(key.resource_type.as_str()))
    {
        return Increment::Major;
    }

    if current.keys().any(|key| !baseline.contains_key(key)) {
        return Increment::Minor;
    }

    if current.iter().any(|(key, fields)| {
        baseline
            .get(key)
            .is_some_and(|base| !base.keys().eq(fields.keys()))
    }) {
        return Increment::Minor;
    }

    if current.iter().any(|(key, fields)| {
        baseline.get(key).is_some_and(|base| {
            fields
                .iter()
                .any(|(field, value)| base.get(field).is_some_and(|base_value| base_value != value))
        })
    }) {
        return Increment::Patch;
    }

    Increment::Patch
}

/// Outcome of a version determination run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    /// Tag the comparison ran against, if any existed.
    pub previous_tag: Option<String>,
    pub increment: Increment,
    /// Next version, digest suffix included.
    pub version: String,
}

fn baseline_resources(
    repo: &Path,
    tag: &str,
    config_dir: &Path,
) -> Result<ResourceMap, VersionError> {
    let mut resources = ResourceMap::new();
    for file in git::files_at_rev(repo, tag, config_dir)? {
        if !file.ends_with(".tf") {
            continue;
        }
        if let Some(content) = git::show_file(repo, tag, &file)? {
            resources.extend(terraform::parse_resources(&content));
        }
    }
    Ok(resources)
}

/// Derive the next release version for the Terraform configuration under
/// `config_dir` (a path relative to the repository root).
///
/// The baseline is the configuration as of the most recent `v*` tag; with no
/// tag yet, the baseline is empty and the bump starts from v0.0.0.
pub fn next_version(repo: &Path, config_dir: &Path) -> Result<VersionBump, VersionError> {
    git::ensure_repository(repo)?;

    let tag = git::latest_tag(repo)?;
    let baseline = match &tag {
        Some(tag) => baseline_resources(repo, tag, config_dir)?,
        None => ResourceMap::new(),
    };

    let working_dir = repo.join(config_dir);
    let current = terraform::load_directory(&working_dir)?;

    let increment = determine_increment(&baseline, &current);
    let base = tag
        .as_deref()
        .and_then(SemVer::parse_tag)
        .unwrap_or_default();
    let digest = terraform::config_digest(&working_dir)?;

    tracing::info!(
        previous = tag.as_deref().unwrap_or("none"),
        increment = %increment,
        "version increment determined"
    );

    Ok(VersionBump {
        previous_tag: tag,
        increment,
        version: format!("{}-{}", base.bump(increment), digest),
    })
}
