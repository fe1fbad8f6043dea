use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("failed to read terraform file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to scan config directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// `(resource type, resource name)` of a `resource` block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    pub resource_type: String,
    pub name: String,
}

pub type FieldMap = BTreeMap<String, String>;
pub type ResourceMap = BTreeMap<ResourceKey, FieldMap>;

static RESOURCE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"resource\s+"(\w+)"\s+"(\w+)"\s*\{"#).expect("resource header pattern")
});

/// Line-oriented scan of `resource "<type>" "<name>" { ... }` blocks and
/// their `field = value` assignments.
///
/// Intentionally shallow: nested blocks are not tracked, so a closing brace
/// inside a block ends the resource early. That is enough for change-shape
/// comparison; it is not an HCL parser.
pub fn parse_resources(content: &str) -> ResourceMap {
    let mut resources = ResourceMap::new();
    let mut current: Option<ResourceKey> = None;

    for line in content.lines() {
        if let Some(captures) = RESOURCE_HEADER.captures(line) {
            let key = ResourceKey {
                resource_type: captures[1].to_string(),
                name: captures[2].to_string(),
            };
            resources.insert(key.clone(), FieldMap::new());
            current = Some(key);
        } else if let Some(key) = &current {
            if let Some((field, value)) = line.split_once('=') {
                let field = field.trim().to_string();
                let value = value.trim().trim_end_matches(',').to_string();
                if let Some(fields) = resources.get_mut(key) {
                    fields.insert(field, value);
                }
            } else if line.trim() == "}" {
                current = None;
            }
        }
    }

    resources
}

/// All `.tf` files under `dir`, sorted by path for deterministic digests.
pub fn collect_config_files(dir: &Path) -> Result<Vec<PathBuf>, TerraformError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some("tf")
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Parse every `.tf` file under `dir` into one resource map.
pub fn load_directory(dir: &Path) -> Result<ResourceMap, TerraformError> {
    let mut resources = ResourceMap::new();
    for path in collect_config_files(dir)? {
        let content = std::fs::read_to_string(&path).map_err(|source| TerraformError::Read {
            path: path.clone(),
            source,
        })?;
        resources.extend(parse_resources(&content));
    }
    Ok(resources)
}

/// Short content digest of the configuration: sha256 over the per-file
/// digests of every `.tf` file (sorted by path), truncated to 8 hex chars.
pub fn config_digest(dir: &Path) -> Result<String, TerraformError> {
    let mut outer = Sha256::new();
    for path in collect_config_files(dir)? {
        let content = std::fs::read(&path).map_err(|source| TerraformError::Read {
            path: path.clone(),
            source,
        })?;
        // Paths are hashed relative to the config dir so the digest does not
        // depend on where the repository is checked out.
        let rel = path.strip_prefix(dir).unwrap_or(&path);
        let file_digest = Sha256::digest(&content);
        outer.update(format!("{:x}  {}\n", file_digest, rel.display()));
    }
    let digest = format!("{:x}", outer.finalize());
    Ok(digest[..8].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
resource "jamfpro_building" "hq" {
  name = "HQ"
  street_address = "1 Infinite Loop",
}

resource "jamfpro_api_integration" "gateway" {
  display_name = "gateway"
  enabled = true
}

variable "instance_name" {
  type = string
}
"#;

    fn key(resource_type: &str, name: &str) -> ResourceKey {
        ResourceKey {
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_parse_resources_finds_blocks() {
        let resources = parse_resources(SAMPLE);
        assert!(resources.contains_key(&key("jamfpro_building", "hq")));
        assert!(resources.contains_key(&key("jamfpro_api_integration", "gateway")));
    }

    #[test]
    fn test_parse_resources_skips_variable_blocks() {
        let resources = parse_resources(SAMPLE);
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn test_parse_resources_captures_fields() {
        let resources = parse_resources(SAMPLE);
        let fields = &resources[&key("jamfpro_building", "hq")];
        assert_eq!(fields["name"], "\"HQ\"");
        assert_eq!(fields["street_address"], "\"1 Infinite Loop\"");
        assert_eq!(resources[&key("jamfpro_api_integration", "gateway")]["enabled"], "true");
    }

    #[test]
    fn test_parse_resources_empty_input() {
        assert!(parse_resources("").is_empty());
    }

    #[test]
    fn test_parse_resources_block_without_fields() {
        let resources = parse_resources("resource \"jamfpro_site\" \"main\" {\n}\n");
        assert!(resources[&key("jamfpro_site", "main")].is_empty());
    }

    #[test]
    fn test_collect_config_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.tf"), "").unwrap();
        std::fs::write(dir.path().join("a.tf"), "").unwrap();
        std::fs::write(dir.path().join("readme.md"), "").unwrap();
        std::fs::create_dir(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join("modules").join("c.tf"), "").unwrap();

        let files = collect_config_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec!["a.tf", "b.tf", "modules/c.tf"]);
    }

    #[test]
    fn test_load_directory_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("buildings.tf"),
            "resource \"jamfpro_building\" \"hq\" {\n  name = \"HQ\"\n}\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("sites.tf"),
            "resource \"jamfpro_site\" \"main\" {\n  name = \"Main\"\n}\n",
        )
        .unwrap();

        let resources = load_directory(dir.path()).unwrap();
        assert_eq!(resources.len(), 2);
    }

    #[test]
    fn test_config_digest_is_stable_and_short() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "resource \"a\" \"b\" {}\n").unwrap();

        let first = config_digest(dir.path()).unwrap();
        let second = config_digest(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_config_digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.tf"), "resource \"a\" \"b\" {}\n").unwrap();
        let before = config_digest(dir.path()).unwrap();

        std::fs::write(dir.path().join("main.tf"), "resource \"a\" \"c\" {}\n").unwrap();
        let after = config_digest(dir.path()).unwrap();
        assert_ne!(before, after);
    }
}
