use crate::merge::DedupPolicy;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Index image that stands for "no index": composing against it builds a
/// minimal catalog instead of merging.
pub const DEFAULT_INDEX_IMAGE: &str = "quay.io/operator-framework/opm:latest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
    pub default_index_image: String,
    /// Parent directory of the `<name>-index` catalog directory.
    pub work_dir: PathBuf,
    pub dedup_policy: DedupPolicy,
    /// Render index and bundle on two scoped threads when merging.
    pub parallel_render: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            default_index_image: DEFAULT_INDEX_IMAGE.to_owned(),
            work_dir: PathBuf::from("/tmp"),
            dedup_policy: DedupPolicy::default(),
            parallel_render: false,
        }
    }
}

impl ComposerConfig {
    /// Load `~/.config/bundlecat/config.toml`, or defaults when it is absent.
    pub fn load_default() -> Result<Self, CoreError> {
        let path = default_config_path()?;
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| CoreError::Config(format!("invalid config: {e}")))?;
        config.default_index_image = config.default_index_image.trim().to_owned();
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    pub fn is_default_index(&self, image: &str) -> bool {
        same_image(image, &self.default_index_image)
    }
}

/// Image references compare equal ignoring surrounding whitespace.
pub fn same_image(a: &str, b: &str) -> bool {
    a.trim() == b.trim()
}

fn default_config_path() -> Result<PathBuf, CoreError> {
    let home = std::env::var("HOME").map_err(|_| CoreError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/bundlecat/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ComposerConfig::parse("").unwrap();
        assert_eq!(config, ComposerConfig::default());
        assert_eq!(config.default_index_image, DEFAULT_INDEX_IMAGE);
        assert_eq!(config.work_dir, PathBuf::from("/tmp"));
        assert_eq!(config.dedup_policy, DedupPolicy::ExactMatch);
        assert!(!config.parallel_render);
    }

    #[test]
    fn parses_all_keys() {
        let config = ComposerConfig::parse(
            r#"
default_index_image = "registry.local/opm:v1"
work_dir = "/var/lib/bundlecat"
dedup_policy = "name"
parallel_render = true
"#,
        )
        .unwrap();
        assert_eq!(config.default_index_image, "registry.local/opm:v1");
        assert_eq!(config.work_dir, PathBuf::from("/var/lib/bundlecat"));
        assert_eq!(config.dedup_policy, DedupPolicy::NameMatch);
        assert!(config.parallel_render);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ComposerConfig::parse("retries = 3").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(ComposerConfig::parse(r#"dedup_policy = "fuzzy""#).is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ComposerConfig {
            parallel_render: true,
            dedup_policy: DedupPolicy::NameMatch,
            ..ComposerConfig::default()
        };
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(ComposerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ComposerConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn default_index_comparison_trims() {
        let config = ComposerConfig::default();
        assert!(config.is_default_index(" quay.io/operator-framework/opm:latest "));
        assert!(!config.is_default_index("quay.io/example/index:v1"));
    }

    #[test]
    fn padded_default_index_is_trimmed_on_load() {
        let config =
            ComposerConfig::parse(r#"default_index_image = "  registry.local/opm:v1 ""#).unwrap();
        assert_eq!(config.default_index_image, "registry.local/opm:v1");
        assert!(config.is_default_index("registry.local/opm:v1"));
    }

    #[test]
    fn padded_default_set_in_code_still_matches() {
        let config = ComposerConfig {
            default_index_image: " registry.local/opm:v1\n".to_owned(),
            ..ComposerConfig::default()
        };
        assert!(config.is_default_index("registry.local/opm:v1"));
        assert!(same_image(" a:1", "a:1 "));
        assert!(!same_image("a:1", "a:2"));
    }
}
