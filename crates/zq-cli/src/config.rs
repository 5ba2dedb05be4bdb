//! CLI configuration file

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use zq_transform::TransformerConfig;

/// Settings read from `--config`
///
/// ```yaml
/// transformer:
///   strict_mode: false
///   project_key: PROJ
/// rules: rules.yaml
/// mappings: mappings.json
/// ```
///
/// Relative `rules` and `mappings` paths are taken relative to the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub transformer: TransformerConfig,
    /// Rule override file
    pub rules: Option<PathBuf>,
    /// Id mapping table for cross-reference lookups
    pub mappings: Option<PathBuf>,
}

impl CliConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: CliConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.rules = config.rules.map(|p| base.join(p));
        config.mappings = config.mappings.map(|p| base.join(p));
        Ok(config)
    }
}
