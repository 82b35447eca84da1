use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::locale::Locale;
use crate::search::{
    DEFAULT_MAX_DATES_TO_SUGGEST, DEFAULT_MAX_SUGGESTIONS, DEFAULT_SUGGESTIONS_PER_CRITERIA,
};
use crate::tree::{GroupDefinition, GroupingSpec, PartialSucceededTreatmentMode};

const FILE_STEM: &str = "buildlens";

/// Configuration file structure for `BuildLens`.
///
/// Every section and field is optional; anything missing takes its default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// How build trees are arranged
    #[serde(default)]
    pub tree: TreeConfig,

    /// Which status transitions are reported
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Search parsing and suggestions
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TreeConfig {
    /// Dimensions of the tree levels, outermost first
    #[serde(default = "default_grouping")]
    pub grouping: GroupingSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NotificationsConfig {
    /// How partially succeeded builds are reported
    #[serde(default)]
    pub partial_succeeded_treatment: PartialSucceededTreatmentMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Language of keywords and date formats
    #[serde(default)]
    pub locale: Locale,

    /// Upper bound of suggestions for text without a keyword
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Suggestions each criterion contributes to text without a keyword
    #[serde(default = "default_suggestions_per_criteria")]
    pub suggestions_per_criteria: usize,

    /// Observed dates offered by date criteria
    #[serde(default = "default_max_dates_to_suggest")]
    pub max_dates_to_suggest: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            grouping: default_grouping(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            max_suggestions: default_max_suggestions(),
            suggestions_per_criteria: default_suggestions_per_criteria(),
            max_dates_to_suggest: default_max_dates_to_suggest(),
        }
    }
}

fn default_grouping() -> GroupingSpec {
    GroupingSpec::new([
        GroupDefinition::Source,
        GroupDefinition::Branch,
        GroupDefinition::BuildDefinition,
    ])
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

fn default_suggestions_per_criteria() -> usize {
    DEFAULT_SUGGESTIONS_PER_CRITERIA
}

fn default_max_dates_to_suggest() -> usize {
    DEFAULT_MAX_DATES_TO_SUGGEST
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./buildlens.toml, ./buildlens.json, ./buildlens.yaml, ./buildlens.yml
    /// 3. `buildlens/buildlens.toml` in the platform config directory
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(Self::default());
            }
            return Self::load_from_path(path);
        }

        let candidates = ["toml", "json", "yaml", "yml"]
            .iter()
            .map(|ext| PathBuf::from(format!("{FILE_STEM}.{ext}")))
            .chain(user_config_path());

        for candidate in candidates {
            if candidate.exists() {
                return Self::load_from_path(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(FILE_STEM).join(format!("{FILE_STEM}.toml")))
}
