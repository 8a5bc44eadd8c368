use hilite_engine::{HiliteOptions, Tag, TagRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auto_word_boundaries: bool,
    pub auto_tag: bool,
    pub overlap_tag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_tag: Option<String>,
    /// Where annotation sidecars are stored; next to each document when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations_dir: Option<PathBuf>,
    pub tags: Vec<Tag>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_word_boundaries: false,
            auto_tag: false,
            overlap_tag: false,
            default_tag: Some("note".to_string()),
            annotations_dir: None,
            tags: default_palette(),
        }
    }
}

fn default_palette() -> Vec<Tag> {
    vec![
        Tag::new("note", "#fff59d").with_name("Note"),
        Tag::new("person", "#ffd54f")
            .with_name("Person")
            .with_selected_color("#ffb300"),
        Tag::new("place", "#81d4fa")
            .with_name("Place")
            .with_selected_color("#0288d1"),
        Tag::new("idea", "#c5e1a5")
            .with_name("Idea")
            .with_style("font-style", "italic"),
    ]
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded annotations path
        config.annotations_dir = config
            .annotations_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/hilite");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Handle flags for [`hilite_engine::Hilite`].
    pub fn options(&self) -> HiliteOptions {
        HiliteOptions {
            auto_word_boundaries: self.auto_word_boundaries,
            auto_tag: self.auto_tag,
            overlap_tag: self.overlap_tag,
        }
    }

    pub fn registry(&self) -> TagRegistry {
        TagRegistry::new(self.tags.clone())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
