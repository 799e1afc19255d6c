use livemark_engine::{EditorOptions, EngineError, Keymap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
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

    #[error("Invalid keymap entry for key `{key}`: {source}")]
    KeymapError { key: String, source: EngineError },
}

/// Contents of `config.toml`. Every section is optional.
///
/// ```toml
/// [keymap]
/// b = "del"
/// g = "img"
///
/// [image]
/// src = "~/pictures/placeholder.png"
/// caption = "describe me"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key to action name, applied on top of the default keymap.
    pub keymap: BTreeMap<String, String>,
    pub image: ImageConfig,
}

/// Placeholder for freshly inserted images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub src: String,
    pub caption: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let options = EditorOptions::default();
        Self {
            src: options.image_src,
            caption: options.image_caption,
        }
    }
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

        // Local image paths may use `~` and environment variables; URLs are left alone
        if !config.image.src.contains("://")
            && let Some(expanded) = Self::expand_path(Path::new(&config.image.src))
        {
            config.image.src = expanded.to_string_lossy().into_owned();
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The file at `config_path`, or the defaults when there is none.
    pub fn load_or_default<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(config_path)?.unwrap_or_default())
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

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/livemark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// The default keymap with the `[keymap]` entries applied.
    pub fn keymap(&self) -> Result<Keymap, ConfigError> {
        let mut keymap = Keymap::default();
        for (key, name) in &self.keymap {
            let action = name.parse().map_err(|source| ConfigError::KeymapError {
                key: key.clone(),
                source,
            })?;
            keymap.bind(key.clone(), action);
        }
        Ok(keymap)
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            image_src: self.image.src.clone(),
            image_caption: self.image.caption.clone(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
