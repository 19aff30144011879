use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROXY_URL: &str = "http://localhost:3000";

const CONFIG_DIR_NAME: &str = "chess-notion";
const CONFIG_FILE_NAME: &str = "settings.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// User configuration handed explicitly to the normalizer and the proxy client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chess_com_username: String,
    pub lichess_username: String,
    pub notion_database_id: String,
    pub proxy_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chess_com_username: String::new(),
            lichess_username: String::new(),
            notion_database_id: String::new(),
            proxy_base_url: DEFAULT_PROXY_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, SettingsError> {
        toml::from_str(raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads settings from `explicit` (which must exist) or from the default
    /// location (which may be absent), then applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match explicit {
            Some(path) => Self::read_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                _ => Self::default(),
            },
        };
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    fn read_file(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let slots: [(&str, &mut String); 4] = [
            ("CHESS_NOTION_CHESSCOM_USERNAME", &mut self.chess_com_username),
            ("CHESS_NOTION_LICHESS_USERNAME", &mut self.lichess_username),
            ("CHESS_NOTION_DATABASE_ID", &mut self.notion_database_id),
            ("CHESS_NOTION_PROXY_URL", &mut self.proxy_base_url),
        ];

        for (key, slot) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *slot = value;
            }
        }
    }

    /// Database id, or `None` when it has not been configured.
    pub fn database_id(&self) -> Option<&str> {
        let id = self.notion_database_id.trim();
        (!id.is_empty()).then_some(id)
    }
}
