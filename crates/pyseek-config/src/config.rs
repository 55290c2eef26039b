use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV_VAR: &str = "PYSEEK_CONFIG";

/// Name of the pointer file stored next to the default config
const POINTER_FILE: &str = ".pyseek_config_path";

/// Keys accepted by `get` / `set`
pub const CONFIG_KEYS: &[&str] = &[
    "registry-file",
    "dedupe",
    "isolated-build",
    "dist-dir",
    "python",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// TOML registry dump scanned instead of the live registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry_file: Option<String>,
    /// Drop records that share an executable path with an earlier one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolated_build: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_dir: Option<String>,
    /// Interpreter used for package builds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
}

impl Config {
    /// Resolve the config file location.
    ///
    /// Order: `PYSEEK_CONFIG`, then a pointer file next to the default
    /// location, then the platform default.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let default = Self::default_path()?;

        if let Some(pointer) = Self::pointer_path_for(&default) {
            if let Ok(contents) = fs::read_to_string(&pointer) {
                let trimmed = contents.trim();
                if !trimmed.is_empty() {
                    return Ok(PathBuf::from(trimmed));
                }
            }
        }

        Ok(default)
    }

    /// Platform default config file path
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(".config");

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(base.join("pyseek").join("pyseek.toml"))
    }

    /// Location of the pointer file that redirects the config path
    pub fn pointer_path() -> Result<PathBuf, ConfigError> {
        let default = Self::default_path()?;
        Self::pointer_path_for(&default).ok_or(ConfigError::NoConfigDir)
    }

    fn pointer_path_for(default: &Path) -> Option<PathBuf> {
        default.parent().map(|parent| parent.join(POINTER_FILE))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "registry-file" => self.registry_file.clone(),
            "dedupe" => self.dedupe.map(|v| v.to_string()),
            "isolated-build" => self.isolated_build.map(|v| v.to_string()),
            "dist-dir" => self.dist_dir.clone(),
            "python" => self.python.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "registry-file" => self.registry_file = Some(value),
            "dedupe" => self.dedupe = Some(parse_bool(key, &value)?),
            "isolated-build" => self.isolated_build = Some(parse_bool(key, &value)?),
            "dist-dir" => self.dist_dir = Some(value),
            "python" => self.python = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values_iter().is_empty()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn dedupe(&self) -> bool {
        self.dedupe.unwrap_or(false)
    }

    /// Isolated (PEP 517) builds are the default
    pub fn isolated_build(&self) -> bool {
        self.isolated_build.unwrap_or(true)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.dist_dir
            .as_deref()
            .map_or_else(|| PathBuf::from("dist"), PathBuf::from)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}
