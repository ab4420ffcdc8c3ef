//! The `~/.ttscli.toml` config file and credential lookup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendSettings;
use crate::cli::Provider;

/// Config file name inside the home directory.
pub const CONFIG_FILE_NAME: &str = ".ttscli.toml";

/// Environment variable for the MiniMax group id.
pub const MINIMAX_GROUP_ID_ENV: &str = "MINIMAX_GROUP_ID";

/// Errors that can occur when loading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Per-provider section, e.g. `[elevenlabs]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub group_id: Option<String>,
    pub model: Option<String>,
    pub default_voice: Option<String>,
    pub default_voice_id: Option<String>,
    pub male_voice: Option<String>,
    pub female_voice: Option<String>,
}

/// Contents of the config file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub elevenlabs: ProviderConfig,
    pub gemini: ProviderConfig,
    pub minimax: ProviderConfig,
    /// Speaker label to voice.
    pub speakers: HashMap<String, String>,
}

impl Config {
    /// Default config location: `~/.ttscli.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// Load config from `path` (or the default location).
    ///
    /// A missing file yields the empty config.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            log::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        log::debug!("Loaded config from {}", path.display());
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Section for one provider.
    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::ElevenLabs => &self.elevenlabs,
            Provider::Gemini => &self.gemini,
            Provider::MiniMax => &self.minimax,
        }
    }

    /// API key: CLI value, then environment, then config file.
    pub fn api_key(&self, provider: Provider, cli: Option<&str>) -> Option<String> {
        self.api_key_with(provider, cli, env_var)
    }

    /// [`Config::api_key`] with an explicit environment lookup.
    pub fn api_key_with(
        &self,
        provider: Provider,
        cli: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        first_non_empty([
            cli.map(str::to_string),
            env(provider.env_key()),
            self.provider(provider).api_key.clone(),
        ])
    }

    /// MiniMax group id: CLI value, then `MINIMAX_GROUP_ID`, then config file.
    pub fn group_id(&self, cli: Option<&str>) -> Option<String> {
        self.group_id_with(cli, env_var)
    }

    pub fn group_id_with(
        &self,
        cli: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        first_non_empty([
            cli.map(str::to_string),
            env(MINIMAX_GROUP_ID_ENV),
            self.minimax.group_id.clone(),
        ])
    }

    /// Configured default voice, `default_voice` winning over `default_voice_id`.
    pub fn default_voice(&self, provider: Provider) -> Option<String> {
        let section = self.provider(provider);
        first_non_empty([
            section.default_voice.clone(),
            section.default_voice_id.clone(),
        ])
    }

    /// Configured `<gender>_voice` for a provider.
    pub fn gender_voice(&self, provider: Provider, gender: &str) -> Option<String> {
        let section = self.provider(provider);
        let voice = if gender.eq_ignore_ascii_case("male") {
            &section.male_voice
        } else if gender.eq_ignore_ascii_case("female") {
            &section.female_voice
        } else {
            return None;
        };
        voice.clone().filter(|v| !v.is_empty())
    }

    /// Speaker map from the file with `overrides` layered on top.
    pub fn speaker_voices(&self, overrides: HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = self.speakers.clone();
        merged.extend(overrides);
        merged
    }

    /// Settings for constructing a backend.
    pub fn backend_settings(
        &self,
        provider: Provider,
        api_key: Option<&str>,
        group_id: Option<&str>,
    ) -> BackendSettings {
        BackendSettings {
            api_key: self.api_key(provider, api_key),
            model: self.provider(provider).model.clone(),
            group_id: self.group_id(group_id),
            stability: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().find(|value| !value.is_empty())
}
