use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::models::ModelId;
use crate::utils::url::validate_base_url;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Model a new session starts with when `--model` is not given
    pub default_model: Option<ModelId>,
    /// Override for the Gemini REST base URL
    pub base_url: Option<String>,
    /// Render model replies as markdown in the chat area
    pub markdown: Option<bool>,
}

/// Keys accepted by `gemchat set` and `gemchat unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DefaultModel,
    BaseUrl,
    Markdown,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::DefaultModel,
        ConfigKey::BaseUrl,
        ConfigKey::Markdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::DefaultModel => "default-model",
            ConfigKey::BaseUrl => "base-url",
            ConfigKey::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown config key '{s}'. Known keys: {}", known.join(", "))
            })
    }
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("Expected on/off, got '{other}'")),
    }
}

impl Config {
    /// Parse `value` for `key` and store it. Returns a confirmation line.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<String, String> {
        match key {
            ConfigKey::DefaultModel => {
                let model: ModelId = value.parse()?;
                self.default_model = Some(model);
                Ok(format!("default-model set to {} ({})", model, model.label()))
            }
            ConfigKey::BaseUrl => {
                let url = validate_base_url(value)?;
                let message = format!("base-url set to {url}");
                self.base_url = Some(url);
                Ok(message)
            }
            ConfigKey::Markdown => {
                let enabled = parse_toggle(value)?;
                self.markdown = Some(enabled);
                Ok(format!("markdown {}", if enabled { "on" } else { "off" }))
            }
        }
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::DefaultModel => self.default_model = None,
            ConfigKey::BaseUrl => self.base_url = None,
            ConfigKey::Markdown => self.markdown = None,
        }
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    /// `say` streams plain text unless markdown was switched on explicitly.
    pub fn say_markdown(&self) -> bool {
        self.markdown == Some(true)
    }

    pub fn model_or_default(&self) -> ModelId {
        self.default_model.unwrap_or_default()
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
