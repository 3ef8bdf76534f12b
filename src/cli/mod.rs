//! Command-line interface parsing and handling
//!
//! This module parses arguments, resolves settings from flags, environment
//! and the config file, and dispatches to the interactive UI or one of the
//! one-shot commands.

pub mod model_list;
pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::core::config::{Config, ConfigKey};
use crate::core::constants::{
    API_KEY_ENV, API_KEY_FALLBACK_ENV, BASE_URL_ENV, DEFAULT_BASE_URL,
};
use crate::core::gemini::{api_key_from_env, GeminiAdapter};
use crate::core::models::ModelId;
use crate::core::store::MessageStore;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_tracing, LogTarget};
use crate::utils::url::validate_base_url;

#[derive(Parser, Debug)]
#[command(name = "gemchat", version)]
#[command(about = "A full-screen terminal chat client for Google's Gemini models")]
#[command(
    long_about = "gemchat is a full-screen terminal chat interface that streams replies \
from Google's Gemini models as they are generated.\n\n\
Environment Variables:\n\
  GEMINI_API_KEY    Your Gemini API key (API_KEY is accepted as a fallback)\n\
  GEMINI_BASE_URL   Custom API base URL (optional)\n\
  GEMCHAT_LOG       Log filter directives (default: gemchat=info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Shift/Alt+Enter   Insert a newline\n\
  Ctrl+B            Toggle the sidebar\n\
  Tab               Move focus between input and sidebar\n\
  Ctrl+N            Start a new chat\n\
  PgUp/PgDn/Mouse   Scroll through the conversation\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use: flash, pro, or a full model id
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and stream the reply to stdout
    Say {
        /// Prompt text; multiple words are joined with spaces
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// List the available models
    Models,
    /// Set a configuration value, or show the configuration without arguments
    Set {
        /// Configuration key: default-model, base-url, or markdown
        key: Option<String>,
        /// Value for the key
        #[arg(trailing_var_arg = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

/// Effective settings after merging flags, environment, and config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub model: ModelId,
    pub base_url: String,
    pub markdown: bool,
}

/// Resolve settings. The model comes from the flag, then the config, then
/// the built-in default; the base URL from the environment, then the
/// config, then the built-in default.
pub fn resolve_settings(
    model_flag: Option<&str>,
    env_base_url: Option<String>,
    config: &Config,
) -> Result<Settings, String> {
    let model = match model_flag {
        Some(flag) => flag.parse()?,
        None => config.model_or_default(),
    };

    let base_url = match env_base_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => validate_base_url(&url).map_err(|err| format!("{BASE_URL_ENV}: {err}"))?,
        None => config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
    };

    Ok(Settings {
        model,
        base_url,
        markdown: config.markdown_enabled(),
    })
}

fn build_store(settings: &Settings) -> MessageStore {
    let adapter = GeminiAdapter::new(
        reqwest::Client::new(),
        Some(settings.base_url.clone()),
        api_key_from_env(),
    );
    MessageStore::new(Box::new(adapter), settings.model)
}

fn log_target(command: &Commands, log_file: Option<PathBuf>) -> LogTarget {
    match (command, log_file) {
        (_, Some(path)) => LogTarget::File(path),
        (Commands::Chat, None) => match Config::default_log_path() {
            Ok(path) => LogTarget::File(path),
            Err(_) => LogTarget::Stderr,
        },
        (_, None) => LogTarget::Stderr,
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    if let Err(err) = init_tracing(&log_target(&command, args.log_file)) {
        eprintln!("⚠️  Logging disabled: {err}");
    }

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    let settings = match resolve_settings(
        args.model.as_deref(),
        std::env::var(BASE_URL_ENV).ok(),
        &config,
    ) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    match command {
        Commands::Chat => {
            warn_if_key_missing();
            info!(model = %settings.model, base_url = %settings.base_url, "starting chat");
            let store = build_store(&settings);
            run_chat(store, settings.markdown).await
        }
        Commands::Say { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                eprintln!("Usage: gemchat say <prompt>");
                std::process::exit(1);
            }
            let store = build_store(&settings);
            run_say(store, &prompt, config.say_markdown()).await
        }
        Commands::Models => {
            list_models(settings.model, config.default_model);
            Ok(())
        }
        Commands::Set { key, value } => {
            let Some(key) = key else {
                config.print_all();
                return Ok(());
            };
            let key = parse_key_or_exit(&key);
            if value.is_empty() {
                eprintln!("Usage: gemchat set {key} <value>");
                std::process::exit(1);
            }
            match config.set(key, &value.join(" ")) {
                Ok(message) => {
                    let path = config.save()?;
                    println!("✅ {message} ({})", crate::core::config::path_display(path));
                    Ok(())
                }
                Err(err) => {
                    eprintln!("❌ {err}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Unset { key } => {
            let key = parse_key_or_exit(&key);
            config.unset(key);
            config.save()?;
            println!("✅ {key} unset");
            Ok(())
        }
    }
}

fn parse_key_or_exit(key: &str) -> ConfigKey {
    match key.parse() {
        Ok(key) => key,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }
}

fn warn_if_key_missing() {
    let has_key = [API_KEY_ENV, API_KEY_FALLBACK_ENV]
        .iter()
        .any(|name| std::env::var(name).is_ok_and(|value| !value.trim().is_empty()));
    if !has_key {
        warn!("no API key in {API_KEY_ENV} or {API_KEY_FALLBACK_ENV}");
        eprintln!(
            "⚠️  {API_KEY_ENV} is not set; replies will fail until you export it and restart."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv)
            .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
    }

    #[test]
    fn no_subcommand_means_chat() {
        let args = parse_args(&["gemchat"]);
        assert_eq!(args.command, None);
        assert_eq!(args.model, None);
    }

    #[test]
    fn say_collects_prompt_words_and_global_flags() {
        let args = parse_args(&["gemchat", "say", "-m", "pro", "what", "is", "-1?"]);
        assert_eq!(args.model.as_deref(), Some("pro"));
        assert_eq!(
            args.command,
            Some(Commands::Say {
                prompt: vec!["what".into(), "is".into(), "-1?".into()]
            })
        );
    }

    #[test]
    fn set_without_key_is_allowed() {
        let args = parse_args(&["gemchat", "set"]);
        assert_eq!(
            args.command,
            Some(Commands::Set {
                key: None,
                value: vec![]
            })
        );
    }

    #[test]
    fn log_file_flag_is_global() {
        let args = parse_args(&["gemchat", "models", "--log-file", "/tmp/g.log"]);
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/g.log")));
        assert_eq!(
            log_target(&Commands::Models, args.log_file),
            LogTarget::File(PathBuf::from("/tmp/g.log"))
        );
    }

    #[test]
    fn one_shot_commands_log_to_stderr_by_default() {
        assert_eq!(log_target(&Commands::Models, None), LogTarget::Stderr);
        assert_eq!(
            log_target(&Commands::Say { prompt: vec![] }, None),
            LogTarget::Stderr
        );
    }

    #[test]
    fn settings_default_to_flash_and_public_endpoint() {
        let settings = resolve_settings(None, None, &Config::default()).expect("settings");
        assert_eq!(
            settings,
            Settings {
                model: ModelId::Flash,
                base_url: DEFAULT_BASE_URL.to_string(),
                markdown: true,
            }
        );
    }

    #[test]
    fn model_flag_beats_config() {
        let config = Config {
            default_model: Some(ModelId::Flash),
            ..Default::default()
        };
        let settings = resolve_settings(Some("pro"), None, &config).expect("settings");
        assert_eq!(settings.model, ModelId::Pro);

        let settings = resolve_settings(None, None, &config).expect("settings");
        assert_eq!(settings.model, ModelId::Flash);
    }

    #[test]
    fn env_base_url_beats_config() {
        let config = Config {
            base_url: Some("http://from-config".to_string()),
            markdown: Some(false),
            ..Default::default()
        };

        let settings =
            resolve_settings(None, Some("http://from-env/".to_string()), &config).expect("settings");
        assert_eq!(settings.base_url, "http://from-env");
        assert!(!settings.markdown);

        let settings = resolve_settings(None, Some("  ".to_string()), &config).expect("settings");
        assert_eq!(settings.base_url, "http://from-config");
    }

    #[test]
    fn invalid_flag_or_env_is_reported() {
        assert!(resolve_settings(Some("gpt-4o"), None, &Config::default()).is_err());
        let err = resolve_settings(None, Some("nope".to_string()), &Config::default())
            .expect_err("bad url");
        assert!(err.starts_with(BASE_URL_ENV));
    }
}
