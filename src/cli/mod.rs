//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;

use clap::{ArgAction, Parser, Subcommand};
use tracing::info;

use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::{format_config, set_value, unset_value, SettingError};
use crate::core::config::defaults::{KEYRING_SERVICE, KEYRING_USER};
use crate::core::config::{Config, Overrides, Settings, SystemSource};
use crate::core::credential::{Credential, CredentialSummary};
use crate::core::keyring::write_secret;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "streamchat")]
#[command(about = "Stream chat completions from DeepSeek or any OpenAI-compatible API")]
#[command(
    long_about = "streamchat sends a conversation to an OpenAI-compatible chat-completion \
endpoint and prints the reply as it streams in. Without a usable API key it answers \
from a built-in mock so the interface can still be exercised offline.\n\n\
Environment Variables:\n\
  DEEPSEEK_API_KEY         API key (sk-...)\n\
  DEEPSEEK_BASE_URL        API base URL (defaults to https://api.deepseek.com/v1)\n\
  STREAMCHAT_MODEL         Model id (defaults to deepseek-chat)\n\
  STREAMCHAT_TEMPERATURE   Sampling temperature, 0.0 to 2.0\n\
  STREAMCHAT_MOCK          Force mock mode (on/off)\n\
  STREAMCHAT_LOG           Log filter, e.g. streamchat=debug"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(short = 't', long, global = true, value_name = "TEMPERATURE")]
    pub temperature: Option<f32>,

    /// API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Answer from the built-in mock instead of the API
    #[arg(long, global = true)]
    pub mock: bool,

    /// System prompt to prepend to the conversation
    #[arg(long, global = true, value_name = "PROMPT")]
    pub system: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum Commands {
    /// Send a single prompt and stream the reply to stdout
    Say {
        /// Prompt text (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Start an interactive chat session (default)
    Chat,
    /// List available models
    Models,
    /// Show or change stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Clone, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Print the stored configuration and the resolved settings
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key to set
        key: String,
        /// Value to set (multiple words are joined with spaces)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Store the API key in the system keyring
    SetKey {
        /// API key (sk-...)
        key: String,
    },
    /// Print the configuration file location
    Path,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            mock_mode: self.mock,
            system_prompt: self.system.clone(),
            mock_interval_ms: None,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

fn resolve_settings(args: &Args) -> Result<Settings, Box<dyn Error>> {
    let config = Config::load()?;
    Ok(Settings::resolve(&config, &args.overrides(), &SystemSource)?)
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.clone().unwrap_or(Commands::Chat);

    match command {
        Commands::Say { prompt } => run_say(&resolve_settings(&args)?, prompt).await,
        Commands::Chat => run_chat(&resolve_settings(&args)?).await,
        Commands::Models => list_models(&resolve_settings(&args)?).await,
        Commands::Config { command } => {
            if let Err(err) = run_config(&args, command) {
                err.print();
                std::process::exit(err.exit_code());
            }
            Ok(())
        }
    }
}

fn run_config(args: &Args, command: ConfigCommands) -> Result<(), SettingError> {
    match command {
        ConfigCommands::Show => {
            let config = Config::load()?;
            match Config::get_config_path() {
                Some(path) => println!("📁 {}", path.display()),
                None => println!("📁 (no configuration directory on this platform)"),
            }
            println!();
            println!("Stored configuration:");
            for line in format_config(&config) {
                println!("{line}");
            }

            let settings = Settings::resolve(&config, &args.overrides(), &SystemSource)?;
            let credential = settings
                .credential
                .as_ref()
                .map(Credential::summary)
                .unwrap_or_else(CredentialSummary::none);
            println!();
            println!("Effective settings:");
            println!("  base-url: {}", settings.base_url);
            println!("  model: {}", settings.chat.model);
            println!("  temperature: {}", settings.chat.temperature);
            println!("  api-key: {credential}");
            println!(
                "  mock-mode: {}",
                if settings.mock_mode { "on" } else { "off" }
            );
            println!(
                "  system-prompt: {}",
                settings.system_prompt.as_deref().unwrap_or("(none)")
            );
            println!(
                "  mock-interval-ms: {}",
                settings.mock_interval.as_millis()
            );
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            let message = set_value(&mut config, &key, &value.join(" "))?;
            let path = config.save()?;
            info!(key = %key, path = %path.display(), "configuration updated");
            println!("{message}");
            Ok(())
        }
        ConfigCommands::Unset { key } => {
            let mut config = Config::load()?;
            let message = unset_value(&mut config, &key)?;
            config.save()?;
            println!("{message}");
            Ok(())
        }
        ConfigCommands::SetKey { key } => {
            let Some(credential) = Credential::from_configured(&key) else {
                return Err(SettingError::MissingArgs {
                    hint: "Specify the API key to store:",
                    example: "streamchat config set-key sk-...",
                });
            };
            write_secret(KEYRING_SERVICE, KEYRING_USER, credential.expose())
                .map_err(|err| SettingError::Keyring(err.to_string()))?;
            println!("✅ Stored API key {} in the system keyring", credential.summary());
            if !credential.is_usable() {
                println!("⚠️  This key does not look like a DeepSeek key (sk-...); requests may fall back to mock mode.");
            }
            Ok(())
        }
        ConfigCommands::Path => {
            match Config::get_config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("(no configuration directory on this platform)"),
            }
            Ok(())
        }
    }
}
