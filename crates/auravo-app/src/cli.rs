//! CLI argument definitions for the Auravo application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use auravo_core::config::{expand_home, GatewayProvider};
use auravo_core::AuravoConfig;

/// Auravo - chat with a hosted model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "auravo", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Directory for chat history, profile and media.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Model backend.
    #[arg(long = "provider", value_enum)]
    pub provider: Option<ProviderArg>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (default).
    Chat,
    /// Update the signed-in user's profile.
    Profile {
        #[arg(long)]
        name: String,
        /// Image file to use as the new avatar.
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    /// Send a message through the contact form.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Print the starter prompts.
    Prompts,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderArg {
    Gemini,
    Mock,
}

impl From<ProviderArg> for GatewayProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => GatewayProvider::Gemini,
            ProviderArg::Mock => GatewayProvider::Mock,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > AURAVO_CONFIG env var > ~/.auravo/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("AURAVO_CONFIG") {
            if !p.trim().is_empty() {
                return PathBuf::from(p);
            }
        }
        expand_home("~/.auravo/config.toml")
    }

    /// Priority: --data-dir flag > config file value.
    pub fn resolve_data_dir(&self, config: &AuravoConfig) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => config.general.resolved_data_dir(),
        }
    }

    /// Priority: --log-level flag > config file value > info.
    pub fn resolve_log_level(&self, config: &AuravoConfig) -> String {
        self.log_level
            .clone()
            .or_else(|| Some(config.general.log_level.clone()).filter(|l| !l.trim().is_empty()))
            .unwrap_or_else(|| "info".to_string())
    }

    /// Priority: --provider flag > config file value.
    pub fn resolve_provider(&self, config: &AuravoConfig) -> GatewayProvider {
        self.provider
            .map(GatewayProvider::from)
            .unwrap_or(config.gateway.provider)
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}
