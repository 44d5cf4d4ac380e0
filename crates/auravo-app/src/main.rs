//! Auravo application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Install the tracing subscriber (stderr)
//! 3. Build the model gateway for the selected provider
//! 4. Run the requested command: the chat REPL, a profile update, the
//!    contact form, or the starter prompt listing

mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use auravo_account::{
    submit_contact_form, ContactForm, LocalAuthProvider, LocalMediaStore, ProfileForm,
    ProfileService,
};
use auravo_chat::ConversationController;
use auravo_core::config::GatewayProvider;
use auravo_core::AuravoConfig;
use auravo_gateway::{GatewayError, GeminiGateway, MockGateway, ModelGateway};
use auravo_storage::{ConversationStore, JsonFileRepository};

use cli::{CliArgs, Command};

fn build_gateway(
    config: &AuravoConfig,
    provider: GatewayProvider,
) -> Result<Arc<dyn ModelGateway>, GatewayError> {
    match provider {
        GatewayProvider::Gemini => Ok(Arc::new(GeminiGateway::from_config(&config.gateway)?)),
        GatewayProvider::Mock => {
            tracing::info!("Using the offline mock gateway");
            Ok(Arc::new(MockGateway::new()))
        }
    }
}

async fn run_chat(
    config: &AuravoConfig,
    args: &CliArgs,
    data_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = build_gateway(config, args.resolve_provider(config))?;
    let repository = JsonFileRepository::new(data_dir);
    tracing::info!(path = %repository.path().display(), "Opening chat history");
    let store = ConversationStore::open(Box::new(repository))?;
    let controller = ConversationController::new(gateway, store);

    repl::Repl::new(
        controller,
        config.chat.clone(),
        config.voice.clone(),
        data_dir,
    )
    .run()
    .await
}

async fn run_profile(
    config: &AuravoConfig,
    data_dir: &Path,
    name: String,
    avatar: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let auth = Arc::new(LocalAuthProvider::new(data_dir));
    auth.seed(&config.account).await?;
    let service = ProfileService::new(auth, Arc::new(LocalMediaStore::new(data_dir)));

    let avatar = match avatar {
        Some(path) => Some(tokio::fs::read(&path).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "Failed to read avatar");
            e
        })?),
        None => None,
    };

    let profile = service
        .update_user_profile(ProfileForm { name, avatar })
        .await?;
    println!("Your profile has been updated.");
    println!("  name:  {}", profile.display_name);
    println!("  email: {}", profile.email);
    if let Some(url) = profile.photo_url {
        println!("  photo: {}", url);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        AuravoConfig::load_or_default(&config_file)
    } else {
        AuravoConfig::default()
    };

    // Tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.resolve_log_level(&config)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Auravo v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        exists = config_file.exists(),
        "Configuration resolved"
    );

    // Data directory.
    let data_dir = args.resolve_data_dir(&config);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    match args.command() {
        Command::Chat => run_chat(&config, &args, &data_dir).await?,
        Command::Profile { name, avatar } => run_profile(&config, &data_dir, name, avatar).await?,
        Command::Contact {
            name,
            email,
            message,
        } => {
            let receipt = submit_contact_form(&ContactForm {
                name,
                email,
                message,
            })?;
            println!("{}", receipt.message);
        }
        Command::Prompts => {
            for prompt in auravo_gateway::suggested_prompts(config.chat.suggested_prompt_count) {
                println!("{}", prompt);
            }
        }
    }

    Ok(())
}
