mod cli;
mod commands;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use synapse_ai::{Agent, OpenAiClient};
use synapse_config::{ProviderOverrides, ReloadManager, Settings, SynapseConfig};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::repl::Repl;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    // Load config before logging so its level can seed the filter.
    let loaded = match args.config {
        Some(ref path) => Settings::load(path.clone()),
        None => Settings::load_default(),
    };
    let (settings, load_error) = match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::in_memory(SynapseConfig::default()), Some(e)),
    };

    // Initialize logging
    let default_directive = format!("synapse={}", settings.config().logging.level.as_directive());
    let log_directive = args.log_level.as_deref().unwrap_or(&default_directive);
    let filter = EnvFilter::from_default_env();
    let filter = match log_directive.parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter.add_directive(LevelFilter::INFO.into()),
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    tracing::info!("Synapse v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    let overrides = ProviderOverrides::from_env().merge(args.overrides());
    let settings = Arc::new(settings.with_overrides(overrides));

    if let Some(path) = settings.path() {
        tracing::info!("Config loaded from {}", path.display());
        if let Err(e) = ReloadManager::spawn(settings.clone()) {
            tracing::warn!("Config hot-reload disabled: {e}");
        }
    }

    let provider = settings.provider();
    tracing::info!(
        provider = %provider.provider,
        model = %provider.resolved_model(),
        demo = !provider.has_api_key(),
        "Provider configured"
    );

    let agent = Arc::new(Agent::new(Arc::new(OpenAiClient::new()), settings));
    let repl = Repl::new(agent);

    if let Some(ref message) = args.execute {
        let mut out = std::io::stdout();
        return match repl.handle_line(message, &mut out).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("Output error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    println!(
        "Synapse v{} - {} / {}{}. Type /help for commands.",
        env!("CARGO_PKG_VERSION"),
        provider.provider,
        provider.resolved_model(),
        if provider.has_api_key() { "" } else { " (demo mode)" }
    );

    let result = repl.run().await;
    tracing::info!("Shutdown complete");
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("REPL error: {e}");
            ExitCode::FAILURE
        }
    }
}
