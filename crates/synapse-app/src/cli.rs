use std::path::PathBuf;

use clap::Parser;
use synapse_config::{ProviderKind, ProviderOverrides};

/// Synapse - a terminal chat agent with web search and code execution tools.
#[derive(Parser, Debug)]
#[command(name = "synapse", version, about)]
pub struct Args {
    /// Send one message, print the reply and exit.
    #[arg(short = 'e', long)]
    pub execute: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (e.g. debug, or a full filter like synapse_ai=trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Provider override (openai or aipipe).
    #[arg(long)]
    pub provider: Option<ProviderKind>,

    /// Model override.
    #[arg(long)]
    pub model: Option<String>,
}

impl Args {
    /// Provider fields set on the command line.
    pub fn overrides(&self) -> ProviderOverrides {
        ProviderOverrides {
            provider: self.provider,
            model: self.model.clone(),
            ..ProviderOverrides::default()
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
