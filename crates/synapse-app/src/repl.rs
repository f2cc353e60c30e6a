//! Line-oriented front-end over an [`Agent`].

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use synapse_ai::{Agent, TurnOutcome};
use synapse_common::SynapseError;
use synapse_config::validation::MAX_TOKENS_CEILING;
use synapse_config::{config_to_json, ProviderKind, Settings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::commands::{Command, Input, SettingKey, HELP};

/// File name used when exporting a chat whose title has no usable characters.
const FALLBACK_EXPORT_NAME: &str = "synapse_conversation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Repl {
    agent: Arc<Agent>,
}

impl Repl {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }

    /// Read stdin until EOF, `/quit` or Ctrl-C.
    pub async fn run(&self) -> io::Result<()> {
        let mut out = io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                writeln!(out)?;
                return Ok(());
            };

            if self.handle_line(&line, &mut out).await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Handle one line of input, writing any output to `out`.
    pub async fn handle_line<W: Write>(&self, line: &str, out: &mut W) -> io::Result<Flow> {
        match Input::parse(line) {
            Ok(Input::Message(text)) => {
                self.send(&text, out).await?;
                Ok(Flow::Continue)
            }
            Ok(Input::Command(command)) => {
                debug!(?command, "repl command");
                match self.run_command(command, out) {
                    Ok(flow) => Ok(flow),
                    Err(e) => {
                        writeln!(out, "error: {e}")?;
                        Ok(Flow::Continue)
                    }
                }
            }
            Err(usage) => {
                writeln!(out, "{usage}")?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn send<W: Write>(&self, text: &str, out: &mut W) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        writeln!(out, "  Thinking...")?;

        match self.agent.send(text).await {
            Ok(TurnOutcome::Completed(report)) => {
                for message in &report.messages {
                    writeln!(out, "assistant> {}", message.content)?;
                }
            }
            Ok(TurnOutcome::Busy) => writeln!(out, "(still working on the previous message)")?,
            Ok(TurnOutcome::EmptyInput) => {}
            Err(e) => writeln!(out, "error: {e}")?,
        }
        Ok(())
    }

    fn run_command<W: Write>(&self, command: Command, out: &mut W) -> Result<Flow, SynapseError> {
        let settings = self.agent.settings();
        match command {
            Command::New => {
                let id = self.agent.with_sessions(|store| store.create_session());
                writeln!(out, "Started chat {id}")?;
            }
            Command::List => self.list(out)?,
            Command::Switch(id) => {
                self.agent.with_sessions(|store| store.set_active(&id))?;
                writeln!(out, "Switched to {id}")?;
            }
            Command::Clear => {
                self.agent.with_sessions(|store| {
                    let id = store.active()?.id().clone();
                    store.clear_messages(&id)
                })?;
                writeln!(out, "Cleared chat")?;
            }
            Command::Title(title) => {
                self.agent.with_sessions(|store| {
                    let id = store.active()?.id().clone();
                    store.rename_session(&id, title.clone())
                })?;
                writeln!(out, "Renamed chat to \"{title}\"")?;
            }
            Command::Export(path) => {
                let (title, json) = self.agent.with_sessions(|store| {
                    let title = store.active()?.title().to_string();
                    Ok::<_, SynapseError>((title, store.export_active()?))
                })?;
                let path = path
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(export_file_name(&title)));
                std::fs::write(&path, json)?;
                writeln!(out, "Exported chat to {}", path.display())?;
            }
            Command::Settings => show_settings(settings, out)?,
            Command::Set { key, value } => match apply_setting(settings, key, &value) {
                Ok(note) => writeln!(out, "{note}")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Save => {
                settings.save()?;
                match settings.path() {
                    Some(path) => writeln!(out, "Saved settings to {}", path.display())?,
                    None => writeln!(out, "Settings are in memory only; nothing saved")?,
                }
            }
            Command::Reset => {
                settings.reset()?;
                writeln!(out, "Settings reset to defaults")?;
            }
            Command::Usage => self.usage(out)?,
            Command::Help => {
                for (usage, description) in HELP {
                    writeln!(out, "  {usage:<20} {description}")?;
                }
                writeln!(out, "Tools:")?;
                for tool in self.agent.tools().tools() {
                    let aliases = tool.aliases().join(", ");
                    if aliases.is_empty() {
                        writeln!(out, "  {:<20} {}", tool.name(), tool.description())?;
                    } else {
                        writeln!(
                            out,
                            "  {:<20} {} (also: {aliases})",
                            tool.name(),
                            tool.description()
                        )?;
                    }
                }
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn list<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let (active, sessions) = self
            .agent
            .with_sessions(|store| (store.active_id().cloned(), store.list_sessions()));
        for summary in sessions {
            let marker = if Some(&summary.id) == active.as_ref() {
                '*'
            } else {
                ' '
            };
            writeln!(
                out,
                "{marker} {}  {} ({} messages)\n    {}",
                summary.id, summary.title, summary.message_count, summary.preview
            )?;
        }
        Ok(())
    }

    fn usage<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let usage = self.agent.usage();
        let total = usage.total();
        writeln!(
            out,
            "{} calls, {} tokens ({} in / {} out)",
            usage.call_count(),
            usage.total_tokens(),
            total.input_tokens,
            total.output_tokens
        )?;
        for (provider, u) in usage.providers() {
            writeln!(out, "  {provider}: {} tokens", u.total_tokens())?;
        }
        let active = self.agent.with_sessions(|store| store.active_id().cloned());
        if let Some(u) = active.as_ref().and_then(|id| usage.for_session(id)) {
            writeln!(out, "  this chat: {} tokens", u.total_tokens())?;
        }
        Ok(())
    }
}

fn show_settings<W: Write>(settings: &Settings, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", config_to_json(&settings.config()))?;

    let effective = settings.provider();
    let key_state = if effective.has_api_key() {
        "set"
    } else {
        "not set (demo mode)"
    };
    writeln!(
        out,
        "effective: provider={} model={} max_tokens={} api_key {key_state}",
        effective.provider,
        effective.resolved_model(),
        effective.max_tokens
    )?;
    if !settings.overrides().is_empty() {
        writeln!(out, "(environment or command-line overrides are active)")?;
    }
    match settings.path() {
        Some(path) => writeln!(out, "config file: {}", path.display()),
        None => writeln!(out, "config file: none"),
    }
}

/// Apply `/set key value` to the live settings. Returns a confirmation.
fn apply_setting(settings: &Settings, key: SettingKey, value: &str) -> Result<String, String> {
    match key {
        SettingKey::Provider => {
            let kind: ProviderKind = value.parse()?;
            settings.update(|c| c.provider.provider = kind);
        }
        SettingKey::ApiKey => {
            let key = value.to_string();
            settings.update(|c| c.provider.api_key = key);
        }
        SettingKey::Model => {
            let model = Some(value.to_string()).filter(|m| !m.is_empty());
            settings.update(|c| c.provider.model = model);
        }
        SettingKey::MaxTokens => {
            let n: u32 = value
                .parse()
                .map_err(|e| format!("max_tokens must be a number: {e}"))?;
            if n == 0 || n > MAX_TOKENS_CEILING {
                return Err(format!("max_tokens must be between 1 and {MAX_TOKENS_CEILING}"));
            }
            settings.update(|c| c.provider.max_tokens = n);
        }
        SettingKey::BaseUrl => {
            let url = Some(value.to_string()).filter(|u| !u.is_empty());
            settings.update(|c| c.provider.base_url = url);
        }
    }

    let overrides = settings.overrides();
    let shadowed = match key {
        SettingKey::Provider => overrides.provider.is_some(),
        SettingKey::ApiKey => overrides.api_key.is_some(),
        SettingKey::Model => overrides.model.is_some(),
        SettingKey::MaxTokens => overrides.max_tokens.is_some(),
        SettingKey::BaseUrl => false,
    };
    if shadowed {
        warn!(key = key.as_str(), "setting is shadowed by an override");
        return Ok(format!(
            "{} updated, but an environment or command-line override still applies",
            key.as_str()
        ));
    }
    Ok(format!("{} updated (use /save to keep it)", key.as_str()))
}

/// `<title>.json` with characters unsafe in file names replaced.
fn export_file_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        format!("{FALLBACK_EXPORT_NAME}.json")
    } else {
        format!("{stem}.json")
    }
}
