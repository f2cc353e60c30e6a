//! Slash-command parsing for the REPL.

use synapse_common::SessionId;

/// A line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text, sent to the agent as a user message.
    Message(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    List,
    Switch(SessionId),
    Clear,
    Title(String),
    Export(Option<String>),
    Settings,
    Set { key: SettingKey, value: String },
    Save,
    Reset,
    Usage,
    Help,
    Quit,
}

/// Settings editable with `/set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Provider,
    ApiKey,
    Model,
    MaxTokens,
    BaseUrl,
}

impl SettingKey {
    pub const ALL: [SettingKey; 5] = [
        SettingKey::Provider,
        SettingKey::ApiKey,
        SettingKey::Model,
        SettingKey::MaxTokens,
        SettingKey::BaseUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Provider => "provider",
            SettingKey::ApiKey => "api_key",
            SettingKey::Model => "model",
            SettingKey::MaxTokens => "max_tokens",
            SettingKey::BaseUrl => "base_url",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// `(usage, description)` for `/help`.
pub const HELP: &[(&str, &str)] = &[
    ("/new", "start a new chat"),
    ("/list", "list chats, newest first"),
    ("/switch <id>", "make another chat active"),
    ("/clear", "delete the active chat's messages"),
    ("/title <text>", "rename the active chat"),
    ("/export [path]", "write the active chat as JSON"),
    ("/settings", "show the current settings"),
    ("/set <key> <value>", "change a setting (provider, api_key, model, max_tokens, base_url)"),
    ("/save", "write settings to the config file"),
    ("/reset", "restore default settings"),
    ("/usage", "show token usage"),
    ("/help", "show this help"),
    ("/quit", "exit"),
];

impl Input {
    /// Parse one line. Lines not starting with `/` are messages.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Input::Message(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "new" => Command::New,
            "list" | "ls" => Command::List,
            "switch" => {
                if arg.is_empty() {
                    return Err("usage: /switch <id>".into());
                }
                Command::Switch(SessionId::from(arg))
            }
            "clear" => Command::Clear,
            "title" => {
                if arg.is_empty() {
                    return Err("usage: /title <text>".into());
                }
                Command::Title(arg.to_string())
            }
            "export" => Command::Export(Some(arg.to_string()).filter(|p| !p.is_empty())),
            "settings" => Command::Settings,
            "set" => {
                let (key, value) = arg.split_once(char::is_whitespace).unwrap_or((arg, ""));
                let key = SettingKey::parse(&key.to_ascii_lowercase()).ok_or_else(|| {
                    format!(
                        "usage: /set <key> <value> where key is one of: {}",
                        SettingKey::ALL.map(SettingKey::as_str).join(", ")
                    )
                })?;
                Command::Set {
                    key,
                    value: value.trim().to_string(),
                }
            }
            "save" => Command::Save,
            "reset" => Command::Reset,
            "usage" => Command::Usage,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unknown command /{other} (try /help)")),
        };
        Ok(Input::Command(command))
    }
}
