//! Configuration loading for HiveMind.
//!
//! The YAML file is read once at startup. String values of the form
//! `os.environ/VAR` (or `env:VAR`) are replaced with the environment
//! variable before the file is mapped onto [`Settings`].

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::protocol::AgentIdentity;
use crate::store::DEFAULT_LOG_FILE;

pub type Result<T> = std::result::Result<T, Error>;

/// Environment variable pointing at the config file.
pub const CONFIG_ENV: &str = "HIVEMIND_CONFIG";

/// Environment variable overriding the repository / storage root.
pub const ROOT_ENV: &str = "HIVEMIND_ROOT";

/// Placeholder prefixes resolved against the environment.
const ENV_PREFIXES: [&str; 2] = ["os.environ/", "env:"];

/// Candidate config locations, relative to the working directory.
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["hivemind.yaml", "agents/config.yaml"];

/// Appended to every persona so replies fit the log format.
pub const PROTOCOL_HINT: &str = "You are communicating via a shared meeting log. \
Do not prefix your reply with your name, that is handled by the system. \
If the last message was from you, or if there is nothing relevant to add, reply with \"[NO REPLY]\" to skip.";

/// Replace `os.environ/VAR` / `env:VAR` strings anywhere in `value`.
///
/// Unset variables become null, which deserializes as an absent option.
pub fn resolve_placeholders<F>(value: Value, lookup: &F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        Value::String(s) => {
            let var = ENV_PREFIXES
                .iter()
                .find_map(|prefix| s.strip_prefix(prefix));
            match var {
                Some(var) => lookup(var).map(Value::String).unwrap_or(Value::Null),
                None => Value::String(s),
            }
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| resolve_placeholders(item, lookup))
                .collect(),
        ),
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| (k, resolve_placeholders(v, lookup)))
                .collect(),
        ),
        other => other,
    }
}

/// Locate the config file: explicit path, `HIVEMIND_CONFIG`, then the
/// default locations in the working directory.
pub fn discover_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found at {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at missing file {}", CONFIG_ENV, path.display());
    }

    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            Error::Config(format!(
                "No config file found (tried --config, {}, {})",
                CONFIG_ENV,
                DEFAULT_CONFIG_PATHS.join(", ")
            ))
        })
}

/// Directory relative paths in a config file resolve against. A bare file
/// name has an empty parent, which is not a usable working directory.
fn config_base_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load, resolve and validate settings.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let path = discover_config(explicit)?;
    let content = std::fs::read_to_string(&path)?;
    let base_dir = config_base_dir(&path);

    let lookup = |var: &str| std::env::var(var).ok();
    let settings = Settings::from_yaml_str(&content, base_dir, &lookup)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Which backend answers for an agent.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    #[default]
    OpenAi,
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderKind::OpenAi | ProviderKind::Gemini)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

/// Agent configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AgentConfig {
    /// Display name used in the log. Defaults to the agent id.
    pub name: Option<String>,
    #[serde(default)]
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub persona: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Communication configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Communication {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Default for Communication {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
        }
    }
}

/// Sync configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_git_binary")]
    pub git_binary: String,
}

fn default_true() -> bool {
    true
}

fn default_git_binary() -> String {
    "git".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            git_binary: default_git_binary(),
        }
    }
}

/// What to do with a provider failure.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponderErrorPolicy {
    /// Publish the error text as the agent's reply.
    #[default]
    Publish,
    /// Log the error and leave the log untouched.
    Discard,
}

/// What to do when the remote rejects a push.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PushRejectedPolicy {
    /// Give up; the cycle fails.
    #[default]
    Fail,
    /// Pull with rebase once and push again.
    RebaseRetry,
}

/// Cycle policies.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Policy {
    #[serde(default)]
    pub responder_errors: ResponderErrorPolicy,
    #[serde(default)]
    pub push_rejected: PushRejectedPolicy,
}

/// Tool server configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3333
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// HiveMind settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    /// Repository root, relative to the config file's directory.
    pub root: Option<PathBuf>,

    #[serde(default)]
    pub communication: Communication,

    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub policy: Policy,

    #[serde(default)]
    pub server: ServerConfig,

    /// Directory the config was loaded from.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Settings {
    /// Parse settings from YAML text, resolving placeholders with `lookup`.
    pub fn from_yaml_str<F>(content: &str, base_dir: PathBuf, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: Value = serde_yaml::from_str(content)?;
        let resolved = match raw {
            Value::Null => Value::Mapping(Default::default()),
            other => resolve_placeholders(other, lookup),
        };

        let mut settings: Settings = serde_yaml::from_value(resolved)?;
        settings.base_dir = base_dir;
        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Repository root holding the log and the mailbox directories.
    pub fn root_dir(&self) -> PathBuf {
        if let Ok(root) = std::env::var(ROOT_ENV) {
            return PathBuf::from(root);
        }
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => self.base_dir.join(root),
            None => self.base_dir.clone(),
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.root_dir().join(&self.communication.log_file)
    }

    pub fn agent(&self, id: &str) -> Result<&AgentConfig> {
        self.agents
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("Agent '{}' not in config", id)))
    }

    pub fn identity(&self, id: &str) -> Result<AgentIdentity> {
        let agent = self.agent(id)?;
        Ok(AgentIdentity::new(id, display_name(id, agent)))
    }

    /// Agent ids in a stable order.
    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Persona instruction for an agent, with the log protocol hint appended.
    pub fn persona(&self, id: &str) -> Result<String> {
        let agent = self.agent(id)?;
        let name = display_name(id, agent);
        let persona = agent.persona.clone().unwrap_or_else(|| {
            format!(
                "You are {}, a helpful AI assistant. You are participating in a team meeting.",
                name
            )
        });
        Ok(format!("{}\n\n{}", persona.trim(), PROTOCOL_HINT))
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }
}

fn display_name(id: &str, agent: &AgentConfig) -> String {
    agent
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(id)
        .to_string()
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.agents.is_empty() {
        return Err(Error::Config("no agents configured".to_string()));
    }

    let mut seen: HashMap<String, &str> = HashMap::new();
    for (id, agent) in &settings.agents {
        let name = display_name(id, agent);
        if name.contains('*') || name.contains('\n') {
            return Err(Error::Config(format!(
                "agent '{}' display name '{}' must not contain '*' or newlines",
                id, name
            )));
        }
        if let Some(other) = seen.insert(name.clone(), id) {
            return Err(Error::Config(format!(
                "agents '{}' and '{}' share the display name '{}'",
                other, id, name
            )));
        }
        // only the agent that acts needs its key; see `create_responder`
        if agent.provider.requires_api_key()
            && agent.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            tracing::warn!(
                "agent '{}' ({} provider) has no api_key; it cannot respond until one is set",
                id,
                agent.provider
            );
        }
    }

    Ok(())
}
