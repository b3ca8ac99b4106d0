mod channels;
mod defaults;


pub use channels::*;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::ParrotError;
use defaults::*;

/// Top-level Parrot configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub parrot: ParrotConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub invite: InviteConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParrotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ParrotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Who may administer keywords.
///
/// A sender must be listed in `admins` and, when `require_group_role` is set,
/// also hold the owner or admin role in the group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Platform user IDs allowed to manage keywords.
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default = "default_true")]
    pub require_group_role: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admins: Vec::new(),
            require_group_role: true,
        }
    }
}

/// QA store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Fuzzy matcher config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Head nouns per locale used by the core-word heuristic.
    #[serde(default = "default_core_words")]
    pub core_words: BTreeMap<String, Vec<String>>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            core_words: default_core_words(),
        }
    }
}

/// Invitation code lookup config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteConfig {
    /// Phrases that trigger the invitation code lookup (fuzzy matched).
    #[serde(default = "default_invite_triggers")]
    pub triggers: Vec<String>,
    #[serde(default = "default_invite_timeout")]
    pub timeout_secs: u64,
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            triggers: default_invite_triggers(),
            timeout_secs: default_invite_timeout(),
        }
    }
}

/// Interactive keyword registration config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// How long to wait for the reply after `/addkw`.
    #[serde(default = "default_registration_timeout")]
    pub timeout_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_registration_timeout(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. An empty Telegram
/// token is filled from `TELEGRAM_BOT_TOKEN` when that variable is set.
pub fn load(path: &str) -> Result<Config, ParrotError> {
    let path = Path::new(path);
    let mut config = if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ParrotError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        parse(&content)?
    };

    if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
        let tg = config.channel.telegram.get_or_insert_with(TelegramConfig::default);
        if tg.bot_token.is_empty() && !token.is_empty() {
            tg.bot_token = token;
        }
    }

    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, ParrotError> {
    toml::from_str(content).map_err(|e| ParrotError::Config(format!("failed to parse config: {e}")))
}
