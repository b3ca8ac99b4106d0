//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates` and `sendMessage` / `sendPhoto` for
//! replies. Docs: <https://core.telegram.org/bots/api>

mod polling;
mod send;
mod types;


use parrot_core::{config::TelegramConfig, error::ParrotError};
use std::sync::Arc;
use tokio::sync::Mutex;

const TELEGRAM_API_ROOT: &str = "https://api.telegram.org";

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    base_url: String,
    file_base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_api_root(config, TELEGRAM_API_ROOT)
    }

    /// Create a channel talking to a different Bot API server.
    pub fn with_api_root(config: TelegramConfig, api_root: &str) -> Self {
        let api_root = api_root.trim_end_matches('/');
        let base_url = format!("{api_root}/bot{}", config.bot_token);
        let file_base_url = format!("{api_root}/file/bot{}", config.bot_token);
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            file_base_url,
            last_update_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Download URL for a `file_path` returned by `getFile`.
    fn file_url(&self, file_path: &str) -> String {
        format!("{}/{file_path}", self.file_base_url)
    }
}

/// Request URLs embed the bot token, so they never reach error messages.
fn request_err(context: &str, e: reqwest::Error) -> ParrotError {
    ParrotError::Channel(format!("{context}: {}", e.without_url()))
}

fn parse_chat_id(target: &str) -> Result<i64, ParrotError> {
    target
        .parse()
        .map_err(|e| ParrotError::Channel(format!("invalid telegram chat_id '{target}': {e}")))
}
