mod commands;
mod gateway;
mod invite;
mod media;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use parrot_channels::telegram::TelegramChannel;
use parrot_core::{
    config::{self, shellexpand},
    traits::Channel,
};
use parrot_matcher::{tokenizer, Matcher};
use parrot_memory::Store;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "parrot", version, about = "Parrot - keyword auto-replies for group chats")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot.
    Start,
    /// Check configuration and store health.
    Status,
    /// Test whether a message would trigger a keyword.
    Match {
        /// The registered keyword (prefix with `re:` for a regex).
        keyword: String,
        /// The group message to test.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let log_dir = PathBuf::from(shellexpand(&cfg.parrot.data_dir)).join("logs");
            let _guard = init_logging(&cfg.parrot.log_level, Some(&log_dir))?;

            // Load the segmentation dictionary before the first message arrives.
            tokenizer::warm_up();

            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();

            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml or TELEGRAM_BOT_TOKEN env var."
                        );
                    }
                    let channel = TelegramChannel::new(tg.clone());
                    channels.insert("telegram".to_string(), Arc::new(channel));
                }
            }

            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            if cfg.auth.admins.is_empty() {
                tracing::warn!("no admins configured; keyword administration is disabled");
            }

            let store = Store::new(&cfg.store).await?;

            println!("{} - starting...", cfg.parrot.name);
            let gw = Arc::new(gateway::Gateway::new(channels, store, &cfg));
            gw.run().await?;
        }
        Commands::Status => {
            let _guard = init_logging(&cfg.parrot.log_level, None)?;
            println!("{} - Status Check\n", cfg.parrot.name);
            println!("Config: {}", cli.config);
            println!("Data dir: {}", shellexpand(&cfg.parrot.data_dir));
            println!("Admins: {}", cfg.auth.admins.len());
            println!();

            match Store::new(&cfg.store).await {
                Ok(store) => {
                    let size = store.db_size().await.unwrap_or(0);
                    println!("  store: ok ({}, {size} bytes)", shellexpand(&cfg.store.db_path));
                    store.close().await;
                }
                Err(e) => println!("  store: unavailable ({e})"),
            }

            if let Some(ref tg) = cfg.channel.telegram {
                println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                );
            } else {
                println!("  telegram: not configured");
            }
        }
        Commands::Match { keyword, message } => {
            let _guard = init_logging(&cfg.parrot.log_level, None)?;
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: parrot match <keyword> <message>");
            }

            let message = message.join(" ");
            let matcher = Matcher::from_config(&cfg.matcher);
            match matcher.explain(&keyword, &message) {
                Some(strategy) => println!("match ({strategy})"),
                None => println!("no match"),
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level. With `log_dir`, logs are also
/// written to a daily rolling file there.
fn init_logging(level: &str, log_dir: Option<&PathBuf>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "parrot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}
