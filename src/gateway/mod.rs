//! Gateway: the main event loop connecting channels, the matcher, and the store.
//!
//! Group messages are scanned against the group's keywords; matches are
//! replayed part by part. Commands administer keywords, and an `/addkw`
//! session captures the sender's next message as the reply.

mod registration;

#[cfg(test)]
mod tests;

use crate::commands::{self, Command, CommandContext, CommandResponse, GROUP_ONLY};
use crate::{invite, media};
use parrot_core::{
    config::{AuthConfig, Config, InviteConfig},
    message::{IncomingMessage, OutgoingMessage},
    qa::ContentKind,
    traits::Channel,
};
use parrot_matcher::Matcher;
use parrot_memory::{AuditLogger, Store};
use registration::{Claim, Registrations, SessionKey, AWAITING_REPLY, TIMED_OUT};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Reply when a group asks for an invitation code without a configured URL.
pub const NO_INVITE_URL: &str = "No invitation link is configured for this group.";

/// The central gateway that routes group messages to keyword replies.
pub struct Gateway {
    channels: HashMap<String, Arc<dyn Channel>>,
    store: Store,
    audit: AuditLogger,
    matcher: Matcher,
    auth_config: AuthConfig,
    invite_config: InviteConfig,
    data_dir: String,
    http: reqwest::Client,
    registrations: Registrations,
    uptime: Instant,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(channels: HashMap<String, Arc<dyn Channel>>, store: Store, config: &Config) -> Self {
        let audit = AuditLogger::new(store.pool().clone());
        Self {
            channels,
            store,
            audit,
            matcher: Matcher::from_config(&config.matcher),
            auth_config: config.auth.clone(),
            invite_config: config.invite.clone(),
            data_dir: config.parrot.data_dir.clone(),
            http: reqwest::Client::new(),
            registrations: Registrations::new(Duration::from_secs(
                config.registration.timeout_secs,
            )),
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "Parrot gateway running | channels: {} | admins: {} | core words: {}",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.auth_config.admins.len(),
            self.matcher.core_words().len(),
        );

        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(msg) = channel_rx.recv().await {
                    if tx.send(msg).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        let sweeper = tokio::spawn(self.clone().registration_sweeper());

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(incoming) = rx.recv() => {
                    let gw = self.clone();
                    tokio::spawn(async move {
                        gw.handle_message(incoming).await;
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        sweeper.abort();
        self.shutdown().await;
        Ok(())
    }

    /// Route one incoming message.
    async fn handle_message(&self, incoming: IncomingMessage) {
        let Some(channel) = self.channels.get(&incoming.channel).cloned() else {
            warn!("message from unknown channel {}", incoming.channel);
            return;
        };

        // Keywords are group scoped; private chats only learn that.
        let Some(group_id) = incoming.group_id.clone() else {
            if Command::parse(&incoming.text).is_some() {
                self.send_text(&incoming, GROUP_ONLY).await;
            }
            return;
        };

        match self
            .registrations
            .take(&SessionKey::of(&incoming, &group_id))
            .await
        {
            Some(Claim::Active(pending)) => {
                self.complete_registration(&incoming, &group_id, pending)
                    .await;
                return;
            }
            Some(Claim::Expired(pending)) => {
                info!("registration for {:?} expired", pending.keyword);
                self.send_text(&incoming, TIMED_OUT).await;
            }
            None => {}
        }

        if incoming.text.starts_with('/') {
            match Command::parse(&incoming.text) {
                Some(cmd) => self.run_command(cmd, &incoming, &group_id, channel).await,
                None => debug!("ignoring unknown command: {}", incoming.text),
            }
            return;
        }

        self.reply_to_keywords(&incoming, &group_id, channel.as_ref())
            .await;
        self.reply_to_invitation(&incoming, &group_id).await;
    }

    async fn run_command(
        &self,
        cmd: Command,
        incoming: &IncomingMessage,
        group_id: &str,
        channel: Arc<dyn Channel>,
    ) {
        let ctx = CommandContext {
            store: &self.store,
            audit: &self.audit,
            channel: channel.as_ref(),
            auth: &self.auth_config,
            incoming,
            group_id,
            uptime: &self.uptime,
        };

        match commands::handle(cmd, &ctx).await {
            CommandResponse::Reply(text) => self.send_text(incoming, &text).await,
            CommandResponse::AwaitReply { keyword } => {
                self.registrations
                    .begin(
                        SessionKey::of(incoming, group_id),
                        keyword,
                        incoming.reply_target.clone(),
                    )
                    .await;
                self.send_text(incoming, AWAITING_REPLY).await;
            }
        }
    }

    /// Replay the replies of every keyword the message matches.
    async fn reply_to_keywords(
        &self,
        incoming: &IncomingMessage,
        group_id: &str,
        channel: &dyn Channel,
    ) {
        let keywords = match self.store.list_for_group(group_id).await {
            Ok(k) => k,
            Err(e) => {
                error!("failed to load keywords for {group_id}: {e}");
                return;
            }
        };

        for (keyword, replies) in keywords.iter() {
            let Some(strategy) = self.matcher.explain(keyword, &incoming.text) else {
                continue;
            };
            debug!("keyword {keyword:?} matched in {group_id} via {strategy}");

            for item in replies {
                match item.kind() {
                    ContentKind::Text => self.send_text(incoming, item.content()).await,
                    ContentKind::ImageReference => {
                        let Some(target) = incoming.reply_target.as_deref() else {
                            continue;
                        };
                        let Some(bytes) = media::load_image(item.content()).await else {
                            continue;
                        };
                        if let Err(e) = channel.send_photo(target, &bytes, "").await {
                            error!("failed to send reply image: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Answer invitation code requests with the group's configured endpoint.
    async fn reply_to_invitation(&self, incoming: &IncomingMessage, group_id: &str) {
        let triggered = self
            .invite_config
            .triggers
            .iter()
            .any(|t| self.matcher.is_match(t, &incoming.text));
        if !triggered {
            return;
        }

        let reply = match self.store.get_invitation_url(group_id).await {
            Ok(Some(url)) => {
                invite::fetch_invitation_code(
                    &self.http,
                    &url,
                    Duration::from_secs(self.invite_config.timeout_secs),
                )
                .await
            }
            Ok(None) => NO_INVITE_URL.to_string(),
            Err(e) => {
                error!("failed to read invitation url for {group_id}: {e}");
                invite::FETCH_FAILED.to_string()
            }
        };

        self.send_text(incoming, &reply).await;
    }

    /// Graceful shutdown: stop channels, close the store.
    async fn shutdown(&self) {
        info!("Shutting down...");

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        self.store.close().await;
        info!("Shutdown complete.");
    }

    /// Send a plain text message back to where the message came from.
    async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage::new(text, incoming.reply_target.clone());

        if let Some(channel) = self.channels.get(&incoming.channel) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message: {e}");
            }
        }
    }
}
