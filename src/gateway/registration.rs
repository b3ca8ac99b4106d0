//! Interactive keyword registration: `/addkw` waits for the sender's next message.

use super::Gateway;
use crate::{commands, media};
use parrot_core::{
    message::{IncomingMessage, OutgoingMessage},
    qa::ContentItem,
};
use parrot_memory::audit::{AuditAction, AuditStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub(super) const AWAITING_REPLY: &str = "Send the reply for this keyword";
pub(super) const KEYWORD_ADDED: &str = "Keyword added";
pub(super) const NOTHING_TO_SAVE: &str = "Nothing to save";
pub(super) const TIMED_OUT: &str = "Timed out waiting for the keyword reply";

/// How often expired sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Identifies whose next message completes a registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct SessionKey {
    pub channel: String,
    pub group_id: String,
    pub sender_id: String,
}

impl SessionKey {
    pub fn of(incoming: &IncomingMessage, group_id: &str) -> Self {
        Self {
            channel: incoming.channel.clone(),
            group_id: group_id.to_string(),
            sender_id: incoming.sender_id.clone(),
        }
    }
}

/// A keyword waiting for its reply.
#[derive(Debug, Clone)]
pub(super) struct PendingRegistration {
    pub keyword: String,
    pub reply_target: Option<String>,
    started: Instant,
}

/// A session removed by [`Registrations::take`].
#[derive(Debug)]
pub(super) enum Claim {
    Active(PendingRegistration),
    Expired(PendingRegistration),
}

/// Open registration sessions with a shared timeout.
pub(super) struct Registrations {
    sessions: Mutex<HashMap<SessionKey, PendingRegistration>>,
    timeout: Duration,
}

impl Registrations {
    pub fn new(timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Open (or restart) a session. A newer `/addkw` replaces the older one.
    pub async fn begin(&self, key: SessionKey, keyword: String, reply_target: Option<String>) {
        self.sessions.lock().await.insert(
            key,
            PendingRegistration {
                keyword,
                reply_target,
                started: Instant::now(),
            },
        );
    }

    /// Remove the session for `key`, if any.
    pub async fn take(&self, key: &SessionKey) -> Option<Claim> {
        let pending = self.sessions.lock().await.remove(key)?;
        if pending.started.elapsed() >= self.timeout {
            Some(Claim::Expired(pending))
        } else {
            Some(Claim::Active(pending))
        }
    }

    /// Drop and return every expired session.
    pub async fn sweep_expired(&self) -> Vec<(SessionKey, PendingRegistration)> {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<SessionKey> = sessions
            .iter()
            .filter(|(_, p)| p.started.elapsed() >= self.timeout)
            .map(|(k, _)| k.clone())
            .collect();

        expired
            .into_iter()
            .filter_map(|k| sessions.remove(&k).map(|p| (k, p)))
            .collect()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Gateway {
    /// Turn the sender's message into reply parts and save the keyword.
    pub(super) async fn complete_registration(
        &self,
        incoming: &IncomingMessage,
        group_id: &str,
        pending: PendingRegistration,
    ) {
        let keyword = pending.keyword;
        let mut parts = Vec::new();

        if !incoming.text.is_empty() {
            match ContentItem::text(incoming.text.as_str()) {
                Ok(item) => parts.push(item),
                Err(e) => warn!("skipping text part: {e}"),
            }
        }

        let channel = self.channels.get(&incoming.channel);
        if let (Some(image), Some(channel)) = (incoming.image(), channel) {
            if let Some(path) = media::save_reply_image(
                channel.as_ref(),
                image,
                &self.data_dir,
                group_id,
                &keyword,
            )
            .await
            {
                match ContentItem::image(path) {
                    Ok(item) => parts.push(item),
                    Err(e) => warn!("skipping image part: {e}"),
                }
            }
        }

        if parts.is_empty() {
            self.send_text(incoming, NOTHING_TO_SAVE).await;
            return;
        }

        let part_count = parts.len();
        let reply = match self.store.add(group_id, &keyword, &parts).await {
            Ok(()) => {
                commands::audit(
                    &self.audit,
                    incoming,
                    group_id,
                    AuditAction::AddKeyword,
                    Some(&keyword),
                    AuditStatus::Ok,
                    Some(format!("{part_count} part(s)")),
                )
                .await;
                KEYWORD_ADDED
            }
            Err(e) => {
                error!("failed to add keyword {keyword:?} in {group_id}: {e}");
                commands::audit(
                    &self.audit,
                    incoming,
                    group_id,
                    AuditAction::AddKeyword,
                    Some(&keyword),
                    AuditStatus::Error,
                    Some(e.to_string()),
                )
                .await;
                "Failed to add the keyword"
            }
        };

        self.send_text(incoming, reply).await;
    }

    /// Periodically expire registration sessions and tell the group.
    pub(super) async fn registration_sweeper(self: Arc<Self>) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            for (key, pending) in self.registrations.sweep_expired().await {
                info!(
                    "registration for {:?} by {} in {} timed out",
                    pending.keyword, key.sender_id, key.group_id
                );
                let Some(channel) = self.channels.get(&key.channel) else {
                    continue;
                };
                let msg = OutgoingMessage::new(TIMED_OUT, pending.reply_target.clone());
                if let Err(e) = channel.send(msg).await {
                    error!("failed to send timeout notice: {e}");
                }
            }
        }
    }
}
