//! Notifier capability
//!
//! Sessions never talk to the chat platform directly. Synchronous command
//! replies travel back in the ingress response; everything asynchronous
//! (loop-replay notices, presence updates) goes through this trait.

use async_trait::async_trait;
use jockey_common::{ChannelId, Error, Reply, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Presence text re-asserted periodically, as the original deployment did.
const PRESENCE_TEXT: &str = "Listening to music";

/// Delivery of reply payloads and presence updates into chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a reply payload into a text channel.
    async fn notify(&self, channel: ChannelId, reply: &Reply) -> Result<()>;

    /// Update the process's displayed presence.
    async fn set_presence(&self, text: &str) -> Result<()>;
}

#[derive(serde::Serialize)]
struct NotifyRequest<'a> {
    channel_id: ChannelId,
    reply: &'a Reply,
}

#[derive(serde::Serialize)]
struct PresenceRequest<'a> {
    text: &'a str,
}

/// Notifier that posts to the gateway's callback endpoints.
pub struct WebhookNotifier {
    http: reqwest::Client,
    base: String,
}

impl WebhookNotifier {
    pub fn new(gateway_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base: gateway_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<()> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("gateway unreachable: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Http(format!(
                "gateway refused callback ({})",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, channel: ChannelId, reply: &Reply) -> Result<()> {
        self.post(
            "/callbacks/notify",
            &NotifyRequest {
                channel_id: channel,
                reply,
            },
        )
        .await
    }

    async fn set_presence(&self, text: &str) -> Result<()> {
        self.post("/callbacks/presence", &PresenceRequest { text })
            .await
    }
}

/// Fallback notifier for deployments without a gateway callback URL:
/// notifications are logged and dropped.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, channel: ChannelId, reply: &Reply) -> Result<()> {
        info!(
            "Notification for channel {}: {}",
            channel,
            reply.title.as_deref().or(reply.body.as_deref()).unwrap_or("")
        );
        Ok(())
    }

    async fn set_presence(&self, text: &str) -> Result<()> {
        debug!("Presence update: {}", text);
        Ok(())
    }
}

/// Periodically re-assert presence.
///
/// Delivery errors are logged and swallowed; a flapping gateway must not
/// take the presence task down.
pub async fn run_presence_loop(notifier: Arc<dyn Notifier>, interval: Duration) {
    let mut tick = tokio::time::interval(interval);
    loop {
        tick.tick().await;
        if let Err(e) = notifier.set_presence(PRESENCE_TEXT).await {
            debug!("Presence update failed: {}", e);
        }
    }
}
