//! Discord webhook notifier.

use crate::config::{NotifierConfig, Webhook};
use crate::embed::{Embed, WebhookPayload};
use crate::notifier::{Notifier, NotifierError, NotifierResult};
use apartment_core::Listing;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use tracing::{debug, warn};

/// Posts embeds to Discord webhooks.
pub struct DiscordNotifier {
    client: reqwest::Client,
    config: NotifierConfig,
    hostname: String,
}

impl DiscordNotifier {
    pub fn new(config: NotifierConfig) -> NotifierResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(Self {
            client,
            config,
            hostname,
        })
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// POST a single-embed payload. Discord answers 204, or 200 with `?wait=true`.
    async fn post_embed(&self, webhook: &Webhook, embed: Embed) -> NotifierResult<()> {
        let embeds = [embed];
        let response = self
            .client
            .post(webhook.url())
            .json(&WebhookPayload { embeds: &embeds })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            return Err(NotifierError::Status(status.as_u16()));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send_listing(&self, listing: &Listing) -> NotifierResult<()> {
        debug!(listing_id = %listing.id, area = %listing.area_name, "Sending listing notification");
        self.post_embed(&self.config.listing_webhook, Embed::listing(listing))
            .await
    }

    async fn send_status(
        &self,
        total: usize,
        new: usize,
        sample: &[Listing],
    ) -> NotifierResult<()> {
        let Some(webhook) = &self.config.status_webhook else {
            return Ok(());
        };

        let embed = Embed::status(total, new, sample, Utc::now()).with_footer(&self.hostname);
        self.post_embed(webhook, embed).await
    }

    async fn send_error(&self, message: &str) {
        let Some(webhook) = &self.config.error_webhook else {
            debug!(notice = message, "Error webhook not configured, dropping error notice");
            return;
        };

        let embed = Embed::error(message, Utc::now()).with_footer(&self.hostname);
        if let Err(e) = self.post_embed(webhook, embed).await {
            warn!(error = %e, "Failed to send error notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{ERROR_COLOR, LISTING_COLOR, STATUS_COLOR};
    use axum::{http::StatusCode as AxumStatus, routing::post, Router};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn spawn_stub(status: AxumStatus) -> (Webhook, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();

        let app = Router::new().route(
            "/hook",
            post(move |payload: String| {
                let sink = sink.clone();
                async move {
                    let value = serde_json::from_str(&payload).unwrap_or(Value::Null);
                    sink.lock().unwrap().push(value);
                    status
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Webhook::new(format!("http://{}/hook", addr)), captured)
    }

    fn unreachable_webhook() -> Webhook {
        Webhook::new("http://127.0.0.1:1/hook")
    }

    fn listing() -> Listing {
        let mut l = Listing::new("4501234", "East Village", "123 E 7th St", 2450);
        l.bedroom_count = 2;
        l.full_bathroom_count = 1;
        l.url_path = "/building/123-e-7th-st/4b".to_string();
        l
    }

    fn notifier(mut config: NotifierConfig) -> DiscordNotifier {
        config.timeout = Duration::from_secs(2);
        DiscordNotifier::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_send_listing_posts_embed() {
        for status in [AxumStatus::NO_CONTENT, AxumStatus::OK] {
            let (hook, captured) = spawn_stub(status).await;
            let discord = notifier(NotifierConfig::new(hook));

            discord.send_listing(&listing()).await.unwrap();

            let payloads = captured.lock().unwrap();
            assert_eq!(payloads.len(), 1);
            let embed = &payloads[0]["embeds"][0];
            assert_eq!(embed["title"], "East Village");
            assert_eq!(embed["color"], LISTING_COLOR);
            assert_eq!(embed["fields"][1]["value"], "2 Beds");
        }
    }

    #[tokio::test]
    async fn test_send_listing_rejects_other_statuses() {
        let (hook, _captured) = spawn_stub(AxumStatus::TOO_MANY_REQUESTS).await;
        let discord = notifier(NotifierConfig::new(hook));

        let err = discord.send_listing(&listing()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Status(429)));

        // 201 is a success code but not one Discord sends for webhooks
        let (hook, _captured) = spawn_stub(AxumStatus::CREATED).await;
        let discord = notifier(NotifierConfig::new(hook));
        let err = discord.send_listing(&listing()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Status(201)));
    }

    #[tokio::test]
    async fn test_send_listing_transport_failure() {
        let discord = notifier(NotifierConfig::new(unreachable_webhook()));
        let err = discord.send_listing(&listing()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Request(_)));
    }

    #[tokio::test]
    async fn test_send_status_without_channel_is_noop() {
        let (hook, captured) = spawn_stub(AxumStatus::NO_CONTENT).await;
        let discord = notifier(NotifierConfig::new(hook));

        discord.send_status(10, 2, &[listing()]).await.unwrap();
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_status_posts_summary() {
        let (listing_hook, listing_captured) = spawn_stub(AxumStatus::NO_CONTENT).await;
        let (status_hook, status_captured) = spawn_stub(AxumStatus::NO_CONTENT).await;
        let config = NotifierConfig::new(listing_hook).with_status_webhook(Some(status_hook));
        let discord = notifier(config);

        discord.send_status(3, 1, &[]).await.unwrap();

        assert!(listing_captured.lock().unwrap().is_empty());
        let payloads = status_captured.lock().unwrap();
        let embed = &payloads[0]["embeds"][0];
        assert_eq!(embed["title"], "Poll Complete");
        assert_eq!(embed["color"], STATUS_COLOR);
        assert_eq!(embed["fields"][0]["value"], "3");
        assert_eq!(embed["fields"][2]["value"], "No listings in response");
        assert_eq!(embed["footer"]["text"], discord.hostname.as_str());
    }

    #[tokio::test]
    async fn test_send_status_failure_is_returned() {
        let config = NotifierConfig::new(unreachable_webhook())
            .with_status_webhook(Some(unreachable_webhook()));
        let discord = notifier(config);

        assert!(discord.send_status(1, 0, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_send_error_posts_to_error_channel() {
        let (listing_hook, listing_captured) = spawn_stub(AxumStatus::NO_CONTENT).await;
        let (error_hook, error_captured) = spawn_stub(AxumStatus::NO_CONTENT).await;
        let config = NotifierConfig::new(listing_hook).with_error_webhook(Some(error_hook));
        let discord = notifier(config);

        discord.send_error("Failed to fetch listings: timeout").await;

        assert!(listing_captured.lock().unwrap().is_empty());
        let payloads = error_captured.lock().unwrap();
        let embed = &payloads[0]["embeds"][0];
        assert_eq!(embed["title"], "Error");
        assert_eq!(embed["color"], ERROR_COLOR);
        assert_eq!(embed["description"], "Failed to fetch listings: timeout");
        assert!(embed["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_send_error_swallows_failures() {
        // No channel: nothing to do
        let discord = notifier(NotifierConfig::new(unreachable_webhook()));
        discord.send_error("boom").await;

        // Channel down: logged, not propagated
        let config = NotifierConfig::new(unreachable_webhook())
            .with_error_webhook(Some(unreachable_webhook()));
        notifier(config).send_error("boom").await;

        let (hook, captured) = spawn_stub(AxumStatus::INTERNAL_SERVER_ERROR).await;
        let config = NotifierConfig::new(unreachable_webhook()).with_error_webhook(Some(hook));
        notifier(config).send_error("boom").await;
        assert_eq!(captured.lock().unwrap().len(), 1);
    }
}
