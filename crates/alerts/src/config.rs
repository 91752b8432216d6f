//! Notification channel configuration.

use std::fmt;
use std::time::Duration;

/// A Discord webhook endpoint.
///
/// The URL embeds a secret token, so `Debug` only shows the part before it.
#[derive(Clone, PartialEq, Eq)]
pub struct Webhook(String);

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Build from an optional setting. Empty strings count as unset.
    pub fn from_optional(url: Option<String>) -> Option<Self> {
        url.filter(|u| !u.trim().is_empty()).map(Self::new)
    }

    pub fn url(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        match self.0.trim_end_matches('/').rfind('/') {
            Some(idx) => format!("{}/***", &self.0[..idx]),
            None => "***".to_string(),
        }
    }
}

impl fmt::Debug for Webhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Webhook").field(&self.redacted()).finish()
    }
}

/// Where notifications go.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Primary channel for per-listing messages.
    pub listing_webhook: Webhook,
    /// Optional channel for error notices.
    pub error_webhook: Option<Webhook>,
    /// Optional channel for per-cycle summaries.
    pub status_webhook: Option<Webhook>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl NotifierConfig {
    /// Config with only the primary channel and the default timeout.
    pub fn new(listing_webhook: Webhook) -> Self {
        Self {
            listing_webhook,
            error_webhook: None,
            status_webhook: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_error_webhook(mut self, webhook: Option<Webhook>) -> Self {
        self.error_webhook = webhook;
        self
    }

    pub fn with_status_webhook(mut self, webhook: Option<Webhook>) -> Self {
        self.status_webhook = webhook;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_optional_treats_empty_as_unset() {
        assert_eq!(Webhook::from_optional(None), None);
        assert_eq!(Webhook::from_optional(Some(String::new())), None);
        assert_eq!(Webhook::from_optional(Some("  ".to_string())), None);
        assert_eq!(
            Webhook::from_optional(Some("https://example.com/hook".to_string())),
            Some(Webhook::new("https://example.com/hook"))
        );
    }

    #[test]
    fn test_debug_hides_token() {
        let hook = Webhook::new("https://discord.com/api/webhooks/123/secret-token");
        let shown = format!("{:?}", hook);
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("https://discord.com/api/webhooks/123/***"));
    }

    #[test]
    fn test_notifier_config_defaults() {
        let config = NotifierConfig::new(Webhook::new("https://example.com/hook"));
        assert!(config.error_webhook.is_none());
        assert!(config.status_webhook.is_none());
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
