//! Outbound notification channel.

use apartment_core::Listing;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("failed to send webhook: {0}")]
    Request(String),
    #[error("discord returned status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for NotifierError {
    fn from(e: reqwest::Error) -> Self {
        NotifierError::Request(e.to_string())
    }
}

pub type NotifierResult<T> = Result<T, NotifierError>;

/// Delivers poll results to humans.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce a single newly discovered listing.
    async fn send_listing(&self, listing: &Listing) -> NotifierResult<()>;

    /// Summarize a completed cycle. A no-op when no status channel is configured.
    async fn send_status(&self, total: usize, new: usize, sample: &[Listing])
        -> NotifierResult<()>;

    /// Report an operational problem. Never fails; delivery problems are only logged.
    async fn send_error(&self, message: &str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_display() {
        assert_eq!(
            NotifierError::Status(429).to_string(),
            "discord returned status 429"
        );
        assert_eq!(
            NotifierError::Request("connection refused".to_string()).to_string(),
            "failed to send webhook: connection refused"
        );
    }
}
