//! Error types for listing fetches.

use thiserror::Error;

/// Anything that prevents a fetch from producing a complete listing set.
///
/// Callers treat every variant the same way: the poll cycle is abandoned and
/// nothing from the response is processed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("No data in response")]
    MissingData,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Request(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            status: 403,
            body: "blocked".to_string(),
        };
        assert_eq!(err.to_string(), "API returned status 403: blocked");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
