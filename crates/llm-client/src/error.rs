//! Error types for providers and the router.
//!
//! [`ProviderError`] never leaves the router; callers only see [`RouterError`].

use thiserror::Error;

/// Failure of one backend call. Every variant is recoverable by trying the next provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Payload(e.to_string())
    }
}

/// Aggregate outcome of a routed chat call.
#[derive(Error, Debug)]
pub enum RouterError {
    /// Every enabled provider failed; one `(provider, error)` pair per attempt, in order.
    #[error("All providers failed: {}", format_failures(.failures))]
    AllProvidersFailed { failures: Vec<(String, String)> },

    #[error("No providers enabled")]
    NoProvidersEnabled,

    #[error("Generation cancelled")]
    Cancelled,
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_failed_lists_each_provider() {
        let err = RouterError::AllProvidersFailed {
            failures: vec![
                ("openai".to_string(), "HTTP status 500: boom".to_string()),
                ("ollama".to_string(), "Timed out after 5s".to_string()),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("openai: HTTP status 500: boom"));
        assert!(text.contains("ollama: Timed out after 5s"));
    }
}
