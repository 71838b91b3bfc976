use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is empty")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse Gemini response: {source}\n  body: {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Gemini returned no text")]
    EmptyResponse,
}

impl GeminiError {
    /// True for failures worth another attempt (rate limits, server errors).
    pub fn is_retryable(&self) -> bool {
        match self {
            GeminiError::Api { status, .. } => *status == 429 || *status >= 500,
            GeminiError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_and_server_errors_are_retryable() {
        let limited = GeminiError::Api {
            status: 429,
            body: String::new(),
        };
        let down = GeminiError::Api {
            status: 503,
            body: String::new(),
        };
        assert!(limited.is_retryable());
        assert!(down.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        let bad = GeminiError::Api {
            status: 400,
            body: "bad request".into(),
        };
        assert!(!bad.is_retryable());
        assert!(!GeminiError::EmptyResponse.is_retryable());
    }
}
