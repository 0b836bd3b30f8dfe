use crate::validation::{self, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not signed in or session expired: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("could not obtain an ID token: {0}")]
    Token(String),

    #[error("invalid input: {}", validation::banner(.0))]
    Validation(Vec<ValidationError>),
}

impl ApiError {
    /// Map a non-success response to an error, preferring the server's own
    /// `message`/`error` text over the raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.chars().take(200).collect()
            }
        });

        match status {
            401 | 403 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Http { status, message },
        }
    }

    /// Single line shown in the form's error banner
    pub fn banner(&self) -> String {
        match self {
            ApiError::Network(_) => "Could not reach the server. Check your connection and try again.".to_string(),
            ApiError::Unauthorized(_) => "Your session has expired. Please sign in again.".to_string(),
            ApiError::NotFound(message) => message.clone(),
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ApiError::Token(_) => "Could not verify your sign-in. Please sign in again.".to_string(),
            ApiError::Validation(errors) => validation::banner(errors),
        }
    }
}

impl From<Vec<ValidationError>> for ApiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ApiError::Validation(errors)
    }
}

fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_preferred() {
        let err = ApiError::from_response(400, r#"{"success": false, "message": "Phone already registered"}"#);
        assert_eq!(err.banner(), "Phone already registered");
        assert!(matches!(err, ApiError::Http { status: 400, .. }));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ApiError::from_response(401, ""), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_response(403, "{}"), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_response(404, r#"{"error": "Member not found"}"#), ApiError::NotFound(m) if m == "Member not found"));
    }

    #[test]
    fn test_plain_text_body() {
        let err = ApiError::from_response(500, "Internal Server Error");
        assert_eq!(err.to_string(), "server returned 500: Internal Server Error");

        let err = ApiError::from_response(502, "  ");
        assert_eq!(err.banner(), "HTTP 502");
    }
}
