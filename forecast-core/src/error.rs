use reqwest::StatusCode;
use thiserror::Error;

/// A lookup that did not produce a result.
///
/// All variants end up in the same place: [`LookupError::user_message`] is what
/// the form shows in place of results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The backend answered with a non-2xx status.
    #[error("lookup rejected with status {status}: {message}")]
    Rejected { status: StatusCode, message: String },

    /// The request never produced an HTTP response.
    #[error("could not reach the weather service: {0}")]
    Transport(String),

    /// A 2xx response whose body did not have the expected shape.
    #[error("unexpected response from the weather service: {0}")]
    Malformed(String),

    /// The provider cannot be used as configured (e.g. no API key).
    #[error("{0}")]
    NotConfigured(String),
}

impl LookupError {
    /// Build a rejection from an error body, falling back to the status line
    /// when the body carries no message.
    pub fn rejected(status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("lookup failed with status {status}"));
        LookupError::Rejected { status, message }
    }

    /// Text shown to the user. Server-supplied messages pass through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The request URL is dropped: it can carry an API key in its query string.
impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_decode() {
            LookupError::Malformed(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_verbatim() {
        let err = LookupError::rejected(StatusCode::NOT_FOUND, Some("Not found".into()));
        assert_eq!(err.user_message(), "Not found");
    }

    #[test]
    fn rejected_without_message_names_status() {
        let err = LookupError::rejected(StatusCode::BAD_GATEWAY, None);
        assert!(err.user_message().contains("502"));

        let blank = LookupError::rejected(StatusCode::BAD_REQUEST, Some("  ".into()));
        assert!(blank.user_message().contains("400"));
    }

    #[test]
    fn transport_message_is_descriptive() {
        let err = LookupError::Transport("connection refused".into());
        assert_eq!(
            err.user_message(),
            "could not reach the weather service: connection refused"
        );
    }
}
