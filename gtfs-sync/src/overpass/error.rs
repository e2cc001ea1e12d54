//! Overpass client error types.

use std::fmt;

/// Errors from the Overpass HTTP client.
#[derive(Debug)]
pub enum OverpassError {
    /// HTTP request failed (network error, timeout, etc.)
    Http(reqwest::Error),

    /// JSON deserialization failed
    Json {
        message: String,
        body: Option<String>,
    },

    /// A mirror returned an error status code
    ApiError { status: u16, message: String },

    /// A node element in the response was missing required fields
    BadElement { id: i64, message: String },

    /// Every configured mirror failed for one query
    AllMirrorsFailed { attempts: Vec<(String, String)> },

    /// Client configuration was unusable
    NotConfigured(String),
}

impl fmt::Display for OverpassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverpassError::Http(e) => write!(f, "HTTP error: {e}"),
            OverpassError::Json { message, body } => {
                write!(f, "JSON parse error: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            OverpassError::ApiError { status, message } => {
                write!(f, "API error {status}: {message}")
            }
            OverpassError::BadElement { id, message } => {
                write!(f, "malformed node {id}: {message}")
            }
            OverpassError::AllMirrorsFailed { attempts } => {
                write!(f, "all {} mirrors failed:", attempts.len())?;
                for (mirror, error) in attempts {
                    write!(f, " [{mirror}: {error}]")?;
                }
                Ok(())
            }
            OverpassError::NotConfigured(msg) => write!(f, "not configured: {msg}"),
        }
    }
}

impl std::error::Error for OverpassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverpassError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OverpassError {
    fn from(err: reqwest::Error) -> Self {
        OverpassError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OverpassError::ApiError {
            status: 504,
            message: "Gateway Timeout".into(),
        };
        assert_eq!(err.to_string(), "API error 504: Gateway Timeout");

        let err = OverpassError::AllMirrorsFailed {
            attempts: vec![
                ("https://a.example".into(), "timeout".into()),
                ("https://b.example".into(), "API error 429".into()),
            ],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("all 2 mirrors failed"));
        assert!(rendered.contains("https://a.example: timeout"));

        let err = OverpassError::Json {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("JSON parse error"));
        assert!(err.to_string().contains("<html>"));
    }
}
