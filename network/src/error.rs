use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned HTTP status {status}")]
    Status { operation: &'static str, status: u16 },

    #[error("transaction rejected by the authority: {0}")]
    Rejected(String),

    #[error("failed to decode {operation} response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("state change subscription closed")]
    SubscriptionClosed,
}

impl AuthorityError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AuthorityError::Timeout { .. })
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AuthorityError::Timeout { .. }
            | AuthorityError::Transport { .. }
            | AuthorityError::SubscriptionClosed => true,
            AuthorityError::Status { status, .. } => *status >= 500 || *status == 429,
            AuthorityError::Rejected(_) | AuthorityError::Decode { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(operation: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthorityError::Timeout { operation }
        } else if e.is_decode() {
            AuthorityError::Decode {
                operation,
                message: e.to_string(),
            }
        } else {
            AuthorityError::Transport {
                operation,
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(AuthorityError::Timeout { operation: "x" }.is_timeout());
        assert!(AuthorityError::Timeout { operation: "x" }.is_transient());
        assert!(AuthorityError::Status {
            operation: "x",
            status: 503
        }
        .is_transient());
        assert!(!AuthorityError::Status {
            operation: "x",
            status: 400
        }
        .is_transient());
        assert!(!AuthorityError::Rejected("bad nonce".into()).is_transient());
        assert!(!AuthorityError::SubscriptionClosed.is_timeout());
    }
}
