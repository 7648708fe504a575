//! Error taxonomy for the ZPA client.

use thiserror::Error;

/// Convenience result alias used across the workspace.
pub type ZpaResult<T> = Result<T, ZpaError>;

/// Errors surfaced by the ZPA client.
///
/// Every variant is fatal: the client performs no internal retries, so the
/// caller always sees the first failure verbatim.
#[derive(Error, Debug)]
pub enum ZpaError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or incomplete client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication against the platform failed
    #[error("Authentication failed with status {status}: {body}")]
    Auth { status: u16, body: String },

    /// Unresolvable short policy-type key
    #[error("Incorrect policy type provided: {given}")]
    InvalidPolicyType { given: String },

    /// A field the operation requires was not supplied
    #[error("The '{field}' attribute is mandatory")]
    MissingRequiredField { field: &'static str },

    /// Arguments that are individually valid but contradict each other
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A condition descriptor did not match the shape its object type expects
    #[error("Malformed condition: {message}")]
    MalformedCondition { message: String },

    /// The remote service rejected a create or update
    #[error("API call failed with status {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// An update reported success but the confirming re-read returned nothing
    #[error("Failed to retrieve the updated rule with ID {rule_id}")]
    StaleReadAfterWrite { rule_id: String },
}

impl ZpaError {
    /// Build a `MalformedCondition` from anything displayable.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCondition {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, when it represents a remote response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::RemoteRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_rejected_carries_status_and_body() {
        let err = ZpaError::RemoteRejected {
            status: 400,
            body: "{\"id\":\"bad\"}".into(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.to_string(),
            "API call failed with status 400: {\"id\":\"bad\"}"
        );
    }

    #[test]
    fn missing_field_message_names_the_field() {
        let err = ZpaError::MissingRequiredField { field: "action" };
        assert_eq!(err.to_string(), "The 'action' attribute is mandatory");
    }

    #[test]
    fn compiler_errors_have_no_status() {
        assert_eq!(ZpaError::malformed("bad pair").status(), None);
    }
}
