//! Wire-level primitives shared by the transport and policy layers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Management API schema version.
///
/// The platform exposes two incompatible schema generations for some
/// endpoints; the version selects both the URL prefix and the condition
/// grammar a payload must follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// `mgmtconfig/v1` endpoints.
    #[default]
    V1,
    /// `mgmtconfig/v2` endpoints.
    V2,
}

impl ApiVersion {
    /// URL path segment for this version.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::V1 => "mgmtconfig/v1",
            Self::V2 => "mgmtconfig/v2",
        }
    }
}

/// Status-bearing response from a mutation endpoint.
///
/// PUT and reorder endpoints answer with a bare status (204 on success) and
/// an error document otherwise; the caller owns the interpretation.
#[derive(Debug, Clone)]
pub struct ApiStatus {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body, empty on 204.
    pub body: String,
}

impl ApiStatus {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }
}

/// One page of a paginated list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Total number of pages reported by the server.
    #[serde(default)]
    pub total_pages: u64,
    /// Records on this page.
    #[serde(default)]
    pub list: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn version_prefixes() {
        assert_eq!(ApiVersion::V1.prefix(), "mgmtconfig/v1");
        assert_eq!(ApiVersion::V2.prefix(), "mgmtconfig/v2");
    }

    #[test]
    fn page_parses_partial_envelope() {
        let page: Page = serde_json::from_str("{\"totalPages\": 3}").unwrap();
        assert_eq!(page.total_pages, 3);
        assert!(page.list.is_empty());
    }

    #[test]
    fn status_success_range() {
        let no_content = ApiStatus {
            status: 204,
            body: String::new(),
        };
        assert!(no_content.is_success());
        let bad = ApiStatus {
            status: 400,
            body: "oops".into(),
        };
        assert!(!bad.is_success());
    }
}
