//! Policy type registry.

use std::fmt;
use std::str::FromStr;

use zpa_core::ZpaError;

/// The ten policy set kinds exposed by the platform.
///
/// Callers use the short snake_case key; the platform speaks the canonical
/// enumeration string. Both directions are static data, resolved without any
/// remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyType {
    Access,
    Capabilities,
    ClientForwarding,
    Clientless,
    Credential,
    Inspection,
    Isolation,
    Redirection,
    Siem,
    Timeout,
}

impl PolicyType {
    /// Every recognized policy type, in short-key order.
    pub const ALL: [Self; 10] = [
        Self::Access,
        Self::Capabilities,
        Self::ClientForwarding,
        Self::Clientless,
        Self::Credential,
        Self::Inspection,
        Self::Isolation,
        Self::Redirection,
        Self::Siem,
        Self::Timeout,
    ];

    /// The platform's canonical policy-type enumeration string.
    #[must_use]
    pub const fn canonical(self) -> &'static str {
        match self {
            Self::Access => "ACCESS_POLICY",
            Self::Capabilities => "CAPABILITIES_POLICY",
            Self::ClientForwarding => "CLIENT_FORWARDING_POLICY",
            Self::Clientless => "CLIENTLESS_SESSION_PROTECTION_POLICY",
            Self::Credential => "CREDENTIAL_POLICY",
            Self::Inspection => "INSPECTION_POLICY",
            Self::Isolation => "ISOLATION_POLICY",
            Self::Redirection => "REDIRECTION_POLICY",
            Self::Siem => "SIEM_POLICY",
            Self::Timeout => "TIMEOUT_POLICY",
        }
    }

    /// The short key callers use.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Capabilities => "capabilities",
            Self::ClientForwarding => "client_forwarding",
            Self::Clientless => "clientless",
            Self::Credential => "credential",
            Self::Inspection => "inspection",
            Self::Isolation => "isolation",
            Self::Redirection => "redirection",
            Self::Siem => "siem",
            Self::Timeout => "timeout",
        }
    }
}

impl FromStr for PolicyType {
    type Err = ZpaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| ZpaError::InvalidPolicyType { given: s.into() })
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_short_key_resolves_to_its_canonical_string() {
        let expected = [
            ("access", "ACCESS_POLICY"),
            ("capabilities", "CAPABILITIES_POLICY"),
            ("client_forwarding", "CLIENT_FORWARDING_POLICY"),
            ("clientless", "CLIENTLESS_SESSION_PROTECTION_POLICY"),
            ("credential", "CREDENTIAL_POLICY"),
            ("inspection", "INSPECTION_POLICY"),
            ("isolation", "ISOLATION_POLICY"),
            ("redirection", "REDIRECTION_POLICY"),
            ("siem", "SIEM_POLICY"),
            ("timeout", "TIMEOUT_POLICY"),
        ];
        for (key, canonical) in expected {
            let kind: PolicyType = key.parse().unwrap();
            assert_eq!(kind.canonical(), canonical);
            assert_eq!(kind.key(), key);
        }
    }

    #[test]
    fn unknown_keys_are_a_hard_error() {
        for bogus in ["Access", "ACCESS_POLICY", "firewall", ""] {
            let err = bogus.parse::<PolicyType>().unwrap_err();
            assert!(
                matches!(&err, ZpaError::InvalidPolicyType { given } if given == bogus),
                "unexpected error for {bogus:?}: {err:?}"
            );
        }
    }
}
