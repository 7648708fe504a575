//! The optional-field union shared by every rule kind.

use serde_json::{Map, Value, json};
use zpa_core::ZpaResult;

use crate::capabilities::PrivilegedCapabilities;
use crate::conditions::Condition;

/// Optional fields of a policy rule mutation.
///
/// One explicit record replaces free-form key/value payload assembly: every
/// field a rule kind may carry is listed here, absent fields contribute
/// nothing to the submitted payload. Which fields the platform honors
/// depends on the rule kind; the encoder is uniform.
#[derive(Debug, Clone, Default)]
pub struct RuleFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub action: Option<String>,
    pub custom_msg: Option<String>,
    pub enabled: Option<bool>,
    pub rule_order: Option<String>,
    pub re_auth_timeout: Option<i64>,
    pub re_auth_idle_timeout: Option<i64>,
    pub isolation_profile_id: Option<String>,
    pub inspection_profile_id: Option<String>,
    pub credential_id: Option<String>,
    pub app_connector_group_ids: Vec<String>,
    pub app_server_group_ids: Vec<String>,
    pub service_edge_group_ids: Vec<String>,
    pub privileged_capabilities: Option<PrivilegedCapabilities>,
    pub conditions: Option<Vec<Condition>>,
}

impl RuleFields {
    /// Empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn with_custom_msg(mut self, custom_msg: impl Into<String>) -> Self {
        self.custom_msg = Some(custom_msg.into());
        self
    }

    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_rule_order(mut self, rule_order: impl Into<String>) -> Self {
        self.rule_order = Some(rule_order.into());
        self
    }

    #[must_use]
    pub const fn with_re_auth_timeout(mut self, seconds: i64) -> Self {
        self.re_auth_timeout = Some(seconds);
        self
    }

    #[must_use]
    pub const fn with_re_auth_idle_timeout(mut self, seconds: i64) -> Self {
        self.re_auth_idle_timeout = Some(seconds);
        self
    }

    #[must_use]
    pub fn with_isolation_profile_id(mut self, id: impl Into<String>) -> Self {
        self.isolation_profile_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_inspection_profile_id(mut self, id: impl Into<String>) -> Self {
        self.inspection_profile_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_credential_id(mut self, id: impl Into<String>) -> Self {
        self.credential_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_app_connector_group_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_connector_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_app_server_group_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.app_server_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_service_edge_group_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.service_edge_group_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_privileged_capabilities(mut self, capabilities: PrivilegedCapabilities) -> Self {
        self.privileged_capabilities = Some(capabilities);
        self
    }

    #[must_use]
    pub fn with_conditions<I>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = Condition>,
    {
        self.conditions = Some(conditions.into_iter().collect());
        self
    }

    /// Write every present field into the camelCase payload map.
    ///
    /// Conditions are deliberately excluded: their compilation and their
    /// absence semantics differ between schema versions and between create
    /// and update, so the orchestrator owns them.
    pub(crate) fn apply_to(&self, payload: &mut Map<String, Value>) -> ZpaResult<()> {
        if let Some(name) = &self.name {
            payload.insert("name".into(), json!(name));
        }
        if let Some(description) = &self.description {
            payload.insert("description".into(), json!(description));
        }
        if let Some(action) = &self.action {
            payload.insert("action".into(), json!(action.to_uppercase()));
        }
        if let Some(custom_msg) = &self.custom_msg {
            payload.insert("customMsg".into(), json!(custom_msg));
        }
        if let Some(enabled) = self.enabled {
            payload.insert("enabled".into(), json!(enabled));
        }
        if let Some(rule_order) = &self.rule_order {
            payload.insert("ruleOrder".into(), json!(rule_order));
        }
        if let Some(seconds) = self.re_auth_timeout {
            payload.insert("reauthTimeout".into(), json!(seconds));
        }
        if let Some(seconds) = self.re_auth_idle_timeout {
            payload.insert("reauthIdleTimeout".into(), json!(seconds));
        }
        if let Some(id) = &self.isolation_profile_id {
            payload.insert("zpnIsolationProfileId".into(), json!(id));
        }
        if let Some(id) = &self.inspection_profile_id {
            payload.insert("zpnInspectionProfileId".into(), json!(id));
        }
        if let Some(id) = &self.credential_id {
            payload.insert("credential".into(), json!({ "id": id }));
        }
        Self::insert_id_group(payload, "appConnectorGroups", &self.app_connector_group_ids);
        Self::insert_id_group(payload, "appServerGroups", &self.app_server_group_ids);
        Self::insert_id_group(payload, "serviceEdgeGroups", &self.service_edge_group_ids);
        if let Some(capabilities) = &self.privileged_capabilities {
            payload.insert(
                "privilegedCapabilities".into(),
                json!({ "capabilities": capabilities.tokens() }),
            );
        }
        Ok(())
    }

    fn insert_id_group(payload: &mut Map<String, Value>, key: &str, ids: &[String]) {
        if !ids.is_empty() {
            let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
            payload.insert(key.into(), Value::Array(refs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn absent_fields_contribute_nothing() {
        let mut payload = Map::new();
        RuleFields::new().apply_to(&mut payload).unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn present_fields_encode_to_camel_case_keys() {
        let mut payload = Map::new();
        RuleFields::new()
            .with_name("rule")
            .with_description("desc")
            .with_action("allow")
            .with_custom_msg("denied")
            .with_enabled(true)
            .with_rule_order("2")
            .apply_to(&mut payload)
            .unwrap();

        assert_eq!(payload["name"], "rule");
        assert_eq!(payload["description"], "desc");
        assert_eq!(payload["action"], "ALLOW");
        assert_eq!(payload["customMsg"], "denied");
        assert_eq!(payload["enabled"], true);
        assert_eq!(payload["ruleOrder"], "2");
    }

    #[test]
    fn group_id_lists_become_id_reference_arrays() {
        let mut payload = Map::new();
        RuleFields::new()
            .with_app_connector_group_ids(["1", "2"])
            .with_service_edge_group_ids(Vec::<String>::new())
            .apply_to(&mut payload)
            .unwrap();

        assert_eq!(
            payload["appConnectorGroups"],
            serde_json::json!([{"id": "1"}, {"id": "2"}])
        );
        assert!(!payload.contains_key("serviceEdgeGroups"));
        assert!(!payload.contains_key("appServerGroups"));
    }

    #[test]
    fn credential_id_becomes_an_id_reference() {
        let mut payload = Map::new();
        RuleFields::new()
            .with_credential_id("cred-1")
            .apply_to(&mut payload)
            .unwrap();
        assert_eq!(payload["credential"], serde_json::json!({"id": "cred-1"}));
    }

    #[test]
    fn capabilities_encode_through_the_shared_encoder() {
        let mut payload = Map::new();
        RuleFields::new()
            .with_privileged_capabilities(PrivilegedCapabilities {
                clipboard_copy: Some(true),
                file_upload: Some(false),
                ..PrivilegedCapabilities::default()
            })
            .apply_to(&mut payload)
            .unwrap();
        assert_eq!(
            payload["privilegedCapabilities"],
            serde_json::json!({"capabilities": ["CLIPBOARD_COPY", "INSPECT_FILE_UPLOAD"]})
        );
    }
}
