//! Rule CRUD orchestration and rule ordering.
//!
//! Every mutation follows the same shape: resolve the policy set for the
//! rule's kind, compile caller-supplied conditions into the right schema
//! generation, submit, and confirm. Updates are read-merge-write — the
//! current server document is fetched first so fields the caller did not
//! touch survive the PUT. The sequence is not transactional; a concurrent
//! writer between the GET and the PUT loses.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};
use zpa_client::ZpaClient;
use zpa_core::{ApiVersion, ZpaError, ZpaResult};

use crate::conditions::{
    ConditionBlock, compile_conditions_v1, compile_conditions_v2, ensure_client_type_default,
};
use crate::fields::RuleFields;
use crate::ordering::order_rank;
use crate::policy_type::PolicyType;

/// Client types a redirection rule may target.
pub const REDIRECTION_CLIENT_TYPES: [&str; 5] = [
    "zpn_client_type_edge_connector",
    "zpn_client_type_branch_connector",
    "zpn_client_type_machine_tunnel",
    "zpn_client_type_zapp",
    "zpn_client_type_zapp_partner",
];

/// Timeout rules default to a 48h re-authentication window.
const DEFAULT_REAUTH_TIMEOUT: i64 = 172_800;
/// Timeout rules default to a 10min idle timeout.
const DEFAULT_REAUTH_IDLE_TIMEOUT: i64 = 600;

/// A policy set: the named, ordered rule collection of one policy type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySet {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// A policy rule resource.
///
/// Fields the client does not model are kept in `extra`, so a fetched rule
/// serializes back to the document the server sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_order: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionBlock>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PolicyRule {
    /// Server-assigned order as a number, zero when absent or non-numeric.
    #[must_use]
    pub fn numeric_rule_order(&self) -> i64 {
        self.rule_order
            .as_deref()
            .and_then(|order| order.parse().ok())
            .unwrap_or_default()
    }
}

/// Typed, uniform access to the policy-set rule APIs.
#[derive(Debug)]
pub struct PolicySetsApi {
    client: ZpaClient,
}

impl PolicySetsApi {
    /// Wrap an authenticated client.
    #[must_use]
    pub const fn new(client: ZpaClient) -> Self {
        Self { client }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// Fetch the policy set for the given policy type.
    #[instrument(skip(self))]
    pub async fn get_policy(&self, policy_type: PolicyType) -> ZpaResult<PolicySet> {
        let doc = self
            .client
            .get(&format!(
                "policySet/policyType/{}",
                policy_type.canonical()
            ))
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    async fn policy_id(&self, policy_type: PolicyType) -> ZpaResult<String> {
        Ok(self.get_policy(policy_type).await?.id)
    }

    /// Fetch one rule.
    #[instrument(skip(self))]
    pub async fn get_rule(&self, policy_type: PolicyType, rule_id: &str) -> ZpaResult<PolicyRule> {
        let policy_id = self.policy_id(policy_type).await?;
        let doc = self
            .client
            .get(&format!("policySet/{policy_id}/rule/{rule_id}"))
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Find a rule by its name. `Ok(None)` when no rule matches.
    pub async fn get_rule_by_name(
        &self,
        policy_type: PolicyType,
        name: &str,
    ) -> ZpaResult<Option<PolicyRule>> {
        let rules = self.list_rules(policy_type).await?;
        Ok(rules.into_iter().find(|rule| rule.name == name))
    }

    /// List every rule of a policy type.
    #[instrument(skip(self))]
    pub async fn list_rules(&self, policy_type: PolicyType) -> ZpaResult<Vec<PolicyRule>> {
        let records = self
            .client
            .get_paginated(
                &format!("policySet/rules/policyType/{}", policy_type.canonical()),
                ApiVersion::V1,
            )
            .await?;
        records
            .into_iter()
            .map(|record| Ok(serde_json::from_value(record)?))
            .collect()
    }

    /// Delete a rule, returning the response status code.
    #[instrument(skip(self))]
    pub async fn delete_rule(&self, policy_type: PolicyType, rule_id: &str) -> ZpaResult<u16> {
        let policy_id = self.policy_id(policy_type).await?;
        self.client
            .delete(&format!("policySet/{policy_id}/rule/{rule_id}"))
            .await
    }

    // ─── v1 creates ──────────────────────────────────────────────────────

    /// Add an Access Policy rule (v1 schema).
    pub async fn add_access_rule(
        &self,
        name: &str,
        action: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v1(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Access, payload, ApiVersion::V1)
            .await
    }

    /// Add a Timeout Policy rule (v1 schema). The action is always RE_AUTH.
    pub async fn add_timeout_rule(&self, name: &str, fields: RuleFields) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v1(&fields)?;
        let mut payload = Self::base_payload(name, Some("RE_AUTH"), blocks)?;
        fields.apply_to(&mut payload)?;
        Self::apply_timeout_defaults(&mut payload, &fields);
        self.create_rule(PolicyType::Timeout, payload, ApiVersion::V1)
            .await
    }

    /// Add a Client Forwarding Policy rule (v1 schema).
    pub async fn add_client_forwarding_rule(
        &self,
        name: &str,
        action: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v1(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::ClientForwarding, payload, ApiVersion::V1)
            .await
    }

    /// Add an Isolation Policy rule (v1 schema).
    ///
    /// Isolation rules always constrain the client type; when the compiled
    /// conditions carry none, the exporter client is added.
    pub async fn add_isolation_rule(
        &self,
        name: &str,
        action: &str,
        isolation_profile_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let mut blocks = Self::compiled_v1(&fields)?;
        ensure_client_type_default(&mut blocks, ApiVersion::V1);
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        payload.insert("zpnIsolationProfileId".into(), json!(isolation_profile_id));
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Isolation, payload, ApiVersion::V1)
            .await
    }

    /// Add an App Protection (inspection) Policy rule (v1 schema).
    pub async fn add_app_protection_rule(
        &self,
        name: &str,
        action: &str,
        inspection_profile_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v1(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        payload.insert(
            "zpnInspectionProfileId".into(),
            json!(inspection_profile_id),
        );
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Inspection, payload, ApiVersion::V1)
            .await
    }

    // ─── v1 updates ──────────────────────────────────────────────────────

    /// Update an Access Policy rule (v1 schema). `action` is mandatory.
    pub async fn update_access_rule(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v1_payload(PolicyType::Access, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::Access, rule_id, payload, ApiVersion::V1)
            .await
    }

    /// Update a Timeout Policy rule (v1 schema). The action stays RE_AUTH.
    pub async fn update_timeout_rule(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let mut payload = self
            .merged_v1_payload(PolicyType::Timeout, rule_id, &fields, Some("RE_AUTH"))
            .await?;
        Self::apply_timeout_defaults(&mut payload, &fields);
        self.update_rule(PolicyType::Timeout, rule_id, payload, ApiVersion::V1)
            .await
    }

    /// Update a Client Forwarding Policy rule (v1 schema). `action` is
    /// mandatory.
    pub async fn update_client_forwarding_rule(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v1_payload(PolicyType::ClientForwarding, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::ClientForwarding, rule_id, payload, ApiVersion::V1)
            .await
    }

    /// Update an Isolation Policy rule (v1 schema). `action` is mandatory;
    /// the client-type default is re-applied after compilation.
    pub async fn update_isolation_rule(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let mut blocks = Self::compiled_v1(&fields)?;
        ensure_client_type_default(&mut blocks, ApiVersion::V1);
        let mut payload = self.current_document(PolicyType::Isolation, rule_id).await?;
        fields.apply_to(&mut payload)?;
        payload.insert("conditions".into(), serde_json::to_value(&blocks)?);
        self.update_rule(PolicyType::Isolation, rule_id, payload, ApiVersion::V1)
            .await
    }

    /// Update an App Protection Policy rule (v1 schema). `action` is
    /// mandatory.
    pub async fn update_app_protection_rule(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v1_payload(PolicyType::Inspection, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::Inspection, rule_id, payload, ApiVersion::V1)
            .await
    }

    // ─── v2 creates ──────────────────────────────────────────────────────

    /// Add an Access Policy rule (v2 schema).
    pub async fn add_access_rule_v2(
        &self,
        name: &str,
        action: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Access, payload, ApiVersion::V2)
            .await
    }

    /// Add a Timeout Policy rule (v2 schema).
    pub async fn add_timeout_rule_v2(
        &self,
        name: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some("RE_AUTH"), blocks)?;
        fields.apply_to(&mut payload)?;
        Self::apply_timeout_defaults(&mut payload, &fields);
        self.create_rule(PolicyType::Timeout, payload, ApiVersion::V2)
            .await
    }

    /// Add a Client Forwarding Policy rule (v2 schema).
    pub async fn add_client_forwarding_rule_v2(
        &self,
        name: &str,
        action: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::ClientForwarding, payload, ApiVersion::V2)
            .await
    }

    /// Add an Isolation Policy rule (v2 schema).
    pub async fn add_isolation_rule_v2(
        &self,
        name: &str,
        action: &str,
        isolation_profile_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let mut blocks = Self::compiled_v2(&fields)?;
        ensure_client_type_default(&mut blocks, ApiVersion::V2);
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        payload.insert("zpnIsolationProfileId".into(), json!(isolation_profile_id));
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Isolation, payload, ApiVersion::V2)
            .await
    }

    /// Add an App Protection Policy rule (v2 schema).
    pub async fn add_app_protection_rule_v2(
        &self,
        name: &str,
        action: &str,
        inspection_profile_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        payload.insert(
            "zpnInspectionProfileId".into(),
            json!(inspection_profile_id),
        );
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Inspection, payload, ApiVersion::V2)
            .await
    }

    /// Add a Privileged Credential Policy rule (v2 schema). The action is
    /// always INJECT_CREDENTIALS.
    pub async fn add_privileged_credential_rule_v2(
        &self,
        name: &str,
        credential_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some("INJECT_CREDENTIALS"), blocks)?;
        payload.insert("credential".into(), json!({ "id": credential_id }));
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Credential, payload, ApiVersion::V2)
            .await
    }

    /// Add a Capabilities Policy rule (v2 schema). The action is always
    /// CHECK_CAPABILITIES.
    pub async fn add_capabilities_rule_v2(
        &self,
        name: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let blocks = Self::compiled_v2(&fields)?;
        let mut payload = Self::base_payload(name, Some("CHECK_CAPABILITIES"), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Capabilities, payload, ApiVersion::V2)
            .await
    }

    /// Add a Redirection Policy rule (v2 schema).
    ///
    /// Service edge groups come from
    /// [`RuleFields::with_service_edge_group_ids`] and are cross-validated
    /// against the action: `redirect_default` forbids them, the other
    /// actions require them.
    pub async fn add_redirection_rule_v2(
        &self,
        name: &str,
        action: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::validate_redirection_action(action, &fields)?;
        let blocks = Self::compiled_v2(&fields)?;
        Self::validate_redirection_client_types(&blocks)?;
        let mut payload = Self::base_payload(name, Some(action), blocks)?;
        fields.apply_to(&mut payload)?;
        self.create_rule(PolicyType::Redirection, payload, ApiVersion::V2)
            .await
    }

    // ─── v2 updates ──────────────────────────────────────────────────────

    /// Update an Access Policy rule (v2 schema). `action` is mandatory.
    pub async fn update_access_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v2_payload(PolicyType::Access, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::Access, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update a Timeout Policy rule (v2 schema). The action stays RE_AUTH.
    pub async fn update_timeout_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let payload = self
            .merged_v2_payload(PolicyType::Timeout, rule_id, &fields, Some("RE_AUTH"))
            .await?;
        self.update_rule(PolicyType::Timeout, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update a Client Forwarding Policy rule (v2 schema). `action` is
    /// mandatory.
    pub async fn update_client_forwarding_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v2_payload(PolicyType::ClientForwarding, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::ClientForwarding, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update an Isolation Policy rule (v2 schema). `action` is mandatory;
    /// the client-type default is re-applied when conditions are supplied.
    pub async fn update_isolation_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let mut payload = self
            .current_document(PolicyType::Isolation, rule_id)
            .await?;
        if fields.conditions.is_none() {
            payload.remove("conditions");
        }
        fields.apply_to(&mut payload)?;
        if let Some(conditions) = &fields.conditions {
            let mut blocks = compile_conditions_v2(conditions)?;
            ensure_client_type_default(&mut blocks, ApiVersion::V2);
            payload.insert("conditions".into(), serde_json::to_value(&blocks)?);
        }
        self.update_rule(PolicyType::Isolation, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update an App Protection Policy rule (v2 schema). `action` is
    /// mandatory.
    pub async fn update_app_protection_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v2_payload(PolicyType::Inspection, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::Inspection, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update a Privileged Credential Policy rule (v2 schema). The action
    /// stays INJECT_CREDENTIALS.
    pub async fn update_privileged_credential_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        let payload = self
            .merged_v2_payload(
                PolicyType::Credential,
                rule_id,
                &fields,
                Some("INJECT_CREDENTIALS"),
            )
            .await?;
        self.update_rule(PolicyType::Credential, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update a Capabilities Policy rule (v2 schema). `action` is mandatory
    /// and normalized to CHECK_CAPABILITIES, the only accepted value.
    pub async fn update_capabilities_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v2_payload(
                PolicyType::Capabilities,
                rule_id,
                &fields,
                Some("CHECK_CAPABILITIES"),
            )
            .await?;
        self.update_rule(PolicyType::Capabilities, rule_id, payload, ApiVersion::V2)
            .await
    }

    /// Update a Redirection Policy rule (v2 schema). `action` is mandatory.
    pub async fn update_redirection_rule_v2(
        &self,
        rule_id: &str,
        fields: RuleFields,
    ) -> ZpaResult<PolicyRule> {
        Self::require_action(&fields)?;
        let payload = self
            .merged_v2_payload(PolicyType::Redirection, rule_id, &fields, None)
            .await?;
        self.update_rule(PolicyType::Redirection, rule_id, payload, ApiVersion::V2)
            .await
    }

    // ─── Ordering ────────────────────────────────────────────────────────

    /// Move one rule to a new position.
    ///
    /// Returns the refreshed rule on success (204) and `None` otherwise.
    #[instrument(skip(self))]
    pub async fn reorder_rule(
        &self,
        policy_type: PolicyType,
        rule_id: &str,
        rule_order: &str,
    ) -> ZpaResult<Option<PolicyRule>> {
        let policy_id = self.policy_id(policy_type).await?;
        let status = self
            .client
            .put_empty(
                &format!("policySet/{policy_id}/rule/{rule_id}/reorder/{rule_order}"),
                ApiVersion::V1,
            )
            .await?;
        if status.status == 204 {
            return Ok(Some(self.get_rule(policy_type, rule_id).await?));
        }
        debug!(status = status.status, "reorder was not applied");
        Ok(None)
    }

    /// Reorder a whole policy's rules at once.
    ///
    /// `overrides` maps rule ids to requested positions and may be partial:
    /// unmentioned rules keep their relative server-assigned order. The full
    /// resulting id sequence is submitted in one call, so repeating the same
    /// overrides is idempotent.
    #[instrument(skip(self, overrides))]
    pub async fn bulk_reorder_rules(
        &self,
        policy_type: PolicyType,
        overrides: &HashMap<String, i64>,
    ) -> ZpaResult<()> {
        let policy_id = self.policy_id(policy_type).await?;
        let mut rules = self.list_rules(policy_type).await?;
        rules.sort_by_key(|rule| order_rank(rule, overrides));
        let ordered_ids: Vec<&str> = rules.iter().map(|rule| rule.id.as_str()).collect();

        let status = self
            .client
            .put(
                &format!("policySet/{policy_id}/reorder"),
                &json!(ordered_ids),
                ApiVersion::V1,
            )
            .await?;
        if status.status <= 299 {
            Ok(())
        } else {
            Err(ZpaError::RemoteRejected {
                status: status.status,
                body: status.body,
            })
        }
    }

    // ─── Shared plumbing ─────────────────────────────────────────────────

    fn require_action(fields: &RuleFields) -> ZpaResult<()> {
        if fields.action.is_none() {
            return Err(ZpaError::MissingRequiredField { field: "action" });
        }
        Ok(())
    }

    fn compiled_v1(fields: &RuleFields) -> ZpaResult<Vec<ConditionBlock>> {
        compile_conditions_v1(fields.conditions.as_deref().unwrap_or(&[]))
    }

    fn compiled_v2(fields: &RuleFields) -> ZpaResult<Vec<ConditionBlock>> {
        compile_conditions_v2(fields.conditions.as_deref().unwrap_or(&[]))
    }

    /// Seed a create payload with name, action and compiled conditions.
    fn base_payload(
        name: &str,
        action: Option<&str>,
        blocks: Vec<ConditionBlock>,
    ) -> ZpaResult<Map<String, Value>> {
        let mut payload = Map::new();
        payload.insert("name".into(), json!(name));
        if let Some(action) = action {
            payload.insert("action".into(), json!(action.to_uppercase()));
        }
        payload.insert("conditions".into(), serde_json::to_value(&blocks)?);
        Ok(payload)
    }

    fn apply_timeout_defaults(payload: &mut Map<String, Value>, fields: &RuleFields) {
        payload.insert(
            "reauthTimeout".into(),
            json!(fields.re_auth_timeout.unwrap_or(DEFAULT_REAUTH_TIMEOUT)),
        );
        payload.insert(
            "reauthIdleTimeout".into(),
            json!(
                fields
                    .re_auth_idle_timeout
                    .unwrap_or(DEFAULT_REAUTH_IDLE_TIMEOUT)
            ),
        );
    }

    fn validate_redirection_action(action: &str, fields: &RuleFields) -> ZpaResult<()> {
        let lowered = action.to_lowercase();
        match lowered.as_str() {
            "redirect_default" if !fields.service_edge_group_ids.is_empty() => {
                Err(ZpaError::InvalidArgument(
                    "service_edge_group_ids cannot be set when action is 'redirect_default'"
                        .into(),
                ))
            }
            "redirect_preferred" | "redirect_always"
                if fields.service_edge_group_ids.is_empty() =>
            {
                Err(ZpaError::MissingRequiredField {
                    field: "service_edge_group_ids",
                })
            }
            _ => Ok(()),
        }
    }

    fn validate_redirection_client_types(blocks: &[ConditionBlock]) -> ZpaResult<()> {
        for operand in blocks.iter().flat_map(|block| block.operands.iter()) {
            if operand.object_type == "CLIENT_TYPE" {
                if let Some(first) = operand.values.first() {
                    if !REDIRECTION_CLIENT_TYPES.contains(&first.as_str()) {
                        return Err(ZpaError::InvalidArgument(format!(
                            "Invalid client_type value: {first}. Must be one of \
                             {REDIRECTION_CLIENT_TYPES:?}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    async fn current_document(
        &self,
        policy_type: PolicyType,
        rule_id: &str,
    ) -> ZpaResult<Map<String, Value>> {
        let policy_id = self.policy_id(policy_type).await?;
        let doc = self
            .client
            .get(&format!("policySet/{policy_id}/rule/{rule_id}"))
            .await?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Merge fields over the current document, v1 condition semantics:
    /// omitted conditions reset to an empty list.
    async fn merged_v1_payload(
        &self,
        policy_type: PolicyType,
        rule_id: &str,
        fields: &RuleFields,
        pinned_action: Option<&str>,
    ) -> ZpaResult<Map<String, Value>> {
        let mut payload = self.current_document(policy_type, rule_id).await?;
        fields.apply_to(&mut payload)?;
        let blocks = match &fields.conditions {
            Some(conditions) => compile_conditions_v1(conditions)?,
            // Omitting conditions clears them; everything else is preserved.
            None => Vec::new(),
        };
        payload.insert("conditions".into(), serde_json::to_value(&blocks)?);
        if let Some(action) = pinned_action {
            payload.insert("action".into(), json!(action));
        }
        Ok(payload)
    }

    /// Merge fields over the current document, v2 condition semantics:
    /// an untouched or empty conditions key is dropped before the PUT.
    async fn merged_v2_payload(
        &self,
        policy_type: PolicyType,
        rule_id: &str,
        fields: &RuleFields,
        pinned_action: Option<&str>,
    ) -> ZpaResult<Map<String, Value>> {
        let mut payload = self.current_document(policy_type, rule_id).await?;
        if fields.conditions.is_none() {
            payload.remove("conditions");
        }
        fields.apply_to(&mut payload)?;
        if let Some(conditions) = &fields.conditions {
            let blocks = compile_conditions_v2(conditions)?;
            if blocks.is_empty() {
                payload.remove("conditions");
            } else {
                payload.insert("conditions".into(), serde_json::to_value(&blocks)?);
            }
        }
        if let Some(action) = pinned_action {
            payload.insert("action".into(), json!(action));
        }
        Ok(payload)
    }

    async fn create_rule(
        &self,
        policy_type: PolicyType,
        payload: Map<String, Value>,
        version: ApiVersion,
    ) -> ZpaResult<PolicyRule> {
        let policy_id = self.policy_id(policy_type).await?;
        let created = self
            .client
            .post(
                &format!("policySet/{policy_id}/rule"),
                &Value::Object(payload),
                version,
            )
            .await?;
        Ok(serde_json::from_value(created)?)
    }

    async fn update_rule(
        &self,
        policy_type: PolicyType,
        rule_id: &str,
        payload: Map<String, Value>,
        version: ApiVersion,
    ) -> ZpaResult<PolicyRule> {
        let policy_id = self.policy_id(policy_type).await?;
        let status = self
            .client
            .put(
                &format!("policySet/{policy_id}/rule/{rule_id}"),
                &Value::Object(payload),
                version,
            )
            .await?;
        if status.status != 204 {
            return Err(ZpaError::RemoteRejected {
                status: status.status,
                body: status.body,
            });
        }
        // Confirm the write; a silent empty read would mask data loss.
        let updated = self
            .client
            .get(&format!("policySet/{policy_id}/rule/{rule_id}"))
            .await?;
        if updated.is_null() {
            return Err(ZpaError::StaleReadAfterWrite {
                rule_id: rule_id.to_string(),
            });
        }
        Ok(serde_json::from_value(updated)?)
    }
}
