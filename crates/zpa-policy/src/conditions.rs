//! Condition descriptors and the v1/v2 condition compilers.
//!
//! Callers describe conditions with flat [`Condition`] descriptors; the
//! policy engine wants a nested operator tree whose exact shape depends on
//! both the schema generation and the object type of every operand. The two
//! compilers in this module own that transformation and nothing else — they
//! are pure functions over their input.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use zpa_core::{ApiVersion, ZpaError, ZpaResult};

/// Client types accepted by the v1 compiler for `CLIENT_TYPE` operands.
pub const V1_CLIENT_TYPES: [&str; 6] = [
    "zpn_client_type_exporter",
    "zpn_client_type_machine_tunnel",
    "zpn_client_type_ip_anchoring",
    "zpn_client_type_edge_connector",
    "zpn_client_type_zapp",
    "zpn_client_type_slogger",
];

/// Client type injected into isolation rules that carry none.
pub const EXPORTER_CLIENT_TYPE: &str = "zpn_client_type_exporter";

// ─────────────────────────────────────────────────────────────────────────────
// Object types
// ─────────────────────────────────────────────────────────────────────────────

/// Condition object-type vocabulary.
///
/// Parsing is case-insensitive; tokens outside the fixed vocabulary land in
/// `Other` so the v2 compiler can apply its forward-compatibility fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    App,
    AppGroup,
    BranchConnectorGroup,
    ClientType,
    Console,
    CountryCode,
    EdgeConnectorGroup,
    Idp,
    Location,
    MachineGrp,
    Platform,
    Posture,
    Saml,
    Scim,
    ScimGroup,
    TrustedNetwork,
    /// Unrecognized token, kept uppercased.
    Other(String),
}

impl ObjectType {
    /// The uppercase wire token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::App => "APP",
            Self::AppGroup => "APP_GROUP",
            Self::BranchConnectorGroup => "BRANCH_CONNECTOR_GROUP",
            Self::ClientType => "CLIENT_TYPE",
            Self::Console => "CONSOLE",
            Self::CountryCode => "COUNTRY_CODE",
            Self::EdgeConnectorGroup => "EDGE_CONNECTOR_GROUP",
            Self::Idp => "IDP",
            Self::Location => "LOCATION",
            Self::MachineGrp => "MACHINE_GRP",
            Self::Platform => "PLATFORM",
            Self::Posture => "POSTURE",
            Self::Saml => "SAML",
            Self::Scim => "SCIM",
            Self::ScimGroup => "SCIM_GROUP",
            Self::TrustedNetwork => "TRUSTED_NETWORK",
            Self::Other(token) => token,
        }
    }
}

impl ObjectType {
    /// Position of this type's bucket in [`V1_BUCKET_ORDER`].
    ///
    /// `None` for APP/APP_GROUP (shared accumulator, not a bucket) and for
    /// unrecognized types. Exhaustive so that a vocabulary edit fails to
    /// compile until the new type is assigned a bucket or excluded here.
    const fn v1_bucket(&self) -> Option<usize> {
        match self {
            Self::Console => Some(0),
            Self::MachineGrp => Some(1),
            Self::Location => Some(2),
            Self::BranchConnectorGroup => Some(3),
            Self::EdgeConnectorGroup => Some(4),
            Self::ClientType => Some(5),
            Self::Idp => Some(6),
            Self::Platform => Some(7),
            Self::Posture => Some(8),
            Self::TrustedNetwork => Some(9),
            Self::Saml => Some(10),
            Self::Scim => Some(11),
            Self::ScimGroup => Some(12),
            Self::CountryCode => Some(13),
            Self::App | Self::AppGroup | Self::Other(_) => None,
        }
    }
}

impl From<&str> for ObjectType {
    fn from(token: &str) -> Self {
        match token.to_uppercase().as_str() {
            "APP" => Self::App,
            "APP_GROUP" => Self::AppGroup,
            "BRANCH_CONNECTOR_GROUP" => Self::BranchConnectorGroup,
            "CLIENT_TYPE" => Self::ClientType,
            "CONSOLE" => Self::Console,
            "COUNTRY_CODE" => Self::CountryCode,
            "EDGE_CONNECTOR_GROUP" => Self::EdgeConnectorGroup,
            "IDP" => Self::Idp,
            "LOCATION" => Self::Location,
            "MACHINE_GRP" => Self::MachineGrp,
            "PLATFORM" => Self::Platform,
            "POSTURE" => Self::Posture,
            "SAML" => Self::Saml,
            "SCIM" => Self::Scim,
            "SCIM_GROUP" => Self::ScimGroup,
            "TRUSTED_NETWORK" => Self::TrustedNetwork,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiled condition tree
// ─────────────────────────────────────────────────────────────────────────────

/// Logical operator joining the operands of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionOperator {
    And,
    Or,
}

/// One lhs/rhs pair of the v2 `entryValues` representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryValue {
    pub lhs: String,
    pub rhs: String,
}

impl EntryValue {
    /// Build an entry pair.
    #[must_use]
    pub fn new(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

/// One atomic condition term.
///
/// Which fields are populated depends on the schema generation: v1 operands
/// carry `lhs`/`rhs`, v2 operands carry `values` or `entryValues`. Fields the
/// client does not model survive in `extra` so that server documents round
/// trip losslessly through an update merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lhs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry_values: Vec<EntryValue>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl Operand {
    fn base(object_type: &ObjectType) -> Self {
        Self {
            object_type: object_type.as_str().to_string(),
            ..Self::default()
        }
    }

    /// v1 operand matching a resource by id: `{objectType, lhs: "id", rhs}`.
    #[must_use]
    pub fn id_match(object_type: &ObjectType, rhs: impl Into<String>) -> Self {
        Self {
            lhs: Some("id".to_string()),
            rhs: Some(rhs.into()),
            ..Self::base(object_type)
        }
    }

    /// v1 operand preserving the caller-supplied lhs.
    #[must_use]
    pub fn lhs_rhs(
        object_type: &ObjectType,
        lhs: impl Into<String>,
        rhs: impl Into<String>,
    ) -> Self {
        Self {
            lhs: Some(lhs.into()),
            rhs: Some(rhs.into()),
            ..Self::base(object_type)
        }
    }

    /// v2 flat-values operand.
    #[must_use]
    pub fn with_values<I, S>(object_type: &ObjectType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::base(object_type)
        }
    }

    /// v2 entry-values operand.
    #[must_use]
    pub fn with_entries(object_type: &ObjectType, entries: Vec<EntryValue>) -> Self {
        Self {
            entry_values: entries,
            ..Self::base(object_type)
        }
    }
}

/// One unit of the compiled condition tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<ConditionOperator>,
    #[serde(default)]
    pub operands: Vec<Operand>,
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl ConditionBlock {
    fn or_group(operands: Vec<Operand>) -> Self {
        Self {
            operator: Some(ConditionOperator::Or),
            operands,
            ..Self::default()
        }
    }

    fn single(operand: Operand) -> Self {
        Self {
            operands: vec![operand],
            ..Self::default()
        }
    }

    /// Whether any operand of this block targets the given object type.
    #[must_use]
    pub fn mentions(&self, object_type: &ObjectType) -> bool {
        self.operands
            .iter()
            .any(|operand| operand.object_type == object_type.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Caller-facing condition descriptors
// ─────────────────────────────────────────────────────────────────────────────

/// A caller-supplied condition descriptor.
///
/// `Simple` and `Block` belong to the v1 grammar, `Values` and `Entries` to
/// the v2 grammar; handing a descriptor to the wrong compiler is a
/// [`ZpaError::MalformedCondition`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// v1 (object type, lhs, rhs) triple.
    Simple {
        object_type: ObjectType,
        lhs: String,
        rhs: String,
    },
    /// v2 flat value list.
    Values {
        object_type: ObjectType,
        values: Vec<String>,
    },
    /// v2 lhs/rhs entry pairs.
    Entries {
        object_type: ObjectType,
        entries: Vec<EntryValue>,
    },
    /// Pre-built block forwarded verbatim (v1 only).
    Block(ConditionBlock),
}

impl Condition {
    /// v1 triple descriptor.
    #[must_use]
    pub fn simple(
        object_type: impl Into<ObjectType>,
        lhs: impl Into<String>,
        rhs: impl Into<String>,
    ) -> Self {
        Self::Simple {
            object_type: object_type.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// v2 flat-values descriptor.
    #[must_use]
    pub fn values<I, S>(object_type: impl Into<ObjectType>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values {
            object_type: object_type.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// v2 entry-pair descriptor.
    #[must_use]
    pub fn entries<I>(object_type: impl Into<ObjectType>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::Entries {
            object_type: object_type.into(),
            entries: pairs
                .into_iter()
                .map(|(lhs, rhs)| EntryValue::new(lhs, rhs))
                .collect(),
        }
    }

    /// v2 single entry-pair descriptor (posture-class object types).
    #[must_use]
    pub fn entry(
        object_type: impl Into<ObjectType>,
        lhs: impl Into<String>,
        rhs: impl Into<String>,
    ) -> Self {
        Self::Entries {
            object_type: object_type.into(),
            entries: vec![EntryValue::new(lhs, rhs)],
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler v1
// ─────────────────────────────────────────────────────────────────────────────

/// Emission order of the per-object-type buckets in the v1 output.
const V1_BUCKET_ORDER: [ObjectType; 14] = [
    ObjectType::Console,
    ObjectType::MachineGrp,
    ObjectType::Location,
    ObjectType::BranchConnectorGroup,
    ObjectType::EdgeConnectorGroup,
    ObjectType::ClientType,
    ObjectType::Idp,
    ObjectType::Platform,
    ObjectType::Posture,
    ObjectType::TrustedNetwork,
    ObjectType::Saml,
    ObjectType::Scim,
    ObjectType::ScimGroup,
    ObjectType::CountryCode,
];

/// Compile v1 condition descriptors into the nested v1 operator tree.
///
/// Grouping rules: pre-built blocks pass through in input order and are
/// emitted first; all APP/APP_GROUP triples collapse into a single `OR`
/// block; every other recognized object type gets one `OR` block in the
/// fixed bucket order. `CLIENT_TYPE` values outside [`V1_CLIENT_TYPES`] and
/// triples with an unrecognized object type are dropped without error,
/// matching the policy engine's established (loose) contract.
///
/// # Errors
///
/// v2-shaped descriptors are rejected with [`ZpaError::MalformedCondition`].
pub fn compile_conditions_v1(conditions: &[Condition]) -> ZpaResult<Vec<ConditionBlock>> {
    let mut template = Vec::new();
    let mut app_operands: Vec<Operand> = Vec::new();
    let mut buckets: [Vec<Operand>; V1_BUCKET_ORDER.len()] = Default::default();

    for condition in conditions {
        match condition {
            Condition::Simple {
                object_type,
                lhs,
                rhs,
            } => match object_type {
                ObjectType::App | ObjectType::AppGroup => {
                    app_operands.push(Operand::id_match(object_type, rhs));
                }
                ObjectType::ClientType => {
                    if V1_CLIENT_TYPES.contains(&rhs.as_str()) {
                        if let Some(index) = object_type.v1_bucket() {
                            buckets[index].push(Operand::id_match(object_type, rhs));
                        }
                    }
                }
                ObjectType::Platform
                | ObjectType::Posture
                | ObjectType::TrustedNetwork
                | ObjectType::Saml
                | ObjectType::Scim
                | ObjectType::ScimGroup
                | ObjectType::CountryCode => {
                    if let Some(index) = object_type.v1_bucket() {
                        buckets[index].push(Operand::lhs_rhs(object_type, lhs, rhs));
                    }
                }
                ObjectType::Console
                | ObjectType::MachineGrp
                | ObjectType::Location
                | ObjectType::BranchConnectorGroup
                | ObjectType::EdgeConnectorGroup
                | ObjectType::Idp => {
                    if let Some(index) = object_type.v1_bucket() {
                        buckets[index].push(Operand::id_match(object_type, rhs));
                    }
                }
                ObjectType::Other(token) => {
                    debug!(object_type = %token, "dropping condition with unknown object type");
                }
            },
            Condition::Block(block) => template.push(block.clone()),
            Condition::Values { object_type, .. } | Condition::Entries { object_type, .. } => {
                return Err(ZpaError::malformed(format!(
                    "{object_type} descriptor uses the v2 shape; v1 conditions are \
                     (object type, lhs, rhs) triples"
                )));
            }
        }
    }

    if !app_operands.is_empty() {
        template.push(ConditionBlock::or_group(app_operands));
    }
    for (index, _) in V1_BUCKET_ORDER.iter().enumerate() {
        if !buckets[index].is_empty() {
            template.push(ConditionBlock::or_group(std::mem::take(
                &mut buckets[index],
            )));
        }
    }

    Ok(template)
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler v2
// ─────────────────────────────────────────────────────────────────────────────

/// Compile v2 condition descriptors into the nested v2 operator tree.
///
/// Branching rules per object type: APP/APP_GROUP accumulate into one shared
/// trailing block; console/machine_grp/location/branch_connector_group/
/// edge_connector_group/client_type each emit their own block immediately;
/// saml/scim/scim_group turn entry pairs into `entryValues`; posture/
/// trusted_network/country_code/platform take exactly one entry pair.
/// Anything else falls through to the flat-values shape as a
/// forward-compatibility escape hatch.
///
/// # Errors
///
/// [`ZpaError::MalformedCondition`] when a descriptor's value shape does not
/// match its object type, or when a v1-shaped descriptor is supplied.
pub fn compile_conditions_v2(conditions: &[Condition]) -> ZpaResult<Vec<ConditionBlock>> {
    let mut template = Vec::new();
    let mut app_operands: Vec<Operand> = Vec::new();

    for condition in conditions {
        match condition {
            Condition::Values {
                object_type,
                values,
            } => match object_type {
                ObjectType::App | ObjectType::AppGroup => {
                    app_operands.push(Operand::with_values(object_type, values.clone()));
                }
                ObjectType::Console
                | ObjectType::MachineGrp
                | ObjectType::Location
                | ObjectType::BranchConnectorGroup
                | ObjectType::EdgeConnectorGroup
                | ObjectType::ClientType => {
                    template.push(ConditionBlock::single(Operand::with_values(
                        object_type,
                        values.clone(),
                    )));
                }
                ObjectType::Saml
                | ObjectType::Scim
                | ObjectType::ScimGroup
                | ObjectType::Posture
                | ObjectType::TrustedNetwork
                | ObjectType::CountryCode
                | ObjectType::Platform => {
                    return Err(ZpaError::malformed(format!(
                        "{object_type} conditions take (lhs, rhs) entries, not a flat value list"
                    )));
                }
                // Forward-compatibility escape hatch for unanticipated types.
                ObjectType::Idp | ObjectType::Other(_) => {
                    template.push(ConditionBlock::single(Operand::with_values(
                        object_type,
                        values.clone(),
                    )));
                }
            },
            Condition::Entries {
                object_type,
                entries,
            } => match object_type {
                ObjectType::Saml | ObjectType::Scim | ObjectType::ScimGroup => {
                    template.push(ConditionBlock::single(Operand::with_entries(
                        object_type,
                        entries.clone(),
                    )));
                }
                ObjectType::Posture
                | ObjectType::TrustedNetwork
                | ObjectType::CountryCode
                | ObjectType::Platform => {
                    if entries.len() != 1 {
                        return Err(ZpaError::malformed(format!(
                            "{object_type} conditions take exactly one (lhs, rhs) entry, \
                             got {}",
                            entries.len()
                        )));
                    }
                    template.push(ConditionBlock::single(Operand::with_entries(
                        object_type,
                        entries.clone(),
                    )));
                }
                _ => {
                    return Err(ZpaError::malformed(format!(
                        "{object_type} conditions take a flat value list, not (lhs, rhs) entries"
                    )));
                }
            },
            Condition::Simple { object_type, .. } => {
                return Err(ZpaError::malformed(format!(
                    "{object_type} descriptor uses the v1 triple shape; v2 conditions are \
                     (object type, values) pairs"
                )));
            }
            Condition::Block(_) => {
                return Err(ZpaError::malformed(
                    "pre-built condition blocks are only valid in the v1 grammar",
                ));
            }
        }
    }

    if !app_operands.is_empty() {
        template.push(ConditionBlock {
            operands: app_operands,
            ..ConditionBlock::default()
        });
    }

    Ok(template)
}

/// Append the default `CLIENT_TYPE` condition when none is present.
///
/// Isolation rules must always constrain the client type; the platform
/// defaults them to the exporter client when the caller supplies none.
pub fn ensure_client_type_default(blocks: &mut Vec<ConditionBlock>, version: ApiVersion) {
    if blocks.iter().any(|b| b.mentions(&ObjectType::ClientType)) {
        return;
    }
    let block = match version {
        ApiVersion::V1 => ConditionBlock::or_group(vec![Operand::id_match(
            &ObjectType::ClientType,
            EXPORTER_CLIENT_TYPE,
        )]),
        ApiVersion::V2 => ConditionBlock::single(Operand::with_values(
            &ObjectType::ClientType,
            [EXPORTER_CLIENT_TYPE],
        )),
    };
    blocks.push(block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn bucket_indices_agree_with_the_emission_order() {
        for (index, object_type) in V1_BUCKET_ORDER.iter().enumerate() {
            assert_eq!(object_type.v1_bucket(), Some(index), "{object_type}");
        }
        assert_eq!(ObjectType::App.v1_bucket(), None);
        assert_eq!(ObjectType::AppGroup.v1_bucket(), None);
        assert_eq!(ObjectType::Other("MYSTERY".into()).v1_bucket(), None);
    }

    #[test]
    fn object_type_parse_is_case_insensitive() {
        assert_eq!(ObjectType::from("app_group"), ObjectType::AppGroup);
        assert_eq!(ObjectType::from("App_Group"), ObjectType::AppGroup);
        assert_eq!(
            ObjectType::from("mystery"),
            ObjectType::Other("MYSTERY".into())
        );
    }

    #[test]
    fn v1_groups_app_and_app_group_into_one_or_block() {
        let blocks = compile_conditions_v1(&[
            Condition::simple("app", "id", "1"),
            Condition::simple("app_group", "id", "2"),
            Condition::simple("location", "id", "3"),
        ])
        .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].operator, Some(ConditionOperator::Or));
        assert_eq!(blocks[0].operands.len(), 2);
        assert_eq!(blocks[0].operands[0].object_type, "APP");
        assert_eq!(blocks[0].operands[0].rhs.as_deref(), Some("1"));
        assert_eq!(blocks[0].operands[1].object_type, "APP_GROUP");
        assert_eq!(blocks[0].operands[1].rhs.as_deref(), Some("2"));
        assert_eq!(blocks[1].operator, Some(ConditionOperator::Or));
        assert_eq!(blocks[1].operands.len(), 1);
        assert_eq!(blocks[1].operands[0].object_type, "LOCATION");
        assert_eq!(blocks[1].operands[0].lhs.as_deref(), Some("id"));
    }

    #[test]
    fn v1_drops_unrecognized_client_type_tokens() {
        let blocks =
            compile_conditions_v1(&[Condition::simple("client_type", "id", "bogus_token")])
                .unwrap();
        assert!(blocks.is_empty());
    }

    #[test]
    fn v1_keeps_whitelisted_client_types() {
        let blocks =
            compile_conditions_v1(&[Condition::simple("client_type", "id", "zpn_client_type_zapp")])
                .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].operands[0].object_type, "CLIENT_TYPE");
        assert_eq!(
            blocks[0].operands[0].rhs.as_deref(),
            Some("zpn_client_type_zapp")
        );
    }

    #[test]
    fn v1_silently_ignores_unknown_object_types() {
        let blocks = compile_conditions_v1(&[
            Condition::simple("hologram", "id", "1"),
            Condition::simple("console", "id", "2"),
        ])
        .unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].operands[0].object_type, "CONSOLE");
    }

    #[test]
    fn v1_preserves_caller_lhs_for_identity_types() {
        let blocks = compile_conditions_v1(&[Condition::simple("saml", "idp-1", "attr-7")]).unwrap();
        assert_eq!(blocks[0].operands[0].lhs.as_deref(), Some("idp-1"));
        assert_eq!(blocks[0].operands[0].rhs.as_deref(), Some("attr-7"));
    }

    #[test]
    fn v1_emits_buckets_in_fixed_order_regardless_of_input_order() {
        let blocks = compile_conditions_v1(&[
            Condition::simple("saml", "idp-1", "attr"),
            Condition::simple("console", "id", "c1"),
            Condition::simple("posture", "udid-1", "true"),
        ])
        .unwrap();
        let order: Vec<&str> = blocks
            .iter()
            .map(|b| b.operands[0].object_type.as_str())
            .collect();
        assert_eq!(order, vec!["CONSOLE", "POSTURE", "SAML"]);
    }

    #[test]
    fn v1_passes_raw_blocks_through_before_synthesized_groups() {
        let raw = ConditionBlock {
            id: Some("77".into()),
            negated: Some(false),
            operator: Some(ConditionOperator::And),
            operands: vec![Operand {
                id: Some("op-1".into()),
                idp_id: Some("idp-9".into()),
                object_type: "SCIM_GROUP".into(),
                lhs: Some("idp-9".into()),
                rhs: Some("group-1".into()),
                ..Operand::default()
            }],
            ..ConditionBlock::default()
        };
        let blocks = compile_conditions_v1(&[
            Condition::simple("app", "id", "1"),
            Condition::Block(raw.clone()),
        ])
        .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], raw);
        assert_eq!(blocks[1].operands[0].object_type, "APP");
    }

    #[test]
    fn v1_rejects_v2_shaped_descriptors() {
        let err = compile_conditions_v1(&[Condition::values("app", ["1"])]).unwrap_err();
        assert!(matches!(err, ZpaError::MalformedCondition { .. }));
    }

    #[test]
    fn v1_grouping_is_idempotent_for_already_grouped_input() {
        let first = compile_conditions_v1(&[
            Condition::simple("app", "id", "1"),
            Condition::simple("app_group", "id", "2"),
            Condition::simple("location", "id", "3"),
        ])
        .unwrap();

        // Re-derive descriptors from the compiled output and compile again.
        let rederived: Vec<Condition> = first
            .iter()
            .flat_map(|block| block.operands.iter())
            .map(|operand| {
                Condition::simple(
                    operand.object_type.as_str(),
                    operand.lhs.clone().unwrap_or_default(),
                    operand.rhs.clone().unwrap_or_default(),
                )
            })
            .collect();
        let second = compile_conditions_v1(&rederived).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn v2_emits_immediate_blocks_first_and_app_group_last() {
        let blocks = compile_conditions_v2(&[
            Condition::values("app", ["a1"]),
            Condition::values("app_group", ["g1"]),
            Condition::values("client_type", ["zpn_client_type_zapp"]),
        ])
        .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].operands.len(), 1);
        assert_eq!(blocks[0].operands[0].object_type, "CLIENT_TYPE");
        assert_eq!(blocks[1].operands.len(), 2);
        assert_eq!(blocks[1].operands[0].object_type, "APP");
        assert_eq!(blocks[1].operands[0].values, vec!["a1"]);
        assert_eq!(blocks[1].operands[1].object_type, "APP_GROUP");
        assert_eq!(blocks[1].operands[1].values, vec!["g1"]);
    }

    #[test]
    fn v2_builds_entry_values_for_saml() {
        let blocks = compile_conditions_v2(&[Condition::entries(
            "saml",
            vec![
                ("idp1".to_string(), "attr1".to_string()),
                ("idp1".to_string(), "attr2".to_string()),
            ],
        )])
        .unwrap();

        assert_eq!(blocks.len(), 1);
        let operand = &blocks[0].operands[0];
        assert_eq!(operand.object_type, "SAML");
        assert_eq!(
            operand.entry_values,
            vec![
                EntryValue::new("idp1", "attr1"),
                EntryValue::new("idp1", "attr2"),
            ]
        );
    }

    #[test]
    fn v2_posture_takes_exactly_one_entry() {
        let blocks =
            compile_conditions_v2(&[Condition::entry("posture", "udid-1", "true")]).unwrap();
        assert_eq!(blocks[0].operands[0].entry_values.len(), 1);

        let err = compile_conditions_v2(&[Condition::entries(
            "posture",
            vec![
                ("a".to_string(), "true".to_string()),
                ("b".to_string(), "false".to_string()),
            ],
        )])
        .unwrap_err();
        assert!(matches!(err, ZpaError::MalformedCondition { .. }));
    }

    #[test]
    fn v2_rejects_flat_values_for_entry_types() {
        let err = compile_conditions_v2(&[Condition::values("scim_group", ["x"])]).unwrap_err();
        assert!(matches!(err, ZpaError::MalformedCondition { .. }));
    }

    #[test]
    fn v2_unknown_types_fall_back_to_flat_values() {
        let blocks = compile_conditions_v2(&[Condition::values("risk_factor", ["high"])]).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].operands[0].object_type, "RISK_FACTOR");
        assert_eq!(blocks[0].operands[0].values, vec!["high"]);
    }

    #[test]
    fn v2_separate_blocks_are_not_merged_per_type() {
        let blocks = compile_conditions_v2(&[
            Condition::values("console", ["c1"]),
            Condition::values("console", ["c2"]),
        ])
        .unwrap();
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn v2_rejects_v1_shaped_descriptors() {
        let err = compile_conditions_v2(&[Condition::simple("app", "id", "1")]).unwrap_err();
        assert!(matches!(err, ZpaError::MalformedCondition { .. }));
    }

    #[test]
    fn compiled_blocks_serialize_to_the_wire_shape() {
        let blocks = compile_conditions_v1(&[Condition::simple("app", "id", "1")]).unwrap();
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([{
                "operator": "OR",
                "operands": [{"objectType": "APP", "lhs": "id", "rhs": "1"}],
            }])
        );

        let blocks = compile_conditions_v2(&[Condition::entry("platform", "linux", "true")]).unwrap();
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([{
                "operands": [{
                    "objectType": "PLATFORM",
                    "entryValues": [{"lhs": "linux", "rhs": "true"}],
                }],
            }])
        );
    }

    #[test]
    fn client_type_default_is_synthesized_only_when_absent() {
        let mut blocks = Vec::new();
        ensure_client_type_default(&mut blocks, ApiVersion::V1);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].operator, Some(ConditionOperator::Or));
        assert_eq!(blocks[0].operands[0].object_type, "CLIENT_TYPE");
        assert_eq!(
            blocks[0].operands[0].rhs.as_deref(),
            Some(EXPORTER_CLIENT_TYPE)
        );

        // A second pass must not duplicate the default.
        ensure_client_type_default(&mut blocks, ApiVersion::V1);
        assert_eq!(blocks.len(), 1);

        let mut v2_blocks =
            compile_conditions_v2(&[Condition::values("client_type", ["zpn_client_type_zapp"])])
                .unwrap();
        ensure_client_type_default(&mut v2_blocks, ApiVersion::V2);
        assert_eq!(v2_blocks.len(), 1);

        let mut empty = Vec::new();
        ensure_client_type_default(&mut empty, ApiVersion::V2);
        assert_eq!(empty[0].operands[0].values, vec![EXPORTER_CLIENT_TYPE]);
    }

    #[test]
    fn server_documents_round_trip_through_the_block_type() {
        let doc = json!({
            "id": "1024",
            "operator": "OR",
            "creationTime": "1700000000",
            "operands": [{
                "id": "2048",
                "objectType": "APP",
                "lhs": "id",
                "rhs": "99",
                "creationTime": "1700000000",
            }],
        });
        let block: ConditionBlock = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(block.extra["creationTime"], "1700000000");
        assert_eq!(serde_json::to_value(&block).unwrap(), doc);
    }
}
