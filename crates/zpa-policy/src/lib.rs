//! Policy rule management for the ZPA policy engine.
//!
//! The centerpiece of this crate is the condition compiler: callers describe
//! rule conditions with flat [`Condition`] descriptors and the compiler turns
//! them into the nested, object-type-keyed operator tree the remote policy
//! engine expects — in either of the two incompatible schema generations
//! (v1 and v2). Around it sit the policy-type registry, the privileged
//! capability encoder, the rule CRUD orchestrator and the rule ordering
//! engine.
//!
//! ## Condition grammar at a glance
//!
//! v1 descriptors are (object type, lhs, rhs) triples; v2 descriptors carry
//! either a flat value list or lhs/rhs entry pairs depending on the object
//! type:
//!
//! ```
//! use zpa_policy::Condition;
//!
//! // v1
//! let v1 = vec![
//!     Condition::simple("app", "id", "99999"),
//!     Condition::simple("client_type", "id", "zpn_client_type_zapp"),
//! ];
//!
//! // v2
//! let v2 = vec![
//!     Condition::values("app", ["99999"]),
//!     Condition::entry("posture", "b15e4cad-fa6e", "true"),
//! ];
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod capabilities;
mod conditions;
mod fields;
mod ordering;
mod policy_sets;
mod policy_type;

pub use capabilities::PrivilegedCapabilities;
pub use conditions::{
    Condition, ConditionBlock, ConditionOperator, EntryValue, EXPORTER_CLIENT_TYPE, ObjectType,
    Operand, V1_CLIENT_TYPES, compile_conditions_v1, compile_conditions_v2,
    ensure_client_type_default,
};
pub use fields::RuleFields;
pub use policy_sets::{PolicyRule, PolicySet, PolicySetsApi, REDIRECTION_CLIENT_TYPES};
pub use policy_type::PolicyType;
