//! Schema graph data model, transactional intents and the version lifecycle.

pub mod condition;
pub mod connection;
pub mod definitions;
pub mod element;
pub mod graph;
pub mod intent;
pub mod properties;
pub mod version;

pub use condition::{
    Condition, ConditionWire, ElementNames, FieldRef, LabelRotation, Rule, RuleField, RuleOp,
    RuleType, RuleWire, ValueType,
};
pub use connection::{Connection, ConnectionType};
pub use definitions::{Schema, SchemaSummary, VersionStatus};
pub use element::{Element, ElementType};
pub use graph::{RemovedElement, SchemaGraph};
pub use intent::{apply_ops, ApplyResult, Delta, GraphOp, Intent};
pub use properties::{
    ApprovalConfig, ApprovalStage, DecisionConfig, EventConfig, NodeConfig, ProcessConfig,
};
pub use version::{
    create_new_version, diff, validate, ContentDifference, Lineage, PublishOptions,
    PublishReport, Violation,
};
