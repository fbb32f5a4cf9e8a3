use std::fmt::Display;

use thiserror::Error;

use crate::core::element::ElementType;
use crate::core::version::Violation;
use crate::runtime::navigator::MissingRequirement;
use crate::types::{ApplicationId, ConnectionId, ElementId, NonEmptyVec, SchemaId};

#[derive(Error, Debug)]
pub enum Error {
    #[error("connection {source_type} -> {target_type} is not allowed")]
    InvalidConnectionType {
        source_type: ElementType,
        target_type: ElementType,
    },

    #[error("decision {decision} has no outgoing branch")]
    NoBranchAvailable { decision: ElementId },

    #[error("decision {decision} could not be resolved at runtime")]
    UnresolvedDecision { decision: ElementId },

    #[error("publish validation failed: {}", join(.violations.iter()))]
    PublishValidationFailed { violations: NonEmptyVec<Violation> },

    #[error("step {element} is incomplete: {}", join(.missing.iter()))]
    StepIncomplete {
        element: ElementId,
        missing: Vec<MissingRequirement>,
    },

    #[error("element not found: {0}")]
    ElementNotFound(ElementId),

    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    #[error("element {element} belongs to schema {found}, expected {expected}")]
    ForeignElement {
        element: ElementId,
        expected: SchemaId,
        found: SchemaId,
    },

    #[error("element {element} is {expected}, properties were for {found}")]
    PropertiesTypeMismatch {
        element: ElementId,
        expected: ElementType,
        found: ElementType,
    },

    #[error("element already exists: {0}")]
    DuplicateElement(ElementId),

    #[error("connection already exists: {0}")]
    DuplicateConnection(ConnectionId),

    #[error("decision {decision} already has a branch labelled {label:?}")]
    DuplicateBranchLabel { decision: ElementId, label: String },

    #[error("approval gate {decision} only accepts reserved branch labels, got {label:?}")]
    ReservedBranchLabel { decision: ElementId, label: String },

    #[error("schema {0} is published and cannot be edited")]
    VersionImmutable(SchemaId),

    #[error("schema version not found: {0}")]
    VersionNotFound(SchemaId),

    #[error("element {0} is not a process step")]
    NotAProcessStep(ElementId),

    #[error("schema has no process step after its start")]
    NoFirstStep,

    #[error("an advance is already in flight")]
    AdvanceInProgress,

    #[error("no advance is pending")]
    NoAdvancePending,

    #[error("advance was prepared for application {found}, not {expected}")]
    ForeignAdvancePlan {
        expected: ApplicationId,
        found: ApplicationId,
    },

    #[error("run is already completed")]
    RunCompleted,

    #[error("already at the first step")]
    NoPreviousStep,

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl Error {
    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(err) if err.retryable)
    }
}

/// Failure reported by the entity-management collaborator.
#[derive(Error, Debug)]
#[error("collaborator request failed: {source}")]
pub struct StoreError {
    pub retryable: bool,
    pub source: anyhow::Error,
}

impl StoreError {
    pub fn retryable(source: impl Into<anyhow::Error>) -> Self {
        Self {
            retryable: true,
            source: source.into(),
        }
    }

    pub fn fatal(source: impl Into<anyhow::Error>) -> Self {
        Self {
            retryable: false,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn join<T: Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join("; ")
}
