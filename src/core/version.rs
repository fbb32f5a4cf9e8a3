//! Version and publish lifecycle of a schema lineage.
//!
//! A lineage is an append-only chain of snapshots. New drafts are deep copies of
//! the latest snapshot; publishing validates first and never applies partially.

use std::fmt;

use chrono::Utc;
use tracing::{info, warn};

use super::definitions::Schema;
use super::element::{Element, ElementType};
use super::graph::SchemaGraph;
use crate::error::{Error, Result};
use crate::types::{ElementId, NonEmptyVec, SchemaId};

/// A graph invariant that blocks publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    DecisionWithoutBranch { element: ElementId, name: String },
    MissingStart,
    MissingEnd,
    EndUnreachable,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DecisionWithoutBranch { element, name } => {
                write!(f, "decision {name:?} ({element}) has no outgoing branch")
            }
            Self::MissingStart => f.write_str("schema has no START element"),
            Self::MissingEnd => f.write_str("schema has no END element"),
            Self::EndUnreachable => f.write_str("no END element is reachable from a START"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Switch every other published version of the lineage off in the same step.
    pub unpublish_others: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub published: SchemaId,
    pub unpublished: Vec<SchemaId>,
}

/// Every unmet publish invariant of `graph`, in a stable order.
pub fn validate(graph: &SchemaGraph) -> Vec<Violation> {
    let mut violations = graph
        .elements_of_type(ElementType::Decision)
        .filter(|decision| graph.outgoing(decision.id()).is_empty())
        .map(|decision| Violation::DecisionWithoutBranch {
            element: decision.id(),
            name: decision.name().to_owned(),
        })
        .collect::<Vec<_>>();

    let starts = graph
        .elements_of_type(ElementType::Start)
        .map(Element::id)
        .collect::<Vec<_>>();
    let ends = graph
        .elements_of_type(ElementType::End)
        .map(Element::id)
        .collect::<Vec<_>>();
    if starts.is_empty() {
        violations.push(Violation::MissingStart);
    }
    if ends.is_empty() {
        violations.push(Violation::MissingEnd);
    }
    if !starts.is_empty() && !ends.is_empty() {
        let reachable = starts
            .iter()
            .any(|start| ends.iter().any(|end| graph.reaches(*start, *end)));
        if !reachable {
            violations.push(Violation::EndUnreachable);
        }
    }
    violations
}

/// Deep-copy `source` into a fresh draft at `version + 1`.
pub fn create_new_version(source: &Schema) -> Schema {
    let (graph, _) = source.graph().rehomed(SchemaId::new());
    let draft = source.next_version(graph);
    info!(
        lineage = %draft.lineage(),
        from = %source.id(),
        to = %draft.id(),
        version = draft.version(),
        "created schema version"
    );
    draft
}

#[derive(Debug, Clone)]
pub struct Lineage {
    versions: Vec<Schema>,
}

impl Lineage {
    pub fn new(first: Schema) -> Self {
        Self {
            versions: vec![first],
        }
    }

    /// Versions in ascending version order.
    pub fn versions(&self) -> &[Schema] {
        &self.versions
    }

    pub fn latest(&self) -> &Schema {
        // `versions` is never empty: it starts with one and only grows.
        &self.versions[self.versions.len() - 1]
    }

    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.versions.iter().find(|schema| schema.id() == id)
    }

    pub fn get_mut(&mut self, id: SchemaId) -> Result<&mut Schema> {
        self.versions
            .iter_mut()
            .find(|schema| schema.id() == id)
            .ok_or(Error::VersionNotFound(id))
    }

    pub fn published(&self) -> impl Iterator<Item = &Schema> {
        self.versions.iter().filter(|schema| schema.is_published())
    }

    /// Clone the latest snapshot into a new draft and return it.
    pub fn create_new_version(&mut self) -> &Schema {
        let draft = create_new_version(self.latest());
        self.versions.push(draft);
        self.latest()
    }

    pub fn publish(&mut self, id: SchemaId, options: PublishOptions) -> Result<PublishReport> {
        let schema = self.get(id).ok_or(Error::VersionNotFound(id))?;
        if let Some(violations) = NonEmptyVec::from_vec(validate(schema.graph())) {
            warn!(schema = %id, count = violations.len(), "publish rejected");
            return Err(Error::PublishValidationFailed { violations });
        }

        let now = Utc::now();
        let mut unpublished = Vec::new();
        for schema in &mut self.versions {
            if schema.id() == id {
                if !schema.is_published() {
                    schema.mark_published(now);
                }
            } else if options.unpublish_others && schema.is_published() {
                schema.mark_withdrawn();
                unpublished.push(schema.id());
            }
        }
        info!(schema = %id, unpublished = unpublished.len(), "published schema version");
        Ok(PublishReport {
            published: id,
            unpublished,
        })
    }
}

/// A content difference between two versions, located by creation index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDifference {
    ElementCount { left: usize, right: usize },
    Element { index: usize, field: &'static str },
    ConnectionCount { left: usize, right: usize },
    Connection { index: usize, field: &'static str },
}

/// Compare two snapshots ignoring ids, schema ids and version numbers.
pub fn diff(left: &SchemaGraph, right: &SchemaGraph) -> Vec<ContentDifference> {
    let mut differences = Vec::new();
    let left_elements = left.elements().collect::<Vec<_>>();
    let right_elements = right.elements().collect::<Vec<_>>();
    if left_elements.len() != right_elements.len() {
        differences.push(ContentDifference::ElementCount {
            left: left_elements.len(),
            right: right_elements.len(),
        });
    }
    for (index, (a, b)) in left_elements.iter().zip(&right_elements).enumerate() {
        let fields = [
            ("elementType", a.element_type() == b.element_type()),
            ("name", a.name() == b.name()),
            ("position", a.position() == b.position()),
            ("size", a.size() == b.size()),
            ("properties", a.properties() == b.properties()),
        ];
        for (field, same) in fields {
            if !same {
                differences.push(ContentDifference::Element { index, field });
            }
        }
    }

    let left_index = creation_index(left);
    let right_index = creation_index(right);
    let left_connections = left.connections();
    let right_connections = right.connections();
    if left_connections.len() != right_connections.len() {
        differences.push(ContentDifference::ConnectionCount {
            left: left_connections.len(),
            right: right_connections.len(),
        });
    }
    for (index, (a, b)) in left_connections.iter().zip(&right_connections).enumerate() {
        let endpoints = |graph_index: &[ElementId], id: ElementId| {
            graph_index.iter().position(|e| *e == id)
        };
        let fields = [
            (
                "source",
                endpoints(&left_index, a.source()) == endpoints(&right_index, b.source()),
            ),
            (
                "target",
                endpoints(&left_index, a.target()) == endpoints(&right_index, b.target()),
            ),
            ("connectionType", a.connection_type() == b.connection_type()),
            ("label", a.label() == b.label()),
            (
                "condition",
                a.condition().to_wire(left) == b.condition().to_wire(right),
            ),
        ];
        for (field, same) in fields {
            if !same {
                differences.push(ContentDifference::Connection { index, field });
            }
        }
    }
    differences
}

fn creation_index(graph: &SchemaGraph) -> Vec<ElementId> {
    graph.elements().map(Element::id).collect()
}
