//! Transactional editor intents.
//!
//! An `Intent` is what the user asked for; it expands to a fixed list of primitive
//! `GraphOp`s that are applied all-or-nothing. Applying returns the inverse ops so
//! the caller can roll the whole intent back later.

use std::collections::BTreeSet;

use tracing::debug;

use super::condition::Condition;
use super::connection::Connection;
use super::element::{Element, ElementType};
use super::graph::SchemaGraph;
use super::properties::NodeConfig;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::types::{ConnectionId, ElementId, Point};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    AddElement(Element),
    RemoveElement(ElementId),
    AddConnection(Connection),
    RestoreConnection(Connection),
    RemoveConnection(ConnectionId),
    MoveElement {
        element: ElementId,
        to: Point,
    },
    RenameElement {
        element: ElementId,
        name: String,
    },
    SetProperties {
        element: ElementId,
        properties: NodeConfig,
    },
    SetLabel {
        connection: ConnectionId,
        label: Option<String>,
    },
    SetCondition {
        connection: ConnectionId,
        condition: Condition,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    PlaceElement {
        element_type: ElementType,
        name: Option<String>,
        at: Point,
    },
    /// APPROVAL plus its DECISION and the edge between them.
    PlaceApproval {
        name: Option<String>,
        at: Point,
    },
    Connect {
        source: ElementId,
        target: ElementId,
        label: Option<String>,
        condition: Option<Condition>,
    },
    /// PROCESS→DECISION where the process ends in a strict approve/reject choice:
    /// the decision becomes a strict gate with both reserved branches scaffolded.
    ConnectApprovalGate {
        source: ElementId,
        decision: ElementId,
    },
    MoveElement {
        element: ElementId,
        to: Point,
    },
    RenameElement {
        element: ElementId,
        name: String,
    },
    UpdateProperties {
        element: ElementId,
        properties: NodeConfig,
    },
    UpdateConnection {
        connection: ConnectionId,
        label: Option<String>,
        condition: Condition,
    },
    DeleteElement(ElementId),
    DeleteConnection(ConnectionId),
}

/// What changed, by id. Coarse on purpose: enough to persist and refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub added_elements: Vec<ElementId>,
    pub updated_elements: Vec<ElementId>,
    pub removed_elements: Vec<ElementId>,
    pub added_connections: Vec<ConnectionId>,
    pub updated_connections: Vec<ConnectionId>,
    pub removed_connections: Vec<ConnectionId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added_elements.is_empty()
            && self.updated_elements.is_empty()
            && self.removed_elements.is_empty()
            && self.added_connections.is_empty()
            && self.updated_connections.is_empty()
            && self.removed_connections.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    pub delta: Delta,
    /// Ops that restore the pre-apply state, already in application order.
    pub undo: Vec<GraphOp>,
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added_elements: Vec<ElementId>,
    updated_elements: BTreeSet<ElementId>,
    removed_elements: Vec<ElementId>,
    added_connections: Vec<ConnectionId>,
    updated_connections: BTreeSet<ConnectionId>,
    removed_connections: Vec<ConnectionId>,
}

impl DeltaBuilder {
    fn element_added(&mut self, id: ElementId) {
        self.added_elements.push(id);
    }

    fn element_updated(&mut self, id: ElementId) {
        if !self.added_elements.contains(&id) {
            self.updated_elements.insert(id);
        }
    }

    fn element_removed(&mut self, id: ElementId) {
        self.updated_elements.remove(&id);
        if let Some(pos) = self.added_elements.iter().position(|e| *e == id) {
            self.added_elements.remove(pos);
        } else {
            self.removed_elements.push(id);
        }
    }

    fn connection_added(&mut self, id: ConnectionId) {
        self.added_connections.push(id);
    }

    fn connection_updated(&mut self, id: ConnectionId) {
        if !self.added_connections.contains(&id) {
            self.updated_connections.insert(id);
        }
    }

    fn connection_removed(&mut self, id: ConnectionId) {
        self.updated_connections.remove(&id);
        if let Some(pos) = self.added_connections.iter().position(|c| *c == id) {
            self.added_connections.remove(pos);
        } else {
            self.removed_connections.push(id);
        }
    }

    fn finish(self) -> Delta {
        Delta {
            added_elements: self.added_elements,
            updated_elements: self.updated_elements.into_iter().collect(),
            removed_elements: self.removed_elements,
            added_connections: self.added_connections,
            updated_connections: self.updated_connections.into_iter().collect(),
            removed_connections: self.removed_connections,
        }
    }
}

impl Intent {
    /// Expand into primitive ops against the current graph.
    pub fn expand(&self, graph: &SchemaGraph, config: &EngineConfig) -> Result<Vec<GraphOp>> {
        let schema_id = graph.schema_id();
        let ops = match self {
            Self::PlaceElement {
                element_type,
                name,
                at,
            } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| default_name(graph, *element_type, 0));
                vec![GraphOp::AddElement(sized(
                    Element::new(schema_id, *element_type, name, *at),
                    config,
                ))]
            }
            Self::PlaceApproval { name, at } => {
                let name = name
                    .clone()
                    .unwrap_or_else(|| default_name(graph, ElementType::Approval, 0));
                let approval = sized(
                    Element::new(schema_id, ElementType::Approval, name, *at),
                    config,
                );
                let decision = sized(
                    Element::new(
                        schema_id,
                        ElementType::Decision,
                        default_name(graph, ElementType::Decision, 0),
                        *at + config.scaffold.approval_decision_offset,
                    ),
                    config,
                );
                let edge = Connection::new(
                    schema_id,
                    approval.id(),
                    decision.id(),
                    Condition::new(config.branches.default_color.clone()),
                );
                vec![
                    GraphOp::AddElement(approval),
                    GraphOp::AddElement(decision),
                    GraphOp::AddConnection(edge),
                ]
            }
            Self::Connect {
                source,
                target,
                label,
                condition,
            } => {
                let condition = condition
                    .clone()
                    .unwrap_or_else(|| Condition::new(config.branches.default_color.clone()));
                let mut connection = Connection::new(schema_id, *source, *target, condition);
                if let Some(label) = label {
                    connection = connection.with_label(label.clone());
                }
                vec![GraphOp::AddConnection(connection)]
            }
            Self::ConnectApprovalGate { source, decision } => {
                approval_gate_ops(graph, config, *source, *decision)?
            }
            Self::MoveElement { element, to } => vec![GraphOp::MoveElement {
                element: *element,
                to: *to,
            }],
            Self::RenameElement { element, name } => vec![GraphOp::RenameElement {
                element: *element,
                name: name.clone(),
            }],
            Self::UpdateProperties {
                element,
                properties,
            } => vec![GraphOp::SetProperties {
                element: *element,
                properties: properties.clone(),
            }],
            Self::UpdateConnection {
                connection,
                label,
                condition,
            } => vec![
                GraphOp::SetLabel {
                    connection: *connection,
                    label: label.clone(),
                },
                GraphOp::SetCondition {
                    connection: *connection,
                    condition: condition.clone(),
                },
            ],
            Self::DeleteElement(id) => vec![GraphOp::RemoveElement(*id)],
            Self::DeleteConnection(id) => vec![GraphOp::RemoveConnection(*id)],
        };
        Ok(ops)
    }

    /// Expand and apply atomically.
    pub fn apply(&self, graph: &mut SchemaGraph, config: &EngineConfig) -> Result<ApplyResult> {
        let ops = self.expand(graph, config)?;
        apply_ops(graph, &ops)
    }
}

fn approval_gate_ops(
    graph: &SchemaGraph,
    config: &EngineConfig,
    source: ElementId,
    decision: ElementId,
) -> Result<Vec<GraphOp>> {
    let schema_id = graph.schema_id();
    let color = config.branches.default_color.clone();
    let mut ops = vec![GraphOp::AddConnection(Connection::new(
        schema_id,
        source,
        decision,
        Condition::new(color.clone()),
    ))];

    let decision_element = graph.require_element(decision)?;
    let Some(decision_config) = decision_element.properties().as_decision() else {
        // Not a decision; nothing to scaffold.
        return Ok(ops);
    };
    if !graph.outgoing(decision).is_empty() {
        return Ok(ops);
    }

    let mut gate = decision_config.clone();
    gate.strict_gate = Some(true);
    ops.push(GraphOp::SetProperties {
        element: decision,
        properties: NodeConfig::Decision(gate),
    });

    let origin = decision_element.position();
    let branches = [
        (
            config.branches.approved.clone(),
            config.scaffold.approved_branch_offset,
        ),
        (
            config.branches.rejected.clone(),
            config.scaffold.rejected_branch_offset,
        ),
    ];
    for (index, (label, offset)) in branches.into_iter().enumerate() {
        let placeholder = sized(
            Element::new(
                schema_id,
                ElementType::Process,
                default_name(graph, ElementType::Process, index),
                origin + offset,
            ),
            config,
        );
        let branch = Connection::new(
            schema_id,
            decision,
            placeholder.id(),
            Condition::new(color.clone()),
        )
        .with_label(label);
        ops.push(GraphOp::AddElement(placeholder));
        ops.push(GraphOp::AddConnection(branch));
    }
    Ok(ops)
}

fn sized(mut element: Element, config: &EngineConfig) -> Element {
    element.set_size(config.element_size);
    element
}

fn default_name(graph: &SchemaGraph, element_type: ElementType, offset: usize) -> String {
    let noun = match element_type {
        ElementType::Start => "Start",
        ElementType::End => "End",
        ElementType::Process => "Task",
        ElementType::Approval => "Approval",
        ElementType::Decision => "Decision",
    };
    let count = graph.elements_of_type(element_type).count();
    format!("{noun} {}", count + offset + 1)
}

/// Apply ops in order. Either every op lands or the graph is left untouched.
pub fn apply_ops(graph: &mut SchemaGraph, ops: &[GraphOp]) -> Result<ApplyResult> {
    let mut working = graph.clone();
    let mut delta = DeltaBuilder::default();
    let mut undo = Vec::with_capacity(ops.len());
    for op in ops {
        let mut inverse = apply_op(&mut working, op, &mut delta)?;
        inverse.reverse();
        undo.push(inverse);
    }
    *graph = working;
    let undo = undo.into_iter().rev().flatten().collect::<Vec<_>>();
    debug!(ops = ops.len(), "applied graph ops");
    Ok(ApplyResult {
        delta: delta.finish(),
        undo,
    })
}

// Returns the inverse ops in the order they were produced; the caller reverses.
fn apply_op(
    graph: &mut SchemaGraph,
    op: &GraphOp,
    delta: &mut DeltaBuilder,
) -> Result<Vec<GraphOp>> {
    match op {
        GraphOp::AddElement(element) => {
            let id = graph.add_element(element.clone())?;
            delta.element_added(id);
            Ok(vec![GraphOp::RemoveElement(id)])
        }
        GraphOp::RemoveElement(id) => {
            let removed = graph.remove_element(*id)?;
            for connection in &removed.connections {
                delta.connection_removed(connection.id());
            }
            delta.element_removed(*id);
            // Re-adding the element must precede restoring its edges.
            let mut inverse = removed
                .connections
                .into_iter()
                .rev()
                .map(GraphOp::RestoreConnection)
                .collect::<Vec<_>>();
            inverse.push(GraphOp::AddElement(removed.element));
            Ok(inverse)
        }
        GraphOp::AddConnection(connection) => {
            let id = graph.add_connection(connection.clone())?;
            delta.connection_added(id);
            delta.element_updated(connection.source());
            Ok(vec![GraphOp::RemoveConnection(id)])
        }
        GraphOp::RestoreConnection(connection) => {
            let id = graph.restore_connection(connection.clone())?;
            delta.connection_added(id);
            delta.element_updated(connection.source());
            Ok(vec![GraphOp::RemoveConnection(id)])
        }
        GraphOp::RemoveConnection(id) => {
            let connection = graph.remove_connection(*id)?;
            delta.connection_removed(*id);
            delta.element_updated(connection.source());
            Ok(vec![GraphOp::RestoreConnection(connection)])
        }
        GraphOp::MoveElement { element, to } => {
            let previous = graph.move_element(*element, *to)?;
            delta.element_updated(*element);
            Ok(vec![GraphOp::MoveElement {
                element: *element,
                to: previous,
            }])
        }
        GraphOp::RenameElement { element, name } => {
            let previous = graph.rename_element(*element, name.clone())?;
            delta.element_updated(*element);
            Ok(vec![GraphOp::RenameElement {
                element: *element,
                name: previous,
            }])
        }
        GraphOp::SetProperties {
            element,
            properties,
        } => {
            let previous = graph.set_properties(*element, properties.clone())?;
            delta.element_updated(*element);
            Ok(vec![GraphOp::SetProperties {
                element: *element,
                properties: previous,
            }])
        }
        GraphOp::SetLabel { connection, label } => {
            let previous = graph.set_label(*connection, label.clone())?;
            delta.connection_updated(*connection);
            Ok(vec![GraphOp::SetLabel {
                connection: *connection,
                label: previous,
            }])
        }
        GraphOp::SetCondition {
            connection,
            condition,
        } => {
            let previous = graph.set_condition(*connection, condition.clone())?;
            delta.connection_updated(*connection);
            Ok(vec![GraphOp::SetCondition {
                connection: *connection,
                condition: previous,
            }])
        }
    }
}
