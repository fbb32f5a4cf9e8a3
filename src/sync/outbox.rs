//! Optimistic write queue.
//!
//! Local edits land in the graph immediately and wait here with their undo ops.
//! `flush` sends them in order; each acknowledgement refreshes the read model and
//! corrects the graph where the collaborator answered differently. When a send
//! fails, that mutation and every later one are undone locally.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use super::read_model::ReadModel;
use super::records::{ConnectionRecord, ElementRecord};
use super::store::{EntityStore, StoreResult};
use crate::core::graph::SchemaGraph;
use crate::core::intent::{apply_ops, ApplyResult, Delta, GraphOp};
use crate::editor::Effect;
use crate::error::Result;
use crate::types::{ConnectionId, ElementId, MutationId, SchemaId};

#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub schema: SchemaId,
    pub delta: Delta,
    pub undo: Vec<GraphOp>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub acknowledged: Vec<MutationId>,
    /// Elements whose local state was overwritten by the collaborator's answer.
    pub corrected_elements: Vec<ElementId>,
    pub corrected_connections: Vec<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pending: VecDeque<PendingMutation>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &PendingMutation> {
        self.pending.iter()
    }

    /// Queue an applied change. Empty changes are not queued.
    pub fn enqueue(&mut self, schema: SchemaId, result: ApplyResult) -> Option<MutationId> {
        if result.delta.is_empty() {
            return None;
        }
        let id = MutationId::new();
        debug!(mutation = %id, schema = %schema, "mutation queued");
        self.pending.push_back(PendingMutation {
            id,
            schema,
            delta: result.delta,
            undo: result.undo,
        });
        Some(id)
    }

    /// Queue every `Persist` effect of an editor transition.
    pub fn enqueue_effects(&mut self, schema: SchemaId, effects: &[Effect]) -> Vec<MutationId> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Persist(result) => self.enqueue(schema, result.clone()),
                Effect::Notify(_) => None,
            })
            .collect()
    }

    pub fn flush(
        &mut self,
        graph: &mut SchemaGraph,
        store: &mut impl EntityStore,
        read_model: &mut ReadModel,
    ) -> Result<FlushReport> {
        let mut report = FlushReport::default();
        while let Some(mutation) = self.pending.front() {
            let id = mutation.id;
            let later = self.pending.iter().skip(1).collect::<Vec<_>>();
            let locked_elements = mutation_elements(&later);
            let locked_connections = mutation_connections(&later);
            let sent = send(
                mutation,
                graph,
                store,
                read_model,
                &locked_elements,
                &locked_connections,
                &mut report,
            );
            match sent {
                Ok(()) => {
                    self.pending.pop_front();
                    report.acknowledged.push(id);
                }
                Err(err) => {
                    warn!(mutation = %id, error = %err, "collaborator write failed");
                    self.rollback(graph, read_model);
                    return Err(err.into());
                }
            }
        }
        if !report.acknowledged.is_empty() {
            info!(acknowledged = report.acknowledged.len(), "outbox flushed");
        }
        Ok(report)
    }

    /// Undo every pending mutation, newest first, and drop them.
    pub fn rollback(&mut self, graph: &mut SchemaGraph, read_model: &mut ReadModel) {
        let pending = self.pending.drain(..).collect::<Vec<_>>();
        for mutation in pending.iter().rev() {
            if let Err(err) = apply_ops(graph, &mutation.undo) {
                warn!(mutation = %mutation.id, error = %err, "rollback could not be applied");
            }
            // A failed mutation may be half-written remotely.
            read_model.invalidate(mutation.schema);
        }
        if !pending.is_empty() {
            warn!(rolled_back = pending.len(), "pending mutations rolled back");
        }
    }
}

fn mutation_elements(mutations: &[&PendingMutation]) -> HashSet<ElementId> {
    let mut ids = HashSet::new();
    for mutation in mutations {
        let delta = &mutation.delta;
        ids.extend(delta.added_elements.iter().copied());
        ids.extend(delta.updated_elements.iter().copied());
        ids.extend(delta.removed_elements.iter().copied());
    }
    ids
}

fn mutation_connections(mutations: &[&PendingMutation]) -> HashSet<ConnectionId> {
    let mut ids = HashSet::new();
    for mutation in mutations {
        let delta = &mutation.delta;
        ids.extend(delta.added_connections.iter().copied());
        ids.extend(delta.updated_connections.iter().copied());
        ids.extend(delta.removed_connections.iter().copied());
    }
    ids
}

// Entities touched by a later pending mutation keep their local state; the later
// send carries it.
fn send(
    mutation: &PendingMutation,
    graph: &mut SchemaGraph,
    store: &mut impl EntityStore,
    read_model: &mut ReadModel,
    locked_elements: &HashSet<ElementId>,
    locked_connections: &HashSet<ConnectionId>,
    report: &mut FlushReport,
) -> StoreResult<()> {
    let delta = &mutation.delta;
    for id in &delta.added_elements {
        let Some(record) = graph.element(*id).map(ElementRecord::from_element) else {
            continue;
        };
        let ack = store.create_element(&record)?;
        reconcile_element(graph, read_model, ack, locked_elements, report);
    }
    for id in &delta.added_connections {
        let Some(connection) = graph.connection(*id) else {
            continue;
        };
        let record = ConnectionRecord::from_connection(connection, graph)?;
        let ack = store.create_connection(&record)?;
        reconcile_connection(graph, read_model, ack, locked_connections, report)?;
    }
    for id in &delta.updated_elements {
        let Some(record) = graph.element(*id).map(ElementRecord::from_element) else {
            continue;
        };
        let ack = store.update_element(&record)?;
        reconcile_element(graph, read_model, ack, locked_elements, report);
    }
    for id in &delta.updated_connections {
        let Some(connection) = graph.connection(*id) else {
            continue;
        };
        let record = ConnectionRecord::from_connection(connection, graph)?;
        let ack = store.update_connection(&record)?;
        reconcile_connection(graph, read_model, ack, locked_connections, report)?;
    }
    for id in &delta.removed_connections {
        store.delete_connection(*id)?;
        read_model.forget_connection(*id);
    }
    for id in &delta.removed_elements {
        store.delete_element(*id)?;
        read_model.forget_element(*id);
    }
    debug!(mutation = %mutation.id, "mutation acknowledged");
    Ok(())
}

fn reconcile_element(
    graph: &mut SchemaGraph,
    read_model: &mut ReadModel,
    ack: ElementRecord,
    locked: &HashSet<ElementId>,
    report: &mut FlushReport,
) {
    let authoritative = ack.to_element();
    let differs = graph
        .element(ack.id)
        .is_some_and(|local| *local != authoritative);
    if differs && !locked.contains(&ack.id) && graph.replace_element(authoritative).is_ok() {
        debug!(element = %ack.id, "element corrected from acknowledgement");
        report.corrected_elements.push(ack.id);
    }
    read_model.acknowledge_element(ack);
}

fn reconcile_connection(
    graph: &mut SchemaGraph,
    read_model: &mut ReadModel,
    ack: ConnectionRecord,
    locked: &HashSet<ConnectionId>,
    report: &mut FlushReport,
) -> StoreResult<()> {
    let authoritative = ack.to_connection(graph)?;
    let differs = graph.connection(ack.id).is_some_and(|local| {
        local.label() != authoritative.label() || local.condition() != authoritative.condition()
    });
    if differs && !locked.contains(&ack.id) && graph.replace_connection(authoritative).is_ok() {
        debug!(connection = %ack.id, "connection corrected from acknowledgement");
        report.corrected_connections.push(ack.id);
    }
    read_model.acknowledge_connection(ack);
    Ok(())
}
