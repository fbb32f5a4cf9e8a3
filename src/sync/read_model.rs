//! Cache of acknowledged entities keyed by id.
//!
//! Entries only change when the collaborator acknowledges a write or a schema is
//! (re)loaded. A schema whose local and remote state may have diverged is marked
//! stale until the next load.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::records::{ConnectionRecord, ElementRecord, SchemaRecord};
use super::store::EntityStore;
use crate::config::BranchConfig;
use crate::core::graph::SchemaGraph;
use crate::error::Result;
use crate::types::{ConnectionId, ElementId, SchemaId};

#[derive(Debug, Clone, Default)]
pub struct ReadModel {
    schemas: HashMap<SchemaId, SchemaRecord>,
    elements: HashMap<ElementId, ElementRecord>,
    connections: HashMap<ConnectionId, ConnectionRecord>,
    // Element creation order across all schemas.
    element_order: Vec<ElementId>,
    stale: HashSet<SchemaId>,
}

impl ReadModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything cached for `schema` with the collaborator's view.
    pub fn load(&mut self, store: &impl EntityStore, schema: SchemaId) -> Result<()> {
        let elements = store.list_elements(schema)?;
        let connections = store.list_connections(schema)?;
        if let Some(record) = store.list_schemas()?.into_iter().find(|r| r.id == schema) {
            self.schemas.insert(schema, record);
        }
        self.elements.retain(|_, r| r.schema_id != schema);
        self.connections.retain(|_, r| r.schema_id != schema);
        let cached = &self.elements;
        self.element_order.retain(|id| cached.contains_key(id));
        for record in elements {
            self.acknowledge_element(record);
        }
        for record in connections {
            self.connections.insert(record.id, record);
        }
        self.stale.remove(&schema);
        debug!(schema = %schema, "read model loaded");
        Ok(())
    }

    /// Build an editable graph from the cached records of `schema`.
    pub fn graph(&self, schema: SchemaId, branches: BranchConfig) -> Result<SchemaGraph> {
        let mut graph = SchemaGraph::with_branches(schema, branches);
        for record in self.elements_of(schema) {
            graph.add_element(record.to_element())?;
        }
        for record in self.connections_of(schema) {
            let connection = record.to_connection(&graph)?;
            graph.restore_connection(connection)?;
        }
        Ok(graph)
    }

    pub fn schema(&self, id: SchemaId) -> Option<&SchemaRecord> {
        self.schemas.get(&id)
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementRecord> {
        self.elements.get(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&ConnectionRecord> {
        self.connections.get(&id)
    }

    /// Cached elements of `schema` in creation order.
    pub fn elements_of(&self, schema: SchemaId) -> Vec<&ElementRecord> {
        self.element_order
            .iter()
            .filter_map(|id| self.elements.get(id))
            .filter(|r| r.schema_id == schema)
            .collect()
    }

    /// Cached connections of `schema` in creation order.
    pub fn connections_of(&self, schema: SchemaId) -> Vec<&ConnectionRecord> {
        let mut records = self
            .connections
            .values()
            .filter(|r| r.schema_id == schema)
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.seq);
        records
    }

    pub fn acknowledge_schema(&mut self, record: SchemaRecord) {
        self.schemas.insert(record.id, record);
    }

    pub fn acknowledge_element(&mut self, record: ElementRecord) {
        let id = record.id;
        if self.elements.insert(id, record).is_none() {
            self.element_order.push(id);
        }
    }

    pub fn acknowledge_connection(&mut self, record: ConnectionRecord) {
        self.connections.insert(record.id, record);
    }

    pub fn forget_element(&mut self, id: ElementId) {
        self.elements.remove(&id);
        self.element_order.retain(|e| *e != id);
        self.connections
            .retain(|_, r| r.source_id != id && r.target_id != id);
    }

    pub fn forget_connection(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    pub fn invalidate(&mut self, schema: SchemaId) {
        debug!(schema = %schema, "read model invalidated");
        self.stale.insert(schema);
    }

    pub fn is_stale(&self, schema: SchemaId) -> bool {
        self.stale.contains(&schema)
    }
}
