//! The entity-management collaborator contract and an in-memory stand-in.

use std::collections::VecDeque;

use anyhow::anyhow;

use super::records::{ConnectionRecord, ElementRecord, SchemaRecord};
use crate::error::StoreError;
use crate::types::{ConnectionId, ElementId, LineageId, SchemaId};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Generic create/update/delete/list service keyed by entity id. Responses are
/// authoritative: a returned record may differ from what was sent.
pub trait EntityStore {
    fn create_element(&mut self, record: &ElementRecord) -> StoreResult<ElementRecord>;
    fn update_element(&mut self, record: &ElementRecord) -> StoreResult<ElementRecord>;
    fn delete_element(&mut self, id: ElementId) -> StoreResult<()>;
    fn list_elements(&self, schema: SchemaId) -> StoreResult<Vec<ElementRecord>>;

    fn create_connection(&mut self, record: &ConnectionRecord) -> StoreResult<ConnectionRecord>;
    fn update_connection(&mut self, record: &ConnectionRecord) -> StoreResult<ConnectionRecord>;
    fn delete_connection(&mut self, id: ConnectionId) -> StoreResult<()>;
    fn list_connections(&self, schema: SchemaId) -> StoreResult<Vec<ConnectionRecord>>;

    fn create_schema(&mut self, record: &SchemaRecord) -> StoreResult<SchemaRecord>;
    fn update_schema(&mut self, record: &SchemaRecord) -> StoreResult<SchemaRecord>;
    fn delete_schema(&mut self, id: SchemaId) -> StoreResult<()>;
    fn list_schemas(&self) -> StoreResult<Vec<SchemaRecord>>;
    /// Published versions, optionally limited to one lineage.
    fn list_published(&self, lineage: Option<LineageId>) -> StoreResult<Vec<SchemaRecord>>;
}

type ElementHook = Box<dyn Fn(&mut ElementRecord) + Send + Sync>;

/// Store that keeps everything in memory. Failures can be scheduled for the next
/// write calls to exercise rollback paths.
#[derive(Default)]
pub struct InMemoryStore {
    elements: Vec<ElementRecord>,
    connections: Vec<ConnectionRecord>,
    schemas: Vec<SchemaRecord>,
    failures: VecDeque<Option<bool>>,
    element_hook: Option<ElementHook>,
    writes: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next write call; `retryable` decides the failure kind.
    pub fn fail_next(&mut self, retryable: bool) {
        self.failures.push_back(Some(retryable));
    }

    /// Let `successes` write calls through before the scheduled failures apply.
    pub fn pass_next(&mut self, successes: usize) {
        for _ in 0..successes {
            self.failures.push_front(None);
        }
    }

    /// Rewrite every element the store acknowledges, like a server normalising input.
    pub fn with_element_hook(
        mut self,
        hook: impl Fn(&mut ElementRecord) + Send + Sync + 'static,
    ) -> Self {
        self.element_hook = Some(Box::new(hook));
        self
    }

    /// Number of successful write calls.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementRecord> {
        self.elements.iter().find(|r| r.id == id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&ConnectionRecord> {
        self.connections.iter().find(|r| r.id == id)
    }

    pub fn schema(&self, id: SchemaId) -> Option<&SchemaRecord> {
        self.schemas.iter().find(|r| r.id == id)
    }

    fn write(&mut self) -> StoreResult<()> {
        match self.failures.pop_front().flatten() {
            Some(true) => Err(StoreError::retryable(anyhow!("collaborator unavailable"))),
            Some(false) => Err(StoreError::fatal(anyhow!("collaborator rejected the request"))),
            None => {
                self.writes += 1;
                Ok(())
            }
        }
    }

    fn acknowledge_element(&self, record: &ElementRecord) -> ElementRecord {
        let mut stored = record.clone();
        if let Some(hook) = &self.element_hook {
            hook(&mut stored);
        }
        stored
    }
}

fn upsert<T: Clone>(items: &mut Vec<T>, record: T, same: impl Fn(&T) -> bool) -> T {
    match items.iter_mut().find(|item| same(item)) {
        Some(existing) => *existing = record.clone(),
        None => items.push(record.clone()),
    }
    record
}

fn missing(kind: &str, id: impl std::fmt::Display) -> StoreError {
    StoreError::fatal(anyhow!("{kind} {id} does not exist"))
}

impl EntityStore for InMemoryStore {
    fn create_element(&mut self, record: &ElementRecord) -> StoreResult<ElementRecord> {
        self.write()?;
        let stored = self.acknowledge_element(record);
        Ok(upsert(&mut self.elements, stored, |r| r.id == record.id))
    }

    fn update_element(&mut self, record: &ElementRecord) -> StoreResult<ElementRecord> {
        self.write()?;
        if self.element(record.id).is_none() {
            return Err(missing("element", record.id));
        }
        let stored = self.acknowledge_element(record);
        Ok(upsert(&mut self.elements, stored, |r| r.id == record.id))
    }

    fn delete_element(&mut self, id: ElementId) -> StoreResult<()> {
        self.write()?;
        self.elements.retain(|r| r.id != id);
        self.connections
            .retain(|c| c.source_id != id && c.target_id != id);
        Ok(())
    }

    fn list_elements(&self, schema: SchemaId) -> StoreResult<Vec<ElementRecord>> {
        Ok(self
            .elements
            .iter()
            .filter(|r| r.schema_id == schema)
            .cloned()
            .collect())
    }

    fn create_connection(&mut self, record: &ConnectionRecord) -> StoreResult<ConnectionRecord> {
        self.write()?;
        Ok(upsert(&mut self.connections, record.clone(), |r| r.id == record.id))
    }

    fn update_connection(&mut self, record: &ConnectionRecord) -> StoreResult<ConnectionRecord> {
        self.write()?;
        if self.connection(record.id).is_none() {
            return Err(missing("connection", record.id));
        }
        Ok(upsert(&mut self.connections, record.clone(), |r| r.id == record.id))
    }

    fn delete_connection(&mut self, id: ConnectionId) -> StoreResult<()> {
        self.write()?;
        self.connections.retain(|r| r.id != id);
        Ok(())
    }

    fn list_connections(&self, schema: SchemaId) -> StoreResult<Vec<ConnectionRecord>> {
        let mut records = self
            .connections
            .iter()
            .filter(|r| r.schema_id == schema)
            .cloned()
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.seq);
        Ok(records)
    }

    fn create_schema(&mut self, record: &SchemaRecord) -> StoreResult<SchemaRecord> {
        self.write()?;
        Ok(upsert(&mut self.schemas, record.clone(), |r| r.id == record.id))
    }

    fn update_schema(&mut self, record: &SchemaRecord) -> StoreResult<SchemaRecord> {
        self.write()?;
        if self.schema(record.id).is_none() {
            return Err(missing("schema", record.id));
        }
        Ok(upsert(&mut self.schemas, record.clone(), |r| r.id == record.id))
    }

    fn delete_schema(&mut self, id: SchemaId) -> StoreResult<()> {
        self.write()?;
        self.schemas.retain(|r| r.id != id);
        self.elements.retain(|r| r.schema_id != id);
        self.connections.retain(|r| r.schema_id != id);
        Ok(())
    }

    fn list_schemas(&self) -> StoreResult<Vec<SchemaRecord>> {
        Ok(self.schemas.clone())
    }

    fn list_published(&self, lineage: Option<LineageId>) -> StoreResult<Vec<SchemaRecord>> {
        Ok(self
            .schemas
            .iter()
            .filter(|r| r.is_published && lineage.map_or(true, |l| r.lineage_id == l))
            .cloned()
            .collect())
    }
}
