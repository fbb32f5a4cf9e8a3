use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::types::{ConnectionId, ElementId, SchemaId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    #[default]
    Sequence,
}

/// A directed edge between two elements of the same schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    id: ConnectionId,
    schema_id: SchemaId,
    source: ElementId,
    target: ElementId,
    connection_type: ConnectionType,
    label: Option<String>,
    condition: Condition,
    // Assigned by the graph on insertion; branch evaluation follows this order.
    seq: u64,
}

impl Connection {
    pub fn new(
        schema_id: SchemaId,
        source: ElementId,
        target: ElementId,
        condition: Condition,
    ) -> Self {
        Self::with_id(ConnectionId::new(), schema_id, source, target, condition)
    }

    pub fn with_id(
        id: ConnectionId,
        schema_id: SchemaId,
        source: ElementId,
        target: ElementId,
        condition: Condition,
    ) -> Self {
        Self {
            id,
            schema_id,
            source,
            target,
            connection_type: ConnectionType::Sequence,
            label: None,
            condition,
            seq: 0,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn source(&self) -> ElementId {
        self.source
    }

    pub fn target(&self) -> ElementId {
        self.target
    }

    pub fn connection_type(&self) -> ConnectionType {
        self.connection_type
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Creation order within the owning graph.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_incident_to(&self, element: ElementId) -> bool {
        self.source == element || self.target == element
    }

    pub(crate) fn set_seq(&mut self, seq: u64) {
        self.seq = seq;
    }

    pub(crate) fn set_label<T: Into<String>>(&mut self, label: Option<T>) {
        self.label = label.map(Into::into);
    }

    pub(crate) fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    pub(crate) fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }

    pub(crate) fn rehome(
        &mut self,
        id: ConnectionId,
        schema_id: SchemaId,
        source: ElementId,
        target: ElementId,
    ) {
        self.id = id;
        self.schema_id = schema_id;
        self.source = source;
        self.target = target;
    }
}
