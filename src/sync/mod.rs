//! Persistence through the entity-management collaborator.
//!
//! Edits are applied locally first and queued in the [`Outbox`]; acknowledged
//! records land in the [`ReadModel`]. Version-level operations (a new draft, a
//! publish) are pushed directly.

pub mod outbox;
pub mod read_model;
pub mod records;
pub mod store;

pub use outbox::{FlushReport, Outbox, PendingMutation};
pub use read_model::ReadModel;
pub use records::{ConnectionRecord, ElementRecord, SchemaRecord};
pub use store::{EntityStore, InMemoryStore, StoreResult};

use tracing::info;

use crate::core::definitions::Schema;
use crate::core::version::{Lineage, PublishReport};
use crate::error::{Error, Result};

/// Persist a whole schema version: its record, then elements, then connections.
pub fn push_version(
    store: &mut impl EntityStore,
    read_model: &mut ReadModel,
    schema: &Schema,
) -> Result<()> {
    let outcome = write_version(store, read_model, schema);
    if outcome.is_err() {
        read_model.invalidate(schema.id());
    } else {
        info!(
            schema = %schema.id(),
            elements = schema.graph().element_count(),
            connections = schema.graph().connection_count(),
            "schema version pushed"
        );
    }
    outcome
}

fn write_version(
    store: &mut impl EntityStore,
    read_model: &mut ReadModel,
    schema: &Schema,
) -> Result<()> {
    let graph = schema.graph();
    read_model.acknowledge_schema(store.create_schema(&SchemaRecord::from_schema(schema))?);
    for element in graph.elements() {
        let ack = store.create_element(&ElementRecord::from_element(element))?;
        read_model.acknowledge_element(ack);
    }
    for connection in graph.connections() {
        let record = ConnectionRecord::from_connection(connection, graph)?;
        read_model.acknowledge_connection(store.create_connection(&record)?);
    }
    Ok(())
}

/// Persist the publish flags changed by a publish.
pub fn push_publish(
    store: &mut impl EntityStore,
    read_model: &mut ReadModel,
    lineage: &Lineage,
    report: &PublishReport,
) -> Result<()> {
    let changed = std::iter::once(report.published).chain(report.unpublished.iter().copied());
    for id in changed {
        let schema = lineage.get(id).ok_or(Error::VersionNotFound(id))?;
        match store.update_schema(&SchemaRecord::from_schema(schema)) {
            Ok(ack) => read_model.acknowledge_schema(ack),
            Err(err) => {
                read_model.invalidate(id);
                return Err(err.into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{push_publish, push_version, EntityStore, InMemoryStore, ReadModel};
    use crate::core::definitions::Schema;
    use crate::core::element::{Element, ElementType};
    use crate::core::version::{Lineage, PublishOptions};
    use crate::core::{Condition, Connection};
    use crate::types::Point;

    fn publishable(name: &str) -> Schema {
        let mut schema = Schema::new(name);
        let id = schema.id();
        let graph = schema.graph_mut().expect("draft");
        let start = graph
            .add_element(Element::new(id, ElementType::Start, "S", Point::default()))
            .expect("start");
        let step = graph
            .add_element(Element::new(id, ElementType::Process, "P", Point::new(240.0, 0.0)))
            .expect("step");
        let end = graph
            .add_element(Element::new(id, ElementType::End, "E", Point::new(480.0, 0.0)))
            .expect("end");
        graph
            .add_connection(Connection::new(id, start, step, Condition::new("#000")))
            .expect("edge");
        graph
            .add_connection(Connection::new(id, step, end, Condition::new("#000")))
            .expect("edge");
        schema
    }

    #[test]
    fn pushed_version_reloads_identically() {
        let schema = publishable("Intake");
        let mut store = InMemoryStore::new();
        let mut read_model = ReadModel::new();
        push_version(&mut store, &mut read_model, &schema).expect("push");

        assert_eq!(store.list_elements(schema.id()).expect("list").len(), 3);
        assert_eq!(store.list_connections(schema.id()).expect("list").len(), 2);
        let rebuilt = read_model
            .graph(schema.id(), schema.graph().branches().clone())
            .expect("graph");
        assert!(crate::core::version::diff(schema.graph(), &rebuilt).is_empty());
    }

    #[test]
    fn publish_flags_reach_the_store() {
        let first = publishable("Intake");
        let mut lineage = Lineage::new(first.clone());
        let mut store = InMemoryStore::new();
        let mut read_model = ReadModel::new();
        push_version(&mut store, &mut read_model, &first).expect("push");

        let report = lineage
            .publish(first.id(), PublishOptions::default())
            .expect("publish");
        push_publish(&mut store, &mut read_model, &lineage, &report).expect("push");
        let stored = store.schema(first.id()).expect("stored");
        assert!(stored.is_published);
        assert!(stored.published_at.is_some());
        assert!(read_model.schema(first.id()).expect("cached").is_published);
    }
}
