//! Entity shapes exchanged with the collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::condition::{Condition, ConditionWire, ElementNames};
use crate::core::connection::{Connection, ConnectionType};
use crate::core::definitions::{Schema, VersionStatus};
use crate::core::element::{Element, ElementType};
use crate::core::properties::NodeConfig;
use crate::error::StoreError;
use crate::types::{ConnectionId, ElementId, LineageId, Point, SchemaId, Size};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
    pub id: ElementId,
    pub schema_id: SchemaId,
    pub element_type: ElementType,
    pub name: String,
    pub position_x: f64,
    pub position_y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ElementRecord {
    pub fn from_element(element: &Element) -> Self {
        let position = element.position();
        let size = element.size();
        Self {
            id: element.id(),
            schema_id: element.schema_id(),
            element_type: element.element_type(),
            name: element.name().to_owned(),
            position_x: position.x,
            position_y: position.y,
            width: size.width,
            height: size.height,
            properties: element.properties().to_json(),
        }
    }

    pub fn to_element(&self) -> Element {
        let mut element = Element::with_id(
            self.id,
            self.schema_id,
            self.element_type,
            self.name.clone(),
            Point::new(self.position_x, self.position_y),
        );
        element.set_size(Size::new(self.width, self.height));
        element.set_properties(NodeConfig::from_json(
            self.element_type,
            self.properties.clone(),
        ));
        element
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub schema_id: SchemaId,
    pub source_id: ElementId,
    pub target_id: ElementId,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Serialized `{ color, rules, labelRotation? }` object.
    pub condition: String,
    /// Creation order within the schema.
    #[serde(default)]
    pub seq: u64,
}

impl ConnectionRecord {
    pub fn from_connection(
        connection: &Connection,
        names: &impl ElementNames,
    ) -> Result<Self, StoreError> {
        let condition = connection
            .condition()
            .to_wire(names)
            .to_json_string()
            .map_err(StoreError::fatal)?;
        Ok(Self {
            id: connection.id(),
            schema_id: connection.schema_id(),
            source_id: connection.source(),
            target_id: connection.target(),
            connection_type: connection.connection_type(),
            label: connection.label().map(str::to_owned),
            condition,
            seq: connection.seq(),
        })
    }

    /// Rebuild the connection, binding rule fields against `names`.
    pub fn to_connection(&self, names: &impl ElementNames) -> Result<Connection, StoreError> {
        let wire = ConditionWire::parse(&self.condition).map_err(StoreError::fatal)?;
        let condition = Condition::from_wire(wire, names);
        let mut connection = Connection::with_id(
            self.id,
            self.schema_id,
            self.source_id,
            self.target_id,
            condition,
        );
        if let Some(label) = &self.label {
            connection = connection.with_label(label.clone());
        }
        connection.set_seq(self.seq);
        Ok(connection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRecord {
    pub id: SchemaId,
    pub lineage_id: LineageId,
    pub name: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,
    pub is_published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl SchemaRecord {
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            id: schema.id(),
            lineage_id: schema.lineage(),
            name: schema.name().to_owned(),
            version: schema.version(),
            version_label: schema.version_label().map(str::to_owned),
            is_published: schema.status() == VersionStatus::Published,
            published_at: schema.published_at(),
        }
    }
}
