use std::fmt;

use serde::{Deserialize, Serialize};

use super::properties::NodeConfig;
use crate::types::{ElementId, Point, Rect, SchemaId, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Start,
    End,
    Process,
    Approval,
    Decision,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
            Self::Process => "PROCESS",
            Self::Approval => "APPROVAL",
            Self::Decision => "DECISION",
        }
    }

    /// Pairing table for edges. START and END only take part through the
    /// structural START→PROCESS and PROCESS→END edges.
    pub fn can_connect_to(self, target: ElementType) -> bool {
        matches!(
            (self, target),
            (Self::Process, Self::Decision)
                | (Self::Process, Self::Approval)
                | (Self::Approval, Self::Decision)
                | (Self::Decision, Self::Process)
                | (Self::Start, Self::Process)
                | (Self::Process, Self::End)
        )
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed node of a schema graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    schema_id: SchemaId,
    name: String,
    position: Point,
    size: Size,
    properties: NodeConfig,
}

impl Element {
    pub fn new(
        schema_id: SchemaId,
        element_type: ElementType,
        name: impl Into<String>,
        position: Point,
    ) -> Self {
        Self::with_id(ElementId::new(), schema_id, element_type, name, position)
    }

    pub fn with_id(
        id: ElementId,
        schema_id: SchemaId,
        element_type: ElementType,
        name: impl Into<String>,
        position: Point,
    ) -> Self {
        Self {
            id,
            schema_id,
            name: name.into(),
            position,
            size: Size::default(),
            properties: NodeConfig::for_type(element_type),
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// The type is carried by the configuration variant so the two can't disagree.
    pub fn element_type(&self) -> ElementType {
        self.properties.element_type()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position, self.size)
    }

    pub fn properties(&self) -> &NodeConfig {
        &self.properties
    }

    pub fn is(&self, element_type: ElementType) -> bool {
        self.element_type() == element_type
    }

    pub fn needs_configuration(&self) -> bool {
        self.properties
            .as_decision()
            .is_some_and(|config| config.needs_configuration)
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Replace the configuration. A variant for another element type is ignored
    /// by returning `false`.
    pub(crate) fn set_properties(&mut self, properties: NodeConfig) -> bool {
        if properties.element_type() != self.element_type() {
            return false;
        }
        self.properties = properties;
        true
    }

    pub(crate) fn properties_mut(&mut self) -> &mut NodeConfig {
        &mut self.properties
    }

    pub(crate) fn rehome(&mut self, id: ElementId, schema_id: SchemaId) {
        self.id = id;
        self.schema_id = schema_id;
    }
}
