//! Branch conditions.
//!
//! `ConditionWire` is the persisted JSON shape `{ color, rules, labelRotation? }` and
//! keeps unknown keys verbatim. `Condition` is the engine form: rule fields are bound
//! to element ids, so renaming an element never leaves a rule pointing at a stale
//! `<elementName>.<fieldName>` string.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Requisite,
    Checklist,
    Railway,
    Text,
    Number,
    Date,
    Boolean,
}

impl RuleType {
    /// Comparison used when a rule carries no explicit `valueType`.
    pub fn implied_value_type(self) -> ValueType {
        match self {
            Self::Number => ValueType::Number,
            Self::Date => ValueType::Date,
            Self::Boolean | Self::Checklist => ValueType::Boolean,
            Self::Requisite | Self::Railway | Self::Text => ValueType::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOp {
    Eq,
    Ne,
    Contains,
    Gt,
    Lt,
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

/// Rotation of a connection label in degrees; only 0 and 90 are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum LabelRotation {
    #[default]
    Horizontal,
    Vertical,
}

impl TryFrom<u16> for LabelRotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Horizontal),
            90 => Ok(Self::Vertical),
            other => Err(format!("label rotation must be 0 or 90, got {other}")),
        }
    }
}

impl From<LabelRotation> for u16 {
    fn from(value: LabelRotation) -> Self {
        match value {
            LabelRotation::Horizontal => 0,
            LabelRotation::Vertical => 90,
        }
    }
}

/// A requisite or checklist field of a particular step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub element: ElementId,
    pub field: String,
}

impl FieldRef {
    pub fn new(element: ElementId, field: impl Into<String>) -> Self {
        Self {
            element,
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleField {
    /// Compares against the distinguished railway value. Holds the raw field text.
    Railway(String),
    Field(FieldRef),
    /// A field string whose element part matched no element.
    Unresolved(String),
}

impl RuleField {
    pub fn references(&self, element: ElementId) -> bool {
        matches!(self, Self::Field(field) if field.element == element)
    }
}

/// Name lookups needed to convert between display strings and bound references.
pub trait ElementNames {
    fn element_id_by_name(&self, name: &str) -> Option<ElementId>;
    fn element_name(&self, id: ElementId) -> Option<&str>;
}

/// Split `<elementName>.<fieldName>`, trying the longest element-name prefix first
/// so names containing dots still resolve.
pub fn resolve_field_path(path: &str, names: &impl ElementNames) -> Option<FieldRef> {
    let dots = path.match_indices('.').map(|(idx, _)| idx).collect::<Vec<_>>();
    dots.into_iter().rev().find_map(|idx| {
        let (element_name, rest) = path.split_at(idx);
        let field = &rest[1..];
        if field.is_empty() {
            return None;
        }
        names
            .element_id_by_name(element_name)
            .map(|element| FieldRef::new(element, field))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub rule_type: RuleType,
    pub field: RuleField,
    pub op: RuleOp,
    pub value: Option<Value>,
    value_type: Option<ValueType>,
    extra: Map<String, Value>,
}

impl Rule {
    pub fn new(rule_type: RuleType, field: RuleField, op: RuleOp, value: Value) -> Self {
        Self {
            rule_type,
            field,
            op,
            value: Some(value),
            value_type: None,
            extra: Map::new(),
        }
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
            .unwrap_or_else(|| self.rule_type.implied_value_type())
    }

    pub fn from_wire(wire: RuleWire, names: &impl ElementNames) -> Self {
        let field = if wire.rule_type == RuleType::Railway {
            RuleField::Railway(wire.field)
        } else {
            match resolve_field_path(&wire.field, names) {
                Some(field) => RuleField::Field(field),
                None => RuleField::Unresolved(wire.field),
            }
        };
        Self {
            rule_type: wire.rule_type,
            field,
            op: wire.op,
            value: wire.value,
            value_type: wire.value_type,
            extra: wire.extra,
        }
    }

    pub fn to_wire(&self, names: &impl ElementNames) -> RuleWire {
        let field = match &self.field {
            RuleField::Railway(raw) | RuleField::Unresolved(raw) => raw.clone(),
            RuleField::Field(field) => match names.element_name(field.element) {
                Some(name) => format!("{name}.{}", field.field),
                None => format!("{}.{}", field.element, field.field),
            },
        };
        RuleWire {
            rule_type: self.rule_type,
            field,
            op: self.op,
            value: self.value.clone(),
            value_type: self.value_type,
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub color: String,
    pub rules: Vec<Rule>,
    pub label_rotation: Option<LabelRotation>,
    extra: Map<String, Value>,
}

impl Condition {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            rules: Vec::new(),
            label_rotation: None,
            extra: Map::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// No rules: an unconditional (default) branch.
    pub fn is_unconditional(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn from_wire(wire: ConditionWire, names: &impl ElementNames) -> Self {
        Self {
            color: wire.color,
            rules: wire
                .rules
                .into_iter()
                .map(|rule| Rule::from_wire(rule, names))
                .collect(),
            label_rotation: wire.label_rotation,
            extra: wire.extra,
        }
    }

    pub fn to_wire(&self, names: &impl ElementNames) -> ConditionWire {
        ConditionWire {
            color: self.color.clone(),
            rules: self.rules.iter().map(|rule| rule.to_wire(names)).collect(),
            label_rotation: self.label_rotation,
            extra: self.extra.clone(),
        }
    }

    /// Rewrite field references to `from` so they point at `to`.
    pub(crate) fn remap_element(&mut self, from: ElementId, to: ElementId) {
        for rule in &mut self.rules {
            if let RuleField::Field(field) = &mut rule.field {
                if field.element == from {
                    field.element = to;
                }
            }
        }
    }

    /// Freeze references to a removed element into their display string.
    pub(crate) fn detach_element(&mut self, element: ElementId, element_name: &str) {
        for rule in &mut self.rules {
            if let RuleField::Field(field) = &rule.field {
                if field.element == element {
                    rule.field = RuleField::Unresolved(format!("{element_name}.{}", field.field));
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionWire {
    pub color: String,
    #[serde(default)]
    pub rules: Vec<RuleWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_rotation: Option<LabelRotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConditionWire {
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWire {
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub field: String,
    pub op: RuleOp,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// An explicit `"value": null` must survive the round trip, so presence is tracked
// separately from the null value itself.
fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl fmt::Display for RuleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Contains => "contains",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Exists => "exists",
        };
        f.write_str(op)
    }
}
