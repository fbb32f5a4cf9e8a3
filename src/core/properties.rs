//! Per-type element configuration.
//!
//! Elements persist their configuration as one free-form JSON object. The keys this
//! engine understands are lifted into typed fields; every other key stays in the
//! `extra` bag and is written back unchanged. Typed keys are optional so a blob
//! reads back exactly as it was stored, explicit defaults included.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::element::ElementType;

#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    Start(EventConfig),
    End(EventConfig),
    Process(ProcessConfig),
    Approval(ApprovalConfig),
    Decision(DecisionConfig),
}

impl NodeConfig {
    /// Fresh configuration for a newly placed element.
    pub fn for_type(element_type: ElementType) -> Self {
        match element_type {
            ElementType::Start => Self::Start(EventConfig::default()),
            ElementType::End => Self::End(EventConfig::default()),
            ElementType::Process => Self::Process(ProcessConfig::default()),
            ElementType::Approval => Self::Approval(ApprovalConfig::default()),
            ElementType::Decision => Self::Decision(DecisionConfig {
                needs_configuration: true,
                ..DecisionConfig::default()
            }),
        }
    }

    /// Lift a persisted property object into the typed form for `element_type`.
    ///
    /// A blob whose known keys have unexpected shapes is kept entirely in the
    /// passthrough bag, so nothing is lost on the next write.
    pub fn from_json(element_type: ElementType, properties: Map<String, Value>) -> Self {
        let value = Value::Object(properties.clone());
        let parsed = match element_type {
            ElementType::Start => serde_json::from_value(value).map(Self::Start),
            ElementType::End => serde_json::from_value(value).map(Self::End),
            ElementType::Process => serde_json::from_value(value).map(Self::Process),
            ElementType::Approval => serde_json::from_value(value).map(Self::Approval),
            ElementType::Decision => serde_json::from_value(value).map(Self::Decision),
        };
        match parsed {
            Ok(config) => config,
            Err(err) => {
                warn!(%element_type, error = %err, "malformed element properties kept verbatim");
                let mut fallback = Self::for_type(element_type);
                *fallback.extra_mut() = properties;
                fallback
            }
        }
    }

    pub fn to_json(&self) -> Map<String, Value> {
        let value = match self {
            Self::Start(config) | Self::End(config) => serde_json::to_value(config),
            Self::Process(config) => serde_json::to_value(config),
            Self::Approval(config) => serde_json::to_value(config),
            Self::Decision(config) => serde_json::to_value(config),
        };
        match value {
            Ok(Value::Object(map)) => map,
            // Derived serializers of these structs always produce objects.
            _ => self.extra().clone(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Start(_) => ElementType::Start,
            Self::End(_) => ElementType::End,
            Self::Process(_) => ElementType::Process,
            Self::Approval(_) => ElementType::Approval,
            Self::Decision(_) => ElementType::Decision,
        }
    }

    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Self::Start(config) | Self::End(config) => &config.extra,
            Self::Process(config) => &config.extra,
            Self::Approval(config) => &config.extra,
            Self::Decision(config) => &config.extra,
        }
    }

    pub fn extra_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            Self::Start(config) | Self::End(config) => &mut config.extra,
            Self::Process(config) => &mut config.extra,
            Self::Approval(config) => &mut config.extra,
            Self::Decision(config) => &mut config.extra,
        }
    }

    pub fn as_process(&self) -> Option<&ProcessConfig> {
        match self {
            Self::Process(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_decision(&self) -> Option<&DecisionConfig> {
        match self {
            Self::Decision(config) => Some(config),
            _ => None,
        }
    }

    pub fn as_decision_mut(&mut self) -> Option<&mut DecisionConfig> {
        match self {
            Self::Decision(config) => Some(config),
            _ => None,
        }
    }
}

/// START and END elements carry no engine-level keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessConfig {
    /// Accounts that take over the step when the run hands off to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_assignees: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProcessConfig {
    pub fn default_assignee(&self) -> Option<&str> {
        self.default_assignees
            .as_deref()
            .and_then(<[String]>::first)
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_stages: Option<Vec<ApprovalStage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApprovalConfig {
    pub fn stages(&self) -> &[ApprovalStage] {
        self.approval_stages.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalStage {
    pub name: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionConfig {
    /// True until the decision has at least one outgoing branch.
    #[serde(default)]
    pub needs_configuration: bool,
    /// Branches must use the reserved approve/reject labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_gate: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecisionConfig {
    pub fn is_strict(&self) -> bool {
        self.strict_gate.unwrap_or(false)
    }
}
