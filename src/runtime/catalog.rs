//! Read contract for per-step definitions owned by the collaborator.
//!
//! Records carry `inherited`/`inheritedFrom` provenance and any further keys the
//! collaborator sends; the engine keeps both as-is and never interprets them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ElementId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default)]
    pub inherited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherited_from: Option<String>,
}

/// A form field of a PROCESS step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisite {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintFormBinding {
    pub id: String,
    pub name: String,
    /// The step cannot be left before a signed copy is attached.
    #[serde(default)]
    pub requires_signature: bool,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Same holder keeps the application.
    Forward,
    /// The next step belongs to someone else.
    Handoff,
    /// The step ends in an approve/reject choice.
    ApproveReject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: String,
    pub kind: TransitionKind,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub trait StepCatalog {
    fn requisites(&self, element: ElementId) -> Vec<Requisite>;
    fn checklists(&self, element: ElementId) -> Vec<ChecklistItem>;
    fn print_forms(&self, element: ElementId) -> Vec<PrintFormBinding>;
    fn transitions(&self, element: ElementId) -> Vec<Transition>;

    fn requires_handoff(&self, element: ElementId) -> bool {
        self.transitions(element)
            .iter()
            .any(|t| t.kind == TransitionKind::Handoff)
    }

    fn requires_approval_gate(&self, element: ElementId) -> bool {
        self.transitions(element)
            .iter()
            .any(|t| t.kind == TransitionKind::ApproveReject)
    }
}

/// Catalog preloaded from collaborator responses.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    requisites: HashMap<ElementId, Vec<Requisite>>,
    checklists: HashMap<ElementId, Vec<ChecklistItem>>,
    print_forms: HashMap<ElementId, Vec<PrintFormBinding>>,
    transitions: HashMap<ElementId, Vec<Transition>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_requisite(&mut self, element: ElementId, requisite: Requisite) -> &mut Self {
        self.requisites.entry(element).or_default().push(requisite);
        self
    }

    pub fn add_checklist_item(&mut self, element: ElementId, item: ChecklistItem) -> &mut Self {
        self.checklists.entry(element).or_default().push(item);
        self
    }

    pub fn add_print_form(&mut self, element: ElementId, form: PrintFormBinding) -> &mut Self {
        self.print_forms.entry(element).or_default().push(form);
        self
    }

    pub fn add_transition(&mut self, element: ElementId, transition: Transition) -> &mut Self {
        self.transitions.entry(element).or_default().push(transition);
        self
    }
}

impl StepCatalog for InMemoryCatalog {
    fn requisites(&self, element: ElementId) -> Vec<Requisite> {
        self.requisites.get(&element).cloned().unwrap_or_default()
    }

    fn checklists(&self, element: ElementId) -> Vec<ChecklistItem> {
        self.checklists.get(&element).cloned().unwrap_or_default()
    }

    fn print_forms(&self, element: ElementId) -> Vec<PrintFormBinding> {
        self.print_forms.get(&element).cloned().unwrap_or_default()
    }

    fn transitions(&self, element: ElementId) -> Vec<Transition> {
        self.transitions.get(&element).cloned().unwrap_or_default()
    }
}

impl Requisite {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            required,
            provenance: Provenance::default(),
            extra: Map::new(),
        }
    }
}

impl ChecklistItem {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            required,
            provenance: Provenance::default(),
            extra: Map::new(),
        }
    }
}

impl PrintFormBinding {
    pub fn new(name: impl Into<String>, requires_signature: bool) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            requires_signature,
            provenance: Provenance::default(),
            extra: Map::new(),
        }
    }
}

impl Transition {
    pub fn new(id: impl Into<String>, kind: TransitionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            provenance: Provenance::default(),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{InMemoryCatalog, Requisite, StepCatalog, Transition, TransitionKind};
    use crate::types::ElementId;

    #[test]
    fn provenance_and_unknown_keys_survive() {
        let wire = json!({
            "id": "r1",
            "name": "status",
            "required": true,
            "inherited": true,
            "inheritedFrom": "template-7",
            "mask": "99-99"
        });
        let requisite: Requisite = serde_json::from_value(wire.clone()).expect("parse");
        assert!(requisite.provenance.inherited);
        assert_eq!(requisite.provenance.inherited_from.as_deref(), Some("template-7"));
        assert_eq!(serde_json::to_value(&requisite).expect("serialize"), wire);
    }

    #[test]
    fn transition_kinds_drive_handoff() {
        let step = ElementId::new();
        let mut catalog = InMemoryCatalog::new();
        assert!(!catalog.requires_handoff(step));
        catalog.add_transition(step, Transition::new("t1", TransitionKind::Handoff));
        assert!(catalog.requires_handoff(step));
        assert!(!catalog.requires_approval_gate(step));
    }
}
