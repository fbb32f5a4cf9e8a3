//! Runtime side of a schema: form data, branch evaluation and step navigation.

pub mod catalog;
pub mod evaluator;
pub mod form_data;
pub mod navigator;

pub use catalog::{
    ChecklistItem, InMemoryCatalog, PrintFormBinding, Provenance, Requisite, StepCatalog,
    Transition, TransitionKind,
};
pub use evaluator::{
    evaluate, evaluate_decision, rule_passes, rules_pass, BranchSelection, Evaluation,
};
pub use form_data::{is_blank, FormData};
pub use navigator::{
    AdvancePlan, Assignment, BranchTaken, Destination, MissingRequirement, NavigationGateway,
    RunState, RunStatus, StepNavigator,
};
