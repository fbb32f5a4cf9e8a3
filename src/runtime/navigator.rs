//! Step navigation for one running application.
//!
//! Advancing is two-phase: `prepare_advance` checks the step, resolves the next one
//! and marks the run busy; the caller persists form data and any hand-off, then
//! `commit_advance` moves the cursor or `abort_advance` releases the run untouched.

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, info, warn};

use super::catalog::StepCatalog;
use super::evaluator::{evaluate_decision, BranchSelection};
use super::form_data::{is_blank, FormData};
use crate::core::condition::FieldRef;
use crate::core::element::ElementType;
use crate::core::graph::SchemaGraph;
use crate::error::{Error, Result, StoreError};
use crate::types::{ApplicationId, ConnectionId, ElementId};

/// A requirement of the current step that is not yet satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingRequirement {
    Requisite(String),
    ChecklistItem(String),
    SignedPrintForm(String),
}

impl fmt::Display for MissingRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requisite(name) => write!(f, "requisite {name:?} is blank"),
            Self::ChecklistItem(name) => write!(f, "checklist item {name:?} is unchecked"),
            Self::SignedPrintForm(name) => write!(f, "print form {name:?} is not signed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Completed,
}

/// Where an advance leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Step(ElementId),
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub element: ElementId,
    pub holder: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchTaken {
    pub decision: ElementId,
    pub connection: ConnectionId,
    pub selection: BranchSelection,
}

/// Everything the caller must do before the advance can be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancePlan {
    pub application: ApplicationId,
    pub from: ElementId,
    pub destination: Destination,
    pub form_data: FormData,
    pub assignment: Option<Assignment>,
    pub branch: Option<BranchTaken>,
}

/// State of one application walking a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    application: ApplicationId,
    visited: Vec<ElementId>,
    position: usize,
    holder: Option<String>,
    form_data: FormData,
    completed_steps: BTreeSet<ElementId>,
    status: RunStatus,
    advancing: bool,
}

impl RunState {
    fn new(application: ApplicationId, first: ElementId, holder: Option<String>) -> Self {
        Self {
            application,
            visited: vec![first],
            position: 0,
            holder,
            form_data: FormData::new(),
            completed_steps: BTreeSet::new(),
            status: RunStatus::InProgress,
            advancing: false,
        }
    }

    pub fn application(&self) -> ApplicationId {
        self.application
    }

    pub fn current(&self) -> ElementId {
        self.visited[self.position]
    }

    /// Visited steps up to and including the current one.
    pub fn path(&self) -> &[ElementId] {
        &self.visited[..=self.position]
    }

    pub fn holder(&self) -> Option<&str> {
        self.holder.as_deref()
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn form_data_mut(&mut self) -> &mut FormData {
        &mut self.form_data
    }

    pub fn is_step_completed(&self, element: ElementId) -> bool {
        self.completed_steps.contains(&element)
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing
    }
}

/// Persistence the navigator waits on before committing a move.
pub trait NavigationGateway {
    fn save_form_data(
        &mut self,
        application: ApplicationId,
        data: &FormData,
    ) -> std::result::Result<(), StoreError>;

    fn assign_holder(
        &mut self,
        application: ApplicationId,
        assignment: &Assignment,
    ) -> std::result::Result<(), StoreError>;
}

pub struct StepNavigator<'a, C: ?Sized> {
    graph: &'a SchemaGraph,
    catalog: &'a C,
}

impl<'a, C: StepCatalog + ?Sized> StepNavigator<'a, C> {
    pub fn new(graph: &'a SchemaGraph, catalog: &'a C) -> Self {
        Self { graph, catalog }
    }

    /// Start at the first PROCESS after the START element.
    pub fn start(&self, application: ApplicationId, holder: Option<String>) -> Result<RunState> {
        let first = self
            .graph
            .elements_of_type(ElementType::Start)
            .flat_map(|start| self.graph.outgoing(start.id()))
            .map(|connection| connection.target())
            .find(|target| self.is_process(*target))
            .ok_or(Error::NoFirstStep)?;
        self.start_at(application, first, holder)
    }

    pub fn start_at(
        &self,
        application: ApplicationId,
        element: ElementId,
        holder: Option<String>,
    ) -> Result<RunState> {
        self.require_process(element)?;
        info!(application = %application, element = %element, "run started");
        Ok(RunState::new(application, element, holder))
    }

    /// Unsatisfied requirements of `element` given `data`.
    pub fn missing_requirements(
        &self,
        element: ElementId,
        data: &FormData,
    ) -> Vec<MissingRequirement> {
        let mut missing = Vec::new();
        for requisite in self.catalog.requisites(element) {
            let filled = data
                .value(&FieldRef::new(element, requisite.name.clone()))
                .is_some_and(|value| !is_blank(value));
            if requisite.required && !filled {
                missing.push(MissingRequirement::Requisite(requisite.name));
            }
        }
        for item in self.catalog.checklists(element) {
            let checked = data.checked(&FieldRef::new(element, item.name.clone())) == Some(true);
            if item.required && !checked {
                missing.push(MissingRequirement::ChecklistItem(item.name));
            }
        }
        for form in self.catalog.print_forms(element) {
            let signed = data
                .signed_artifact(&FieldRef::new(element, form.name.clone()))
                .is_some_and(|artifact| !artifact.trim().is_empty());
            if form.requires_signature && !signed {
                missing.push(MissingRequirement::SignedPrintForm(form.name));
            }
        }
        missing
    }

    pub fn is_complete(&self, element: ElementId, data: &FormData) -> bool {
        self.missing_requirements(element, data).is_empty()
    }

    /// Resolve the step after `from`, evaluating a decision when one follows.
    pub fn next_step(
        &self,
        from: ElementId,
        data: &FormData,
    ) -> Result<(Destination, Option<BranchTaken>)> {
        self.require_process(from)?;
        let outgoing = self.graph.outgoing(from);
        let target_is = |id: ElementId, element_type: ElementType| {
            self.graph.element(id).is_some_and(|e| e.is(element_type))
        };

        let decision = outgoing
            .iter()
            .map(|c| c.target())
            .find(|target| target_is(*target, ElementType::Decision))
            .or_else(|| {
                // An approval step hands its outcome to the decision behind it.
                outgoing
                    .iter()
                    .map(|c| c.target())
                    .filter(|target| target_is(*target, ElementType::Approval))
                    .flat_map(|approval| self.graph.outgoing(approval))
                    .map(|c| c.target())
                    .find(|target| target_is(*target, ElementType::Decision))
            });

        if let Some(decision) = decision {
            let evaluation =
                evaluate_decision(self.graph, decision, data).map_err(|err| match err {
                    Error::NoBranchAvailable { decision } => Error::UnresolvedDecision { decision },
                    other => other,
                })?;
            let branch = BranchTaken {
                decision,
                connection: evaluation.connection.id(),
                selection: evaluation.selection,
            };
            let target = evaluation.connection.target();
            let destination = if self.is_process(target) {
                Destination::Step(target)
            } else {
                Destination::Complete
            };
            return Ok((destination, Some(branch)));
        }

        let destination = match outgoing.first() {
            Some(connection) if self.is_process(connection.target()) => {
                Destination::Step(connection.target())
            }
            _ => Destination::Complete,
        };
        Ok((destination, None))
    }

    pub fn prepare_advance(&self, run: &mut RunState) -> Result<AdvancePlan> {
        if run.status == RunStatus::Completed {
            return Err(Error::RunCompleted);
        }
        if run.advancing {
            return Err(Error::AdvanceInProgress);
        }
        let from = run.current();
        let missing = self.missing_requirements(from, &run.form_data);
        if !missing.is_empty() {
            warn!(element = %from, missing = missing.len(), "step incomplete");
            return Err(Error::StepIncomplete {
                element: from,
                missing,
            });
        }
        let (destination, branch) = self.next_step(from, &run.form_data)?;
        let assignment = match destination {
            Destination::Step(next) => self.handoff(from, next, run.holder.as_deref()),
            Destination::Complete => None,
        };
        run.advancing = true;
        debug!(element = %from, destination = ?destination, "advance prepared");
        Ok(AdvancePlan {
            application: run.application,
            from,
            destination,
            form_data: run.form_data.clone(),
            assignment,
            branch,
        })
    }

    pub fn commit_advance(&self, run: &mut RunState, plan: AdvancePlan) -> Result<Destination> {
        if plan.application != run.application {
            return Err(Error::ForeignAdvancePlan {
                expected: run.application,
                found: plan.application,
            });
        }
        if !run.advancing || plan.from != run.current() {
            return Err(Error::NoAdvancePending);
        }
        run.advancing = false;
        // Moving on after going back discards the old forward path.
        run.visited.truncate(run.position + 1);
        let path = &run.visited;
        run.completed_steps.retain(|step| path.contains(step));
        run.completed_steps.insert(plan.from);
        if let Some(assignment) = plan.assignment {
            run.holder = Some(assignment.holder);
        }
        match plan.destination {
            Destination::Step(next) => {
                run.visited.push(next);
                run.position += 1;
                info!(application = %run.application, from = %plan.from, to = %next, "advanced");
            }
            Destination::Complete => {
                run.status = RunStatus::Completed;
                info!(application = %run.application, "run completed");
            }
        }
        Ok(plan.destination)
    }

    pub fn abort_advance(&self, run: &mut RunState) -> Result<()> {
        if !run.advancing {
            return Err(Error::NoAdvancePending);
        }
        run.advancing = false;
        debug!(application = %run.application, "advance aborted");
        Ok(())
    }

    /// Prepare, persist and commit in one go. Nothing moves unless every
    /// collaborator call succeeds.
    pub fn advance(
        &self,
        run: &mut RunState,
        gateway: &mut impl NavigationGateway,
    ) -> Result<Destination> {
        let plan = self.prepare_advance(run)?;
        let persisted = gateway
            .save_form_data(plan.application, &plan.form_data)
            .and_then(|()| match &plan.assignment {
                Some(assignment) => gateway.assign_holder(plan.application, assignment),
                None => Ok(()),
            });
        if let Err(err) = persisted {
            warn!(application = %plan.application, error = %err, "advance not persisted");
            self.abort_advance(run)?;
            return Err(err.into());
        }
        self.commit_advance(run, plan)
    }

    /// Step back along the visited path. Evaluates nothing.
    pub fn previous(&self, run: &mut RunState) -> Result<ElementId> {
        if run.advancing {
            return Err(Error::AdvanceInProgress);
        }
        if run.status == RunStatus::Completed {
            return Err(Error::RunCompleted);
        }
        if run.position == 0 {
            return Err(Error::NoPreviousStep);
        }
        run.position -= 1;
        Ok(run.current())
    }

    fn handoff(
        &self,
        from: ElementId,
        next: ElementId,
        holder: Option<&str>,
    ) -> Option<Assignment> {
        if !self.catalog.requires_handoff(from) {
            return None;
        }
        let assignee = self
            .graph
            .element(next)?
            .properties()
            .as_process()?
            .default_assignee()?;
        (holder != Some(assignee)).then(|| Assignment {
            element: next,
            holder: assignee.to_owned(),
        })
    }

    fn is_process(&self, id: ElementId) -> bool {
        self.graph
            .element(id)
            .is_some_and(|e| e.is(ElementType::Process))
    }

    fn require_process(&self, id: ElementId) -> Result<()> {
        if self.graph.require_element(id)?.is(ElementType::Process) {
            Ok(())
        } else {
            Err(Error::NotAProcessStep(id))
        }
    }
}
