//! In-memory schema graph.
//!
//! Elements are nodes and connections are edges of a petgraph `StableDiGraph`, so
//! indices survive removals and removing a node drops its incident edges with it.
//! Every mutation is synchronous; persisting it is the caller's business.

use std::collections::HashMap;

use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::Direction;
use tracing::{debug, warn};

use super::condition::{Condition, ConditionWire, ElementNames};
use super::connection::Connection;
use super::element::{Element, ElementType};
use super::properties::NodeConfig;
use crate::config::BranchConfig;
use crate::error::{Error, Result};
use crate::types::{ConnectionId, ElementId, Point, SchemaId};

#[derive(Debug, Clone)]
pub struct SchemaGraph {
    schema_id: SchemaId,
    graph: StableDiGraph<Element, Connection>,
    nodes: HashMap<ElementId, NodeIndex>,
    edges: HashMap<ConnectionId, EdgeIndex>,
    order: Vec<ElementId>,
    next_seq: u64,
    branches: BranchConfig,
}

/// An element removed together with the connections that referenced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedElement {
    pub element: Element,
    pub connections: Vec<Connection>,
}

impl SchemaGraph {
    pub fn new(schema_id: SchemaId) -> Self {
        Self::with_branches(schema_id, BranchConfig::default())
    }

    pub fn with_branches(schema_id: SchemaId, branches: BranchConfig) -> Self {
        Self {
            schema_id,
            graph: StableDiGraph::new(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            order: Vec::new(),
            next_seq: 1,
            branches,
        }
    }

    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    pub fn branches(&self) -> &BranchConfig {
        &self.branches
    }

    pub fn element_count(&self) -> usize {
        self.order.len()
    }

    pub fn connection_count(&self) -> usize {
        self.edges.len()
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.nodes
            .get(&id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.edges
            .get(&id)
            .and_then(|idx| self.graph.edge_weight(*idx))
    }

    pub fn require_element(&self, id: ElementId) -> Result<&Element> {
        self.element(id).ok_or(Error::ElementNotFound(id))
    }

    pub fn require_connection(&self, id: ConnectionId) -> Result<&Connection> {
        self.connection(id).ok_or(Error::ConnectionNotFound(id))
    }

    /// Elements in creation order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> + '_ {
        self.order.iter().filter_map(|id| self.element(*id))
    }

    /// Connections in creation order.
    pub fn connections(&self) -> Vec<&Connection> {
        let mut connections = self.graph.edge_weights().collect::<Vec<_>>();
        connections.sort_by_key(|c| c.seq());
        connections
    }

    pub fn elements_of_type(
        &self,
        element_type: ElementType,
    ) -> impl Iterator<Item = &Element> + '_ {
        self.elements().filter(move |e| e.is(element_type))
    }

    /// Outgoing connections of `id` in creation order.
    pub fn outgoing(&self, id: ElementId) -> Vec<&Connection> {
        self.incident(id, Direction::Outgoing)
    }

    /// Incoming connections of `id` in creation order.
    pub fn incoming(&self, id: ElementId) -> Vec<&Connection> {
        self.incident(id, Direction::Incoming)
    }

    fn incident(&self, id: ElementId, direction: Direction) -> Vec<&Connection> {
        let Some(idx) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut connections = self
            .graph
            .edges_directed(*idx, direction)
            .map(|edge| edge.weight())
            .collect::<Vec<_>>();
        connections.sort_by_key(|c| c.seq());
        connections
    }

    /// Whether a directed path leads from `from` to `to`.
    pub fn reaches(&self, from: ElementId, to: ElementId) -> bool {
        match (self.nodes.get(&from), self.nodes.get(&to)) {
            (Some(a), Some(b)) => has_path_connecting(&self.graph, *a, *b, None),
            _ => false,
        }
    }

    pub fn add_element(&mut self, element: Element) -> Result<ElementId> {
        let id = element.id();
        if self.nodes.contains_key(&id) {
            return Err(Error::DuplicateElement(id));
        }
        if element.schema_id() != self.schema_id {
            return Err(Error::ForeignElement {
                element: id,
                expected: self.schema_id,
                found: element.schema_id(),
            });
        }
        debug!(element = %id, element_type = %element.element_type(), "add element");
        let idx = self.graph.add_node(element);
        self.nodes.insert(id, idx);
        self.order.push(id);
        Ok(id)
    }

    /// Validate a prospective edge against the pairing table without inserting it.
    pub fn check_pairing(&self, source: ElementId, target: ElementId) -> Result<()> {
        let source_type = self.require_element(source)?.element_type();
        let target_type = self.require_element(target)?.element_type();
        if source == target || !source_type.can_connect_to(target_type) {
            return Err(Error::InvalidConnectionType {
                source_type,
                target_type,
            });
        }
        Ok(())
    }

    pub fn add_connection(&mut self, mut connection: Connection) -> Result<ConnectionId> {
        connection.set_seq(self.next_seq);
        let id = self.insert_connection(connection)?;
        self.next_seq += 1;
        Ok(id)
    }

    /// Re-insert a previously removed connection, keeping its creation order.
    pub fn restore_connection(&mut self, connection: Connection) -> Result<ConnectionId> {
        let seq = connection.seq();
        let id = self.insert_connection(connection)?;
        self.next_seq = self.next_seq.max(seq + 1);
        Ok(id)
    }

    fn insert_connection(&mut self, connection: Connection) -> Result<ConnectionId> {
        let id = connection.id();
        if self.edges.contains_key(&id) {
            return Err(Error::DuplicateConnection(id));
        }
        if connection.schema_id() != self.schema_id {
            return Err(Error::ForeignElement {
                element: connection.source(),
                expected: self.schema_id,
                found: connection.schema_id(),
            });
        }
        if let Err(err) = self.check_pairing(connection.source(), connection.target()) {
            warn!(connection = %id, error = %err, "connection rejected");
            return Err(err);
        }
        self.check_branch_label(connection.source(), connection.label(), None)?;

        let source = connection.source();
        let target = connection.target();
        let approval_feed = self
            .element(source)
            .is_some_and(|e| e.is(ElementType::Approval));
        if approval_feed && !self.is_strict_gate(target) {
            self.check_gate_branches(target)?;
        }
        let (Some(a), Some(b)) = (
            self.nodes.get(&source).copied(),
            self.nodes.get(&connection.target()).copied(),
        ) else {
            return Err(Error::ElementNotFound(source));
        };
        debug!(connection = %id, %source, target = %connection.target(), "add connection");
        let idx = self.graph.add_edge(a, b, connection);
        self.edges.insert(id, idx);
        self.refresh_needs_configuration(source);
        Ok(id)
    }

    /// A decision fed by an APPROVAL, or one scaffolded as an approve/reject gate.
    pub fn is_strict_gate(&self, decision: ElementId) -> bool {
        let Some(element) = self.element(decision) else {
            return false;
        };
        let Some(config) = element.properties().as_decision() else {
            return false;
        };
        config.is_strict()
            || self.incoming(decision).iter().any(|c| {
                self.element(c.source())
                    .is_some_and(|e| e.is(ElementType::Approval))
            })
    }

    fn check_branch_label(
        &self,
        source: ElementId,
        label: Option<&str>,
        replacing: Option<ConnectionId>,
    ) -> Result<()> {
        if !self.is_strict_gate(source) {
            return Ok(());
        }
        let label = label.unwrap_or_default();
        if !self.branches.is_reserved(label) {
            return Err(Error::ReservedBranchLabel {
                decision: source,
                label: label.to_owned(),
            });
        }
        let duplicate = self
            .outgoing(source)
            .iter()
            .any(|c| Some(c.id()) != replacing && c.label() == Some(label));
        if duplicate {
            return Err(Error::DuplicateBranchLabel {
                decision: source,
                label: label.to_owned(),
            });
        }
        Ok(())
    }

    /// Branches of a decision about to turn into a strict gate must already carry
    /// distinct reserved labels.
    fn check_gate_branches(&self, decision: ElementId) -> Result<()> {
        let mut seen: Vec<&str> = Vec::new();
        for connection in self.outgoing(decision) {
            let label = connection.label().unwrap_or_default();
            let err = if !self.branches.is_reserved(label) {
                Error::ReservedBranchLabel {
                    decision,
                    label: label.to_owned(),
                }
            } else if seen.contains(&label) {
                Error::DuplicateBranchLabel {
                    decision,
                    label: label.to_owned(),
                }
            } else {
                seen.push(label);
                continue;
            };
            warn!(%decision, error = %err, "decision cannot become a strict gate");
            return Err(err);
        }
        Ok(())
    }

    /// Remove an element and every connection incident to it.
    pub fn remove_element(&mut self, id: ElementId) -> Result<RemovedElement> {
        let idx = *self.nodes.get(&id).ok_or(Error::ElementNotFound(id))?;

        let mut connections = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|edge| edge.weight().clone())
            .collect::<Vec<_>>();
        connections.sort_by_key(|c| c.seq());
        connections.dedup_by_key(|c| c.id());

        let element = self.graph.remove_node(idx).ok_or(Error::ElementNotFound(id))?;
        self.nodes.remove(&id);
        self.order.retain(|e| *e != id);
        for connection in &connections {
            self.edges.remove(&connection.id());
        }

        for edge in self.graph.edge_weights_mut() {
            edge.condition_mut().detach_element(id, element.name());
        }
        for connection in &connections {
            if connection.target() == id {
                self.refresh_needs_configuration(connection.source());
            }
        }
        debug!(element = %id, cascaded = connections.len(), "remove element");
        Ok(RemovedElement {
            element,
            connections,
        })
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection> {
        let idx = self.edges.remove(&id).ok_or(Error::ConnectionNotFound(id))?;
        let connection = self
            .graph
            .remove_edge(idx)
            .ok_or(Error::ConnectionNotFound(id))?;
        self.refresh_needs_configuration(connection.source());
        debug!(connection = %id, "remove connection");
        Ok(connection)
    }

    /// Move an element; returns its previous position.
    pub fn move_element(&mut self, id: ElementId, position: Point) -> Result<Point> {
        let element = self.element_mut(id)?;
        let previous = element.position();
        element.set_position(position);
        Ok(previous)
    }

    /// Rename an element; returns the previous name. Bound rule fields follow the
    /// new name automatically.
    pub fn rename_element(&mut self, id: ElementId, name: impl Into<String>) -> Result<String> {
        let element = self.element_mut(id)?;
        let previous = element.name().to_owned();
        element.set_name(name);
        Ok(previous)
    }

    /// Replace an element's configuration; returns the previous one.
    pub fn set_properties(&mut self, id: ElementId, properties: NodeConfig) -> Result<NodeConfig> {
        let is_decision = self.require_element(id)?.is(ElementType::Decision);
        let turns_strict = properties.as_decision().is_some_and(|c| c.is_strict());
        if is_decision && turns_strict && !self.is_strict_gate(id) {
            self.check_gate_branches(id)?;
        }
        let element = self.element_mut(id)?;
        let previous = element.properties().clone();
        let found = properties.element_type();
        if !element.set_properties(properties) {
            return Err(Error::PropertiesTypeMismatch {
                element: id,
                expected: element.element_type(),
                found,
            });
        }
        self.refresh_needs_configuration(id);
        Ok(previous)
    }

    pub fn set_label(&mut self, id: ConnectionId, label: Option<String>) -> Result<Option<String>> {
        let source = self.require_connection(id)?.source();
        self.check_branch_label(source, label.as_deref(), Some(id))?;
        let connection = self.connection_mut(id)?;
        let previous = connection.label().map(str::to_owned);
        connection.set_label(label);
        Ok(previous)
    }

    pub fn set_condition(&mut self, id: ConnectionId, condition: Condition) -> Result<Condition> {
        let connection = self.connection_mut(id)?;
        let previous = connection.condition().clone();
        connection.set_condition(condition);
        Ok(previous)
    }

    /// Overwrite local state of an element with an authoritative copy.
    pub fn replace_element(&mut self, element: Element) -> Result<Element> {
        let id = element.id();
        let existing = self.element_mut(id)?;
        if existing.element_type() != element.element_type() {
            return Err(Error::PropertiesTypeMismatch {
                element: id,
                expected: existing.element_type(),
                found: element.element_type(),
            });
        }
        let previous = std::mem::replace(existing, element);
        self.refresh_needs_configuration(id);
        Ok(previous)
    }

    /// Overwrite label and condition of a connection with an authoritative copy.
    pub fn replace_connection(&mut self, connection: Connection) -> Result<Connection> {
        let existing = self.connection_mut(connection.id())?;
        let previous = existing.clone();
        existing.set_label(connection.label());
        existing.set_condition(connection.condition().clone());
        Ok(previous)
    }

    pub fn condition_wire(&self, id: ConnectionId) -> Result<ConditionWire> {
        Ok(self.require_connection(id)?.condition().to_wire(self))
    }

    /// Bind a persisted condition against this graph's element names.
    pub fn bind_condition(&self, wire: ConditionWire) -> Condition {
        Condition::from_wire(wire, self)
    }

    /// Deep copy under a new schema id with fresh element and connection ids.
    ///
    /// Creation order, positions, configuration, labels and conditions are kept;
    /// rule references follow their elements to the new ids. Returns the copy and
    /// the old-to-new element id map.
    pub fn rehomed(&self, schema_id: SchemaId) -> (SchemaGraph, HashMap<ElementId, ElementId>) {
        let mut copy = self.clone();
        copy.schema_id = schema_id;
        let element_ids = self
            .order
            .iter()
            .map(|id| (*id, ElementId::new()))
            .collect::<HashMap<_, _>>();

        for element in copy.graph.node_weights_mut() {
            let fresh = element_ids
                .get(&element.id())
                .copied()
                .unwrap_or_else(ElementId::new);
            element.rehome(fresh, schema_id);
        }
        for connection in copy.graph.edge_weights_mut() {
            let source = element_ids
                .get(&connection.source())
                .copied()
                .unwrap_or(connection.source());
            let target = element_ids
                .get(&connection.target())
                .copied()
                .unwrap_or(connection.target());
            connection.rehome(ConnectionId::new(), schema_id, source, target);
            for (from, to) in &element_ids {
                connection.condition_mut().remap_element(*from, *to);
            }
        }

        copy.nodes = copy
            .graph
            .node_indices()
            .filter_map(|idx| copy.graph.node_weight(idx).map(|e| (e.id(), idx)))
            .collect();
        copy.edges = copy
            .graph
            .edge_indices()
            .filter_map(|idx| copy.graph.edge_weight(idx).map(|c| (c.id(), idx)))
            .collect();
        copy.order = self
            .order
            .iter()
            .filter_map(|id| element_ids.get(id).copied())
            .collect();
        (copy, element_ids)
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        let idx = *self.nodes.get(&id).ok_or(Error::ElementNotFound(id))?;
        self.graph
            .node_weight_mut(idx)
            .ok_or(Error::ElementNotFound(id))
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Result<&mut Connection> {
        let idx = *self.edges.get(&id).ok_or(Error::ConnectionNotFound(id))?;
        self.graph
            .edge_weight_mut(idx)
            .ok_or(Error::ConnectionNotFound(id))
    }

    fn refresh_needs_configuration(&mut self, id: ElementId) {
        let has_branch = !self.outgoing(id).is_empty();
        let Ok(element) = self.element_mut(id) else {
            return;
        };
        if let Some(config) = element.properties_mut().as_decision_mut() {
            config.needs_configuration = !has_branch;
        }
    }
}

impl ElementNames for SchemaGraph {
    /// First element with that name in creation order.
    fn element_id_by_name(&self, name: &str) -> Option<ElementId> {
        self.elements().find(|e| e.name() == name).map(Element::id)
    }

    fn element_name(&self, id: ElementId) -> Option<&str> {
        self.element(id).map(Element::name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::SchemaGraph;
    use crate::core::condition::{Condition, FieldRef, Rule, RuleField, RuleOp, RuleType};
    use crate::core::connection::Connection;
    use crate::core::element::{Element, ElementType};
    use crate::core::properties::NodeConfig;
    use crate::error::Error;
    use crate::types::{ElementId, Point, SchemaId};

    fn add(graph: &mut SchemaGraph, element_type: ElementType, name: &str) -> ElementId {
        let element = Element::new(graph.schema_id(), element_type, name, Point::default());
        graph.add_element(element).expect("add element")
    }

    fn connect(graph: &mut SchemaGraph, source: ElementId, target: ElementId) -> Connection {
        Connection::new(graph.schema_id(), source, target, Condition::new("#000"))
    }

    #[test]
    fn process_to_process_is_rejected_and_graph_unchanged() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let a = add(&mut graph, ElementType::Process, "A");
        let b = add(&mut graph, ElementType::Process, "B");
        let connection = connect(&mut graph, a, b);
        let err = graph.add_connection(connection).expect_err("rejected");
        assert!(matches!(
            err,
            Error::InvalidConnectionType {
                source_type: ElementType::Process,
                target_type: ElementType::Process
            }
        ));
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.outgoing(a).is_empty());
    }

    #[test]
    fn self_loops_are_rejected() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let connection = connect(&mut graph, d, d);
        assert!(graph.add_connection(connection).is_err());
    }

    #[test]
    fn decision_needs_configuration_until_it_has_a_branch() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let p = add(&mut graph, ElementType::Process, "P");
        assert!(graph.element(d).expect("d").needs_configuration());

        let connection = connect(&mut graph, d, p);
        let id = graph.add_connection(connection).expect("connect");
        assert!(!graph.element(d).expect("d").needs_configuration());

        graph.remove_connection(id).expect("remove");
        assert!(graph.element(d).expect("d").needs_configuration());
    }

    #[test]
    fn removing_element_cascades_to_connections() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let p = add(&mut graph, ElementType::Process, "P");
        let d = add(&mut graph, ElementType::Decision, "D");
        let q = add(&mut graph, ElementType::Process, "Q");
        let c1 = connect(&mut graph, p, d);
        graph.add_connection(c1).expect("p->d");
        let c2 = connect(&mut graph, d, q);
        graph.add_connection(c2).expect("d->q");

        let removed = graph.remove_element(d).expect("remove");
        assert_eq!(removed.connections.len(), 2);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.outgoing(p).is_empty());
        assert!(graph.incoming(q).is_empty());
        assert!(graph.element(d).is_none());
    }

    #[test]
    fn removing_branch_target_reflags_decision() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let q = add(&mut graph, ElementType::Process, "Q");
        let c = connect(&mut graph, d, q);
        graph.add_connection(c).expect("d->q");
        graph.remove_element(q).expect("remove");
        assert!(graph.element(d).expect("d").needs_configuration());
    }

    #[test]
    fn outgoing_follows_creation_order() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let targets = (0..4)
            .map(|i| add(&mut graph, ElementType::Process, &format!("P{i}")))
            .collect::<Vec<_>>();
        for target in &targets {
            let c = connect(&mut graph, d, *target);
            graph.add_connection(c).expect("connect");
        }
        let order = graph
            .outgoing(d)
            .iter()
            .map(|c| c.target())
            .collect::<Vec<_>>();
        assert_eq!(order, targets);
    }

    #[test]
    fn restored_connection_keeps_its_place() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let a = add(&mut graph, ElementType::Process, "A");
        let b = add(&mut graph, ElementType::Process, "B");
        let first = connect(&mut graph, d, a);
        let first = graph.add_connection(first).expect("d->a");
        let second = connect(&mut graph, d, b);
        graph.add_connection(second).expect("d->b");

        let removed = graph.remove_connection(first).expect("remove");
        graph.restore_connection(removed).expect("restore");
        assert_eq!(graph.outgoing(d)[0].id(), first);
    }

    #[test]
    fn approval_fed_decision_requires_reserved_unique_labels() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let approval = add(&mut graph, ElementType::Approval, "Approve");
        let d = add(&mut graph, ElementType::Decision, "D");
        let yes = add(&mut graph, ElementType::Process, "Yes");
        let no = add(&mut graph, ElementType::Process, "No");
        let feed = connect(&mut graph, approval, d);
        graph.add_connection(feed).expect("approval->d");
        assert!(graph.is_strict_gate(d));

        let odd = connect(&mut graph, d, yes).with_label("maybe");
        assert!(matches!(
            graph.add_connection(odd),
            Err(Error::ReservedBranchLabel { .. })
        ));

        let approved = connect(&mut graph, d, yes).with_label("Согласовано");
        graph.add_connection(approved).expect("approved branch");
        let again = connect(&mut graph, d, no).with_label("Согласовано");
        assert!(matches!(
            graph.add_connection(again),
            Err(Error::DuplicateBranchLabel { .. })
        ));
        let rejected = connect(&mut graph, d, no).with_label("Отклонено");
        graph.add_connection(rejected).expect("rejected branch");
        assert_eq!(graph.outgoing(d).len(), 2);
    }

    #[test]
    fn approval_feed_checks_existing_branches() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let approval = add(&mut graph, ElementType::Approval, "Approve");
        let d = add(&mut graph, ElementType::Decision, "D");
        let p = add(&mut graph, ElementType::Process, "P");
        let q = add(&mut graph, ElementType::Process, "Q");
        let first = connect(&mut graph, d, p).with_label("maybe");
        graph.add_connection(first).expect("d->p");
        let second = connect(&mut graph, d, q).with_label("maybe");
        graph.add_connection(second).expect("d->q");

        let feed = connect(&mut graph, approval, d);
        assert!(matches!(
            graph.add_connection(feed),
            Err(Error::ReservedBranchLabel { .. })
        ));
        assert!(!graph.is_strict_gate(d));
        assert!(graph.incoming(d).is_empty());

        let ids = graph.outgoing(d).iter().map(|c| c.id()).collect::<Vec<_>>();
        graph
            .set_label(ids[0], Some("Согласовано".into()))
            .expect("relabel");
        graph
            .set_label(ids[1], Some("Согласовано".into()))
            .expect("relabel");
        let feed = connect(&mut graph, approval, d);
        assert!(matches!(
            graph.add_connection(feed),
            Err(Error::DuplicateBranchLabel { .. })
        ));
        assert_eq!(graph.connection_count(), 2);

        graph
            .set_label(ids[1], Some("Отклонено".into()))
            .expect("relabel");
        let feed = connect(&mut graph, approval, d);
        graph.add_connection(feed).expect("approval->d");
        assert!(graph.is_strict_gate(d));
    }

    #[test]
    fn strict_flag_checks_existing_branches() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let d = add(&mut graph, ElementType::Decision, "D");
        let p = add(&mut graph, ElementType::Process, "P");
        let branch = connect(&mut graph, d, p);
        let branch = graph.add_connection(branch).expect("d->p");

        let mut strict = graph
            .element(d)
            .and_then(|e| e.properties().as_decision().cloned())
            .expect("decision config");
        strict.strict_gate = Some(true);
        let err = graph
            .set_properties(d, NodeConfig::Decision(strict.clone()))
            .expect_err("unlabelled branch");
        assert!(matches!(err, Error::ReservedBranchLabel { .. }));
        assert!(!graph.is_strict_gate(d));

        graph
            .set_label(branch, Some("Отклонено".into()))
            .expect("relabel");
        graph
            .set_properties(d, NodeConfig::Decision(strict))
            .expect("strict gate");
        assert!(graph.is_strict_gate(d));
    }

    #[test]
    fn rename_is_reflected_in_wire_conditions() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let p = add(&mut graph, ElementType::Process, "Intake");
        let d = add(&mut graph, ElementType::Decision, "D");
        let q = add(&mut graph, ElementType::Process, "Q");
        let rule = Rule::new(
            RuleType::Requisite,
            RuleField::Field(FieldRef::new(p, "status")),
            RuleOp::Eq,
            json!("ok"),
        );
        let c = Connection::new(
            graph.schema_id(),
            d,
            q,
            Condition::new("#000").with_rule(rule),
        );
        let id = graph.add_connection(c).expect("d->q");

        graph.rename_element(p, "Reception").expect("rename");
        let wire = graph.condition_wire(id).expect("wire");
        assert_eq!(wire.rules[0].field, "Reception.status");

        graph.remove_element(p).expect("remove");
        let wire = graph.condition_wire(id).expect("wire");
        assert_eq!(wire.rules[0].field, "Reception.status");
        assert!(matches!(
            graph.connection(id).expect("c").condition().rules[0].field,
            RuleField::Unresolved(_)
        ));
    }

    #[test]
    fn foreign_elements_are_rejected() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let element = Element::new(SchemaId::new(), ElementType::Process, "P", Point::default());
        assert!(matches!(
            graph.add_element(element),
            Err(Error::ForeignElement { .. })
        ));
    }

    #[test]
    fn reaches_follows_direction() {
        let mut graph = SchemaGraph::new(SchemaId::new());
        let s = add(&mut graph, ElementType::Start, "S");
        let p = add(&mut graph, ElementType::Process, "P");
        let e = add(&mut graph, ElementType::End, "E");
        let c = connect(&mut graph, s, p);
        graph.add_connection(c).expect("s->p");
        let c = connect(&mut graph, p, e);
        graph.add_connection(c).expect("p->e");
        assert!(graph.reaches(s, e));
        assert!(!graph.reaches(e, s));
    }
}
