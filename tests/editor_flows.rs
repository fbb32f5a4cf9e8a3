use workflow_schema::core::{Element, ElementType, SchemaGraph};
use workflow_schema::editor::{Editor, EditorEvent, EditorState, Effect, PointerButton, Tool};
use workflow_schema::runtime::{InMemoryCatalog, Transition as StepTransition, TransitionKind};
use workflow_schema::sync::{EntityStore, InMemoryStore, Outbox, ReadModel};
use workflow_schema::types::{ElementId, Point, SchemaId};
use workflow_schema::EngineConfig;

fn add(graph: &mut SchemaGraph, element_type: ElementType, name: &str, at: Point) -> ElementId {
    let element = Element::new(graph.schema_id(), element_type, name, at);
    graph.add_element(element).expect("element")
}

fn click(at: Point) -> EditorEvent {
    EditorEvent::PointerDown {
        button: PointerButton::Primary,
        at,
    }
}

#[test]
fn placing_an_approval_adds_its_decision() {
    let config = EngineConfig::default();
    let catalog = InMemoryCatalog::new();
    let editor = Editor::new(&config, &catalog);
    let mut graph = SchemaGraph::new(SchemaId::new());

    let state = editor
        .handle(
            EditorState::default(),
            &mut graph,
            EditorEvent::ChooseTool(Tool::Place(ElementType::Approval)),
        )
        .state;
    let transition = editor.handle(state, &mut graph, click(Point::new(250.0, 200.0)));

    assert_eq!(transition.state.tool, Tool::Select);
    assert_eq!(transition.effects.len(), 1);
    assert_eq!(graph.element_count(), 2);
    assert_eq!(graph.connection_count(), 1);
    let approval = transition.state.selection.expect("placed element selected");
    let placed = graph.element(approval).expect("approval");
    assert!(placed.is(ElementType::Approval));
    assert_eq!(placed.position(), Point::new(240.0, 180.0));
    let decision = graph.outgoing(approval)[0].target();
    assert!(graph.is_strict_gate(decision));
}

#[test]
fn rejected_connection_returns_to_select() {
    let config = EngineConfig::default();
    let catalog = InMemoryCatalog::new();
    let editor = Editor::new(&config, &catalog);
    let mut graph = SchemaGraph::new(SchemaId::new());
    add(&mut graph, ElementType::Process, "A", Point::new(0.0, 0.0));
    add(&mut graph, ElementType::Process, "B", Point::new(240.0, 0.0));

    let mut state = EditorState::default();
    for event in [
        EditorEvent::ChooseTool(Tool::Connect {
            pending_source: None,
        }),
        click(Point::new(60.0, 30.0)),
    ] {
        state = editor.handle(state, &mut graph, event).state;
    }
    assert!(state.pending_source().is_some());

    let transition = editor.handle(state, &mut graph, click(Point::new(300.0, 30.0)));
    assert_eq!(transition.state.tool, Tool::Select);
    assert!(matches!(transition.effects.as_slice(), [Effect::Notify(_)]));
    assert_eq!(graph.connection_count(), 0);
}

#[test]
fn approve_reject_step_scaffolds_both_branches() {
    let config = EngineConfig::default();
    let mut graph = SchemaGraph::new(SchemaId::new());
    let step = add(&mut graph, ElementType::Process, "Review", Point::new(0.0, 0.0));
    let decision = add(&mut graph, ElementType::Decision, "Outcome", Point::new(240.0, 0.0));
    let mut catalog = InMemoryCatalog::new();
    catalog.add_transition(
        step,
        StepTransition::new("approve-or-reject", TransitionKind::ApproveReject),
    );
    let editor = Editor::new(&config, &catalog);

    let mut state = EditorState::default();
    for event in [
        EditorEvent::ChooseTool(Tool::Connect {
            pending_source: None,
        }),
        click(Point::new(60.0, 30.0)),
    ] {
        state = editor.handle(state, &mut graph, event).state;
    }
    let transition = editor.handle(state, &mut graph, click(Point::new(300.0, 30.0)));

    assert!(matches!(transition.effects.as_slice(), [Effect::Persist(_)]));
    assert!(graph.is_strict_gate(decision));
    let mut labels = graph
        .outgoing(decision)
        .iter()
        .filter_map(|c| c.label().map(str::to_owned))
        .collect::<Vec<_>>();
    labels.sort();
    let mut expected = vec![config.branches.approved.clone(), config.branches.rejected.clone()];
    expected.sort();
    assert_eq!(labels, expected);
    assert_eq!(graph.element_count(), 4);
}

#[test]
fn failed_flush_undoes_the_edit() {
    let config = EngineConfig::default();
    let catalog = InMemoryCatalog::new();
    let editor = Editor::new(&config, &catalog);
    let mut graph = SchemaGraph::new(SchemaId::new());
    let schema = graph.schema_id();
    let mut outbox = Outbox::new();
    let mut store = InMemoryStore::new();
    let mut read_model = ReadModel::new();

    let state = editor
        .handle(
            EditorState::default(),
            &mut graph,
            EditorEvent::ChooseTool(Tool::Place(ElementType::Process)),
        )
        .state;
    let placed = editor.handle(state, &mut graph, click(Point::new(300.0, 200.0)));
    outbox.enqueue_effects(schema, &placed.effects);
    outbox
        .flush(&mut graph, &mut store, &mut read_model)
        .expect("first flush");
    assert_eq!(store.list_elements(schema).expect("list").len(), 1);

    let element = placed.state.selection.expect("selected");
    let deleted = editor.handle(placed.state, &mut graph, EditorEvent::DeleteSelection);
    assert_eq!(graph.element_count(), 0);
    outbox.enqueue_effects(schema, &deleted.effects);
    store.fail_next(true);

    let err = outbox
        .flush(&mut graph, &mut store, &mut read_model)
        .expect_err("store unavailable");
    assert!(err.is_retryable());
    assert!(graph.element(element).is_some());
    assert!(read_model.is_stale(schema));
    assert_eq!(store.list_elements(schema).expect("list").len(), 1);
}
