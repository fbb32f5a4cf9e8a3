//! Property tests for layout geometry, the condition wire format, branch evaluation
//! and version cloning.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use workflow_schema::core::{
    create_new_version, diff, Condition, ConditionWire, Connection, Element, ElementType,
    FieldRef, Rule, RuleField, RuleOp, RuleType, Schema, SchemaGraph,
};
use workflow_schema::layout::{connector_segment, Grid, Viewport};
use workflow_schema::runtime::{evaluate, BranchSelection, FormData};
use workflow_schema::types::{ElementId, Point, Rect, SchemaId, Size};
use workflow_schema::Error;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_point(range: f64) -> impl Strategy<Value = Point> {
    (-range..range, -range..range).prop_map(|(x, y)| Point::new(x, y))
}

fn arb_rect() -> impl Strategy<Value = Rect> {
    (arb_point(500.0), 20.0..200.0, 20.0..200.0)
        .prop_map(|(origin, width, height)| Rect::new(origin, Size::new(width, height)))
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-zA-Zа-я0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn arb_extra(prefix: &'static str) -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,6}", arb_scalar(), 0..3).prop_map(move |entries| {
        entries
            .into_iter()
            .map(|(key, value)| (format!("{prefix}_{key}"), value))
            .collect()
    })
}

fn arb_rule_json() -> impl Strategy<Value = Value> {
    (
        prop_oneof![
            Just("requisite"),
            Just("checklist"),
            Just("railway"),
            Just("text"),
            Just("number"),
            Just("date"),
            Just("boolean"),
        ],
        "[A-Za-z]{1,6}\\.[a-z]{1,6}",
        prop_oneof![
            Just("eq"),
            Just("ne"),
            Just("contains"),
            Just("gt"),
            Just("lt"),
            Just("exists"),
        ],
        prop::option::of(arb_scalar()),
        prop::option::of(prop_oneof![Just("text"), Just("number"), Just("date")]),
        arb_extra("rule"),
    )
        .prop_map(|(rule_type, field, op, value, value_type, extra)| {
            let mut rule = extra;
            rule.insert("type".into(), json!(rule_type));
            rule.insert("field".into(), json!(field));
            rule.insert("op".into(), json!(op));
            if let Some(value) = value {
                rule.insert("value".into(), value);
            }
            if let Some(value_type) = value_type {
                rule.insert("valueType".into(), json!(value_type));
            }
            Value::Object(rule)
        })
}

fn arb_condition_json() -> impl Strategy<Value = Value> {
    (
        "#[0-9a-f]{6}",
        prop::collection::vec(arb_rule_json(), 0..4),
        prop::option::of(prop_oneof![Just(0u16), Just(90u16)]),
        arb_extra("x"),
    )
        .prop_map(|(color, rules, rotation, extra)| {
            let mut condition = extra;
            condition.insert("color".into(), json!(color));
            condition.insert("rules".into(), Value::Array(rules));
            if let Some(rotation) = rotation {
                condition.insert("labelRotation".into(), json!(rotation));
            }
            Value::Object(condition)
        })
}

/// A branch keyed on the railway value `v{n}`, or a rule-less branch.
fn arb_branches() -> impl Strategy<Value = Vec<Option<u8>>> {
    prop::collection::vec(prop::option::of(0u8..4), 0..6)
}

fn railway_branch(schema: SchemaId, wanted: Option<u8>) -> Connection {
    let mut condition = Condition::new("#000");
    if let Some(n) = wanted {
        condition = condition.with_rule(Rule::new(
            RuleType::Railway,
            RuleField::Railway("railway".into()),
            RuleOp::Eq,
            json!(format!("v{n}")),
        ));
    }
    Connection::new(schema, ElementId::new(), ElementId::new(), condition)
}

/// START -> P0 -> D0 -> P1 -> ... -> Pn -> END, each decision branch gated on the
/// step before it.
fn chained_schema(positions: &[Point]) -> Schema {
    let mut schema = Schema::new("Chain");
    let id = schema.id();
    let graph = schema.graph_mut().expect("draft");
    let add = |graph: &mut SchemaGraph, element_type, name: String, at| {
        graph
            .add_element(Element::new(id, element_type, name, at))
            .expect("element")
    };
    let link = |graph: &mut SchemaGraph, from, to, condition| {
        graph
            .add_connection(Connection::new(id, from, to, condition))
            .expect("connection")
    };

    let start = add(graph, ElementType::Start, "Start".into(), Point::default());
    let mut previous = add(graph, ElementType::Process, "P0".into(), positions[0]);
    link(graph, start, previous, Condition::new("#000"));
    for (index, at) in positions.iter().enumerate().skip(1) {
        let decision = add(graph, ElementType::Decision, format!("D{index}"), *at);
        let step = add(graph, ElementType::Process, format!("P{index}"), *at);
        link(graph, previous, decision, Condition::new("#000"));
        let gated = Condition::new("#0a0").with_rule(Rule::new(
            RuleType::Requisite,
            RuleField::Field(FieldRef::new(previous, "status")),
            RuleOp::Eq,
            json!("ok"),
        ));
        link(graph, decision, step, gated);
        previous = step;
    }
    let end = add(graph, ElementType::End, "End".into(), Point::new(4000.0, 0.0));
    link(graph, previous, end, Condition::new("#000"));
    schema
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn snapping_is_idempotent(
        p in arb_point(10_000.0),
        cell_width in 1.0..300.0,
        cell_height in 1.0..300.0,
    ) {
        let grid = Grid::new(cell_width, cell_height);
        let once = grid.snap(p);
        prop_assert_eq!(grid.snap(once), once);
    }

    #[test]
    fn zoom_keeps_the_point_under_the_cursor(
        pan in arb_point(1_000.0),
        cursor in arb_point(1_000.0),
        factor in 0.25..4.0,
    ) {
        let mut viewport = Viewport::default();
        viewport.set_pan(pan);
        let before = viewport.screen_to_world(cursor);
        viewport.zoom_at(cursor, factor);
        let after = viewport.screen_to_world(cursor);
        prop_assert!(before.distance(after) < 1e-6);
    }

    #[test]
    fn connector_endpoints_lie_on_both_outlines(a in arb_rect(), b in arb_rect()) {
        prop_assume!(!a.overlaps(&b));
        let (start, end) = connector_segment(&a, &b).expect("distinct centers");
        prop_assert!(a.distance_to_boundary(start) < 1e-6);
        prop_assert!(b.distance_to_boundary(end) < 1e-6);
    }

    #[test]
    fn condition_wire_round_trips_unknown_keys(original in arb_condition_json()) {
        let wire = ConditionWire::parse(&original.to_string()).expect("parse");
        let text = wire.to_json_string().expect("serialize");
        let reparsed: Value = serde_json::from_str(&text).expect("json");
        prop_assert_eq!(&reparsed, &original);

        // Binding against a graph with no matching names keeps every field verbatim.
        let names = SchemaGraph::new(SchemaId::new());
        let bound = Condition::from_wire(wire.clone(), &names);
        prop_assert_eq!(bound.to_wire(&names), wire);
    }

    #[test]
    fn evaluation_takes_first_match_then_default_then_first(
        wanted in arb_branches(),
        railway in 0u8..4,
    ) {
        let schema = SchemaId::new();
        let decision = ElementId::new();
        let branches = wanted
            .iter()
            .map(|w| railway_branch(schema, *w))
            .collect::<Vec<_>>();
        let refs = branches.iter().collect::<Vec<_>>();
        let mut data = FormData::new();
        data.set_railway(json!(format!("v{railway}")));

        match evaluate(decision, &refs, &data) {
            Err(Error::NoBranchAvailable { decision: d }) => {
                prop_assert!(wanted.is_empty());
                prop_assert_eq!(d, decision);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
            Ok(evaluation) => {
                let expected = wanted
                    .iter()
                    .position(|w| *w == Some(railway))
                    .or_else(|| wanted.iter().position(Option::is_none))
                    .unwrap_or(0);
                prop_assert_eq!(evaluation.connection.id(), branches[expected].id());
                let matched = wanted.iter().any(|w| *w == Some(railway));
                if matched {
                    prop_assert_eq!(evaluation.selection, BranchSelection::Matched);
                } else {
                    prop_assert_ne!(evaluation.selection, BranchSelection::Matched);
                }
            }
        }
    }

    #[test]
    fn new_version_has_identical_content(
        positions in prop::collection::vec(arb_point(2_000.0), 1..6),
    ) {
        let source = chained_schema(&positions);
        let draft = create_new_version(&source);
        prop_assert_ne!(draft.id(), source.id());
        prop_assert_eq!(draft.version(), source.version() + 1);
        prop_assert!(diff(source.graph(), draft.graph()).is_empty());
        for (a, b) in source.graph().elements().zip(draft.graph().elements()) {
            prop_assert_ne!(a.id(), b.id());
        }
    }
}
