use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use serde_json::json;

use workflow_schema::core::{
    Condition, Connection, Element, ElementType, FieldRef, Rule, RuleField, RuleOp, RuleType,
    SchemaGraph,
};
use workflow_schema::layout::{connector_geometry, Layout};
use workflow_schema::runtime::{evaluate_decision, FormData};
use workflow_schema::types::{ElementId, Point, Rect, SchemaId, Size};

// Benchmark identity (keep stable):
// - Groups: `evaluate` and `layout`.
// - Case ids after the `/` stay the same across refactors so results compare.

struct Fan {
    graph: SchemaGraph,
    decision: ElementId,
    step: ElementId,
}

/// A decision with `branches` rule-gated branches followed by one rule-less default.
fn decision_fan(branches: usize, rules_per_branch: usize) -> Fan {
    let mut graph = SchemaGraph::new(SchemaId::new());
    let schema = graph.schema_id();
    let step = graph
        .add_element(Element::new(schema, ElementType::Process, "Intake", Point::default()))
        .expect("step");
    let decision = graph
        .add_element(Element::new(schema, ElementType::Decision, "Route", Point::default()))
        .expect("decision");
    graph
        .add_connection(Connection::new(schema, step, decision, Condition::new("#000")))
        .expect("step edge");

    for idx in 0..=branches {
        let target = graph
            .add_element(Element::new(
                schema,
                ElementType::Process,
                format!("Branch {idx}"),
                Point::new(240.0, idx as f64 * 60.0),
            ))
            .expect("branch target");
        let mut condition = Condition::new("#4a5568");
        if idx < branches {
            for rule in 0..rules_per_branch {
                condition = condition.with_rule(Rule::new(
                    RuleType::Number,
                    RuleField::Field(FieldRef::new(step, format!("amount{rule}"))),
                    RuleOp::Gt,
                    json!(idx * 100),
                ));
            }
        }
        graph
            .add_connection(Connection::new(schema, decision, target, condition))
            .expect("branch");
    }
    Fan {
        graph,
        decision,
        step,
    }
}

fn form_data(step: ElementId, rules: usize, amount: i64) -> FormData {
    let mut data = FormData::new();
    for rule in 0..rules {
        data.insert(FieldRef::new(step, format!("amount{rule}")), json!(amount));
    }
    data
}

fn benches_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for (case, branches, rules) in [("small", 3, 1), ("wide", 32, 4), ("deep_rules", 8, 16)] {
        let fan = decision_fan(branches, rules);
        // Fails every gate, so each branch is tried before the default.
        let data = form_data(fan.step, rules, -1);
        group.throughput(Throughput::Elements(branches as u64 + 1));
        group.bench_function(case, |b| {
            b.iter(|| {
                let evaluation = evaluate_decision(&fan.graph, fan.decision, black_box(&data))
                    .expect("evaluation");
                black_box(evaluation.connection.id())
            })
        });
    }
    group.finish();
}

fn benches_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let size = Size::new(120.0, 60.0);
    let rects = (0..64)
        .map(|idx| {
            let origin = Point::new((idx % 8) as f64 * 240.0, (idx / 8) as f64 * 120.0);
            Rect::new(origin, size)
        })
        .collect::<Vec<_>>();

    group.throughput(Throughput::Elements(rects.len() as u64 - 1));
    group.bench_function("route_chain_64", |b| {
        b.iter(|| {
            let mut points = 0usize;
            for pair in rects.windows(2) {
                if let Some(geometry) = connector_geometry(&pair[0], &pair[1], None) {
                    points += geometry.path.len();
                }
            }
            black_box(points)
        })
    });

    let layout = Layout::default();
    group.bench_function("drag_snap", |b| {
        b.iter_batched(
            || Point::new(1234.5, 678.9),
            |pointer| layout.drag_to(pointer, Point::new(30.0, 20.0), size),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, benches_evaluate, benches_layout);
criterion_main!(benches);
