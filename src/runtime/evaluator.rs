//! Decision branch evaluation.
//!
//! Branches are tried in creation order. The first branch whose rules all pass wins.
//! Otherwise the first rule-less branch is the default, and failing that the first
//! branch is the fallback.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::form_data::{is_blank, FormData};
use crate::core::condition::{Rule, RuleField, RuleOp, RuleType, ValueType};
use crate::core::connection::Connection;
use crate::core::graph::SchemaGraph;
use crate::error::{Error, Result};
use crate::types::ElementId;

/// Why a branch was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSelection {
    /// Every rule of the branch passed.
    Matched,
    /// Nothing matched; the first rule-less branch was taken.
    Default,
    /// Nothing matched and no branch is rule-less; the first branch was taken.
    Fallback,
    /// The only branch, and it has no rules.
    OnlyCandidate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation<'a> {
    pub connection: &'a Connection,
    pub selection: BranchSelection,
}

/// Choose a branch among `branches`, which must be in creation order.
pub fn evaluate<'a>(
    decision: ElementId,
    branches: &[&'a Connection],
    data: &FormData,
) -> Result<Evaluation<'a>> {
    let Some(first) = branches.first().copied() else {
        return Err(Error::NoBranchAvailable { decision });
    };
    let evaluation = if branches.len() == 1 && first.condition().is_unconditional() {
        Evaluation {
            connection: first,
            selection: BranchSelection::OnlyCandidate,
        }
    } else if let Some(matched) = branches
        .iter()
        .copied()
        .find(|branch| rules_pass(&branch.condition().rules, data))
    {
        Evaluation {
            connection: matched,
            selection: BranchSelection::Matched,
        }
    } else if let Some(default) = branches
        .iter()
        .copied()
        .find(|branch| branch.condition().is_unconditional())
    {
        Evaluation {
            connection: default,
            selection: BranchSelection::Default,
        }
    } else {
        Evaluation {
            connection: first,
            selection: BranchSelection::Fallback,
        }
    };
    debug!(
        decision = %decision,
        connection = %evaluation.connection.id(),
        selection = ?evaluation.selection,
        "branch selected"
    );
    Ok(evaluation)
}

/// Evaluate a decision using its outgoing connections in `graph`.
pub fn evaluate_decision<'a>(
    graph: &'a SchemaGraph,
    decision: ElementId,
    data: &FormData,
) -> Result<Evaluation<'a>> {
    graph.require_element(decision)?;
    let branches = graph.outgoing(decision);
    evaluate(decision, &branches, data)
}

/// An empty rule set never passes on its own.
pub fn rules_pass(rules: &[Rule], data: &FormData) -> bool {
    !rules.is_empty() && rules.iter().all(|rule| rule_passes(rule, data))
}

pub fn rule_passes(rule: &Rule, data: &FormData) -> bool {
    let actual = lookup(rule, data);
    if rule.op == RuleOp::Exists {
        return actual.as_ref().is_some_and(|value| !is_blank(value));
    }
    let expected = rule.value.as_ref().unwrap_or(&Value::Null);
    match rule.value_type() {
        ValueType::Boolean => compare_booleans(rule.op, actual.as_ref(), expected),
        ValueType::Number => compare_ordered(rule.op, actual.as_ref(), expected, as_number),
        ValueType::Date => compare_ordered(rule.op, actual.as_ref(), expected, as_datetime),
        ValueType::Text => compare_text(rule.op, actual.as_ref(), expected),
    }
}

fn lookup(rule: &Rule, data: &FormData) -> Option<Value> {
    match &rule.field {
        RuleField::Railway(_) => data.railway().cloned(),
        RuleField::Field(field) if rule.rule_type == RuleType::Checklist => data
            .checked(field)
            .map(Value::Bool)
            .or_else(|| data.value(field).cloned()),
        RuleField::Field(field) => data.value(field).cloned(),
        RuleField::Unresolved(path) => data.unbound(path).cloned(),
    }
}

// An untouched checkbox reads as unchecked.
fn compare_booleans(op: RuleOp, actual: Option<&Value>, expected: &Value) -> bool {
    let actual = match actual {
        Some(value) => as_bool(value),
        None => Some(false),
    };
    match (actual, as_bool(expected)) {
        (Some(a), Some(e)) => match op {
            RuleOp::Eq => a == e,
            RuleOp::Ne => a != e,
            _ => false,
        },
        _ => false,
    }
}

// A missing or unparseable value fails every comparison, `ne` included.
fn compare_ordered<T: PartialOrd>(
    op: RuleOp,
    actual: Option<&Value>,
    expected: &Value,
    parse: fn(&Value) -> Option<T>,
) -> bool {
    let (Some(a), Some(e)) = (actual.and_then(parse), parse(expected)) else {
        return false;
    };
    match op {
        RuleOp::Eq => a == e,
        RuleOp::Ne => a != e,
        RuleOp::Gt => a > e,
        RuleOp::Lt => a < e,
        RuleOp::Contains | RuleOp::Exists => false,
    }
}

// A missing value reads as blank text.
fn compare_text(op: RuleOp, actual: Option<&Value>, expected: &Value) -> bool {
    let actual = actual.map(as_text).unwrap_or_default();
    let expected = as_text(expected);
    match op {
        RuleOp::Eq => actual == expected,
        RuleOp::Ne => actual != expected,
        RuleOp::Contains => actual.contains(&expected),
        RuleOp::Gt | RuleOp::Lt | RuleOp::Exists => false,
    }
}

fn as_text(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    text.trim().to_lowercase()
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" | "да" => Some(true),
            "false" | "0" | "no" | "off" | "нет" | "" => Some(false),
            _ => None,
        },
        Value::Null => Some(false),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let text = text.trim().replace(' ', "").replace(',', ".");
            text.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn as_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(text) => parse_datetime(text.trim()),
        // Milliseconds since the epoch.
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|at| at.naive_utc()),
        _ => None,
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.naive_utc());
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(at);
    }
    ["%Y-%m-%d", "%d.%m.%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
