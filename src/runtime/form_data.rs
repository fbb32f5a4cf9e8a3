//! Snapshot of everything an end user has entered for one application.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::condition::{resolve_field_path, ElementNames, FieldRef};

/// Key under which the railway value travels in the flat wire map.
pub const RAILWAY_KEY: &str = "railway";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    values: BTreeMap<FieldRef, Value>,
    // Keys that named no known element when they were entered.
    unbound: BTreeMap<String, Value>,
    railway: Option<Value>,
    checklist: BTreeMap<FieldRef, bool>,
    signed_forms: BTreeMap<FieldRef, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FieldRef, value: Value) -> Option<Value> {
        self.values.insert(field, value)
    }

    /// Insert under a `<elementName>.<fieldName>` key, binding it to the element
    /// when the name resolves.
    pub fn insert_named(
        &mut self,
        path: &str,
        value: Value,
        names: &impl ElementNames,
    ) -> Option<Value> {
        if path == RAILWAY_KEY {
            return self.railway.replace(value);
        }
        match resolve_field_path(path, names) {
            Some(field) => self.values.insert(field, value),
            None => self.unbound.insert(path.to_owned(), value),
        }
    }

    pub fn remove(&mut self, field: &FieldRef) -> Option<Value> {
        self.values.remove(field)
    }

    pub fn value(&self, field: &FieldRef) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn unbound(&self, path: &str) -> Option<&Value> {
        self.unbound.get(path)
    }

    pub fn set_railway(&mut self, value: Value) {
        self.railway = Some(value);
    }

    pub fn railway(&self) -> Option<&Value> {
        self.railway.as_ref()
    }

    pub fn set_checked(&mut self, item: FieldRef, checked: bool) {
        self.checklist.insert(item, checked);
    }

    /// `None` until the item has been touched.
    pub fn checked(&self, item: &FieldRef) -> Option<bool> {
        self.checklist.get(item).copied()
    }

    pub fn sign(&mut self, form: FieldRef, artifact: impl Into<String>) {
        self.signed_forms.insert(form, artifact.into());
    }

    pub fn signed_artifact(&self, form: &FieldRef) -> Option<&str> {
        self.signed_forms.get(form).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.unbound.is_empty()
            && self.railway.is_none()
            && self.checklist.is_empty()
            && self.signed_forms.is_empty()
    }

    /// Flat map keyed by `<elementName>.<fieldName>` plus `railway`, the shape the
    /// collaborator stores. Checklist marks and signatures are persisted separately.
    pub fn to_flat_map(&self, names: &impl ElementNames) -> Map<String, Value> {
        let mut map = Map::new();
        for (path, value) in &self.unbound {
            map.insert(path.clone(), value.clone());
        }
        for (field, value) in &self.values {
            let key = match names.element_name(field.element) {
                Some(name) => format!("{name}.{}", field.field),
                None => format!("{}.{}", field.element, field.field),
            };
            map.insert(key, value.clone());
        }
        if let Some(railway) = &self.railway {
            map.insert(RAILWAY_KEY.to_owned(), railway.clone());
        }
        map
    }

    pub fn from_flat_map(map: Map<String, Value>, names: &impl ElementNames) -> Self {
        let mut data = Self::new();
        for (path, value) in map {
            data.insert_named(&path, value, names);
        }
        data
    }
}

/// Null, empty or whitespace-only strings, and empty arrays count as blank.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
