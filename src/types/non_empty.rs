use serde::{Deserialize, Serialize};

/// A vector that guarantees at least one element exists.
///
/// Used where an empty list would be a contradiction, e.g. the violations
/// carried by a failed publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonEmptyVec<T> {
    head: T,
    tail: Vec<T>,
}

impl<T> NonEmptyVec<T> {
    /// Create a new NonEmptyVec with a single element
    pub fn new(head: T) -> Self {
        Self {
            head,
            tail: Vec::new(),
        }
    }

    /// Build from a plain vector; `None` when it is empty
    pub fn from_vec(mut items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        let tail = items.split_off(1);
        let head = items.pop()?;
        Some(Self { head, tail })
    }

    /// Get the first element (guaranteed to exist)
    pub fn first(&self) -> &T {
        &self.head
    }

    pub fn push(&mut self, value: T) {
        self.tail.push(value);
    }

    /// Get the length (always >= 1)
    pub fn len(&self) -> usize {
        1 + self.tail.len()
    }

    /// Always false.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut items = Vec::with_capacity(1 + self.tail.len());
        items.push(self.head);
        items.extend(self.tail);
        items
    }
}

impl<T> From<T> for NonEmptyVec<T> {
    fn from(head: T) -> Self {
        Self::new(head)
    }
}

impl<T> IntoIterator for NonEmptyVec<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}
