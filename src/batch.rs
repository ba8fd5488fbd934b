//! Code values and the deduplicated batch that accumulates them.
//!
//! A [`Batch`] is an ordered set: every value appears at most once and values
//! keep the order in which they were first seen until the whole batch is
//! cleared. There is no way to remove a single value.
//!
//! # Example
//!
//! ```
//! use qrbatch::batch::{Batch, CodeValue};
//!
//! let mut batch = Batch::new();
//! batch.add_if_absent(["A", "B", "A"].into_iter().filter_map(CodeValue::new));
//! batch.add_if_absent(["C", "B"].into_iter().filter_map(CodeValue::new));
//!
//! assert_eq!(batch.joined(), "A,B,C");
//! ```

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of entries shown in the "recent scans" list.
pub const RECENT_LIMIT: usize = 5;

/// The decoded payload of one optical code.
///
/// Always non-empty. Equality is exact string equality, no normalization is
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodeValue(String);

impl CodeValue {
    /// Wrap a decoded string, rejecting empty payloads.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Borrow the payload.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned payload.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Error returned when converting an empty string into a [`CodeValue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("code value cannot be empty")]
pub struct EmptyCodeValue;

impl TryFrom<String> for CodeValue {
    type Error = EmptyCodeValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(EmptyCodeValue)
    }
}

impl From<CodeValue> for String {
    fn from(value: CodeValue) -> Self {
        value.0
    }
}

impl AsRef<str> for CodeValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CodeValue {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of pending code values.
///
/// Backed by a sequence (for order) and a membership index (for O(1)
/// lookups). The two are only ever mutated together.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Values in first-seen order
    order: Vec<CodeValue>,
    /// Membership index over `order`
    index: HashSet<CodeValue>,
}

impl Batch {
    /// Create an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every value that is not already present.
    ///
    /// Duplicates inside `values` are collapsed to their first occurrence and
    /// the order of existing entries is never changed. Returns the values that
    /// were actually appended, in the order they were appended.
    pub fn add_if_absent<I>(&mut self, values: I) -> Vec<CodeValue>
    where
        I: IntoIterator<Item = CodeValue>,
    {
        let mut added = Vec::new();
        for value in values {
            if self.index.insert(value.clone()) {
                self.order.push(value.clone());
                added.push(value);
            }
        }
        added
    }

    /// Check whether a value is already in the batch.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.index.contains(value)
    }

    /// Number of values in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over the values in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &CodeValue> {
        self.order.iter()
    }

    /// The values in first-seen order.
    #[must_use]
    pub fn values(&self) -> &[CodeValue] {
        &self.order
    }

    /// The most recently added value.
    #[must_use]
    pub fn last(&self) -> Option<&CodeValue> {
        self.order.last()
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    /// Comma-joined, order-preserving serialization of the batch.
    #[must_use]
    pub fn joined(&self) -> String {
        join_values(&self.order)
    }

    /// The last `limit` values, most recent first.
    ///
    /// Each entry carries its 1-based position in the batch.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<(usize, CodeValue)> {
        self.order
            .iter()
            .enumerate()
            .rev()
            .take(limit)
            .map(|(i, v)| (i + 1, v.clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a CodeValue;
    type IntoIter = std::slice::Iter<'a, CodeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

/// Join values with commas, keeping their order.
#[must_use]
pub fn join_values(values: &[CodeValue]) -> String {
    values
        .iter()
        .map(CodeValue::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(raw: &[&str]) -> Vec<CodeValue> {
        raw.iter().filter_map(|s| CodeValue::new(*s)).collect()
    }

    #[test]
    fn test_code_value_rejects_empty() {
        assert!(CodeValue::new("").is_none());
        assert_eq!(CodeValue::new("x").unwrap().as_str(), "x");
        assert_eq!(CodeValue::try_from(String::new()), Err(EmptyCodeValue));
    }

    #[test]
    fn test_code_value_exact_equality() {
        // No trimming or case folding
        assert_ne!(CodeValue::new("abc"), CodeValue::new("ABC"));
        assert_ne!(CodeValue::new("abc"), CodeValue::new("abc "));
    }

    #[test]
    fn test_add_if_absent_preserves_first_seen_order() {
        let mut batch = Batch::new();
        let added = batch.add_if_absent(values(&["B", "A", "B", "C"]));

        assert_eq!(added, values(&["B", "A", "C"]));
        assert_eq!(batch.values(), values(&["B", "A", "C"]).as_slice());
    }

    #[test]
    fn test_add_if_absent_skips_existing() {
        let mut batch = Batch::new();
        batch.add_if_absent(values(&["A", "B"]));
        let added = batch.add_if_absent(values(&["C", "A", "D"]));

        assert_eq!(added, values(&["C", "D"]));
        assert_eq!(batch.joined(), "A,B,C,D");
    }

    #[test]
    fn test_add_if_absent_is_idempotent() {
        let mut batch = Batch::new();
        let input = values(&["X", "Y", "X"]);
        batch.add_if_absent(input.clone());
        let snapshot = batch.values().to_vec();

        let added = batch.add_if_absent(input);
        assert!(added.is_empty());
        assert_eq!(batch.values(), snapshot.as_slice());
    }

    #[test]
    fn test_clear() {
        let mut batch = Batch::new();
        batch.add_if_absent(values(&["A", "B"]));
        batch.clear();

        assert!(batch.is_empty());
        assert!(!batch.contains("A"));

        // Cleared values can be scanned again
        batch.add_if_absent(values(&["B", "A"]));
        assert_eq!(batch.joined(), "B,A");
    }

    #[test]
    fn test_recent_most_recent_first() {
        let mut batch = Batch::new();
        batch.add_if_absent(values(&["1", "2", "3", "4", "5", "6", "7"]));

        let recent = batch.recent(RECENT_LIMIT);
        let positions: Vec<usize> = recent.iter().map(|(i, _)| *i).collect();
        assert_eq!(positions, vec![7, 6, 5, 4, 3]);
        assert_eq!(recent[0].1.as_str(), "7");
    }

    #[test]
    fn test_recent_short_batch() {
        let mut batch = Batch::new();
        batch.add_if_absent(values(&["only"]));
        assert_eq!(batch.recent(RECENT_LIMIT).len(), 1);
        assert!(Batch::new().recent(RECENT_LIMIT).is_empty());
    }

    #[test]
    fn test_joined_keeps_commas_in_values() {
        let mut batch = Batch::new();
        batch.add_if_absent(values(&["a,b", "c"]));
        assert_eq!(batch.joined(), "a,b,c");
    }

    #[test]
    fn test_code_value_serde_transparent() {
        let v = CodeValue::new("hello").unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"hello\"");
        let back: CodeValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<CodeValue>("\"\"").is_err());
    }
}
