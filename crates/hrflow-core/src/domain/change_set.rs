//! Field-level change sets
//!
//! A [`ChangeSet`] holds the `(old, new)` value pairs detected for one update
//! of one entity. Pairs whose values are equal are never stored.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::newtypes::StatusId;

/// Dynamically typed value of an entity field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Renders the value the way a `%s` conversion does: null and `false` render
/// empty, `true` renders `1`.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null | FieldValue::Bool(false) => Ok(()),
            FieldValue::Bool(true) => f.write_str("1"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&StatusId> for FieldValue {
    fn from(value: &StatusId) -> Self {
        FieldValue::Text(value.as_str().to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Before/after values of one changed field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: FieldValue,
    pub new: FieldValue,
}

/// All field changes detected for one update of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeMap<String, FieldChange>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change of `field` from `old` to `new`
    ///
    /// Returns false (and records nothing) when the values are equal.
    pub fn record(
        &mut self,
        field: impl Into<String>,
        old: impl Into<FieldValue>,
        new: impl Into<FieldValue>,
    ) -> bool {
        let (old, new) = (old.into(), new.into());
        if old == new {
            return false;
        }
        self.0.insert(field.into(), FieldChange { old, new });
        true
    }

    /// Builder-style variant of [`ChangeSet::record`]
    pub fn with_change(
        mut self,
        field: impl Into<String>,
        old: impl Into<FieldValue>,
        new: impl Into<FieldValue>,
    ) -> Self {
        self.record(field, old, new);
        self
    }

    /// Returns the change recorded for `field`
    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    /// Returns true if `field` changed
    pub fn has_changed_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterates over changes in field-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.0.iter().map(|(field, change)| (field.as_str(), change))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display_matches_printf() {
        assert_eq!(FieldValue::Int(0).to_string(), "0");
        assert_eq!(FieldValue::Int(-3).to_string(), "-3");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Bool(true).to_string(), "1");
        assert_eq!(FieldValue::Bool(false).to_string(), "");
        assert_eq!(FieldValue::from("OWNER_EDIT").to_string(), "OWNER_EDIT");
    }

    #[test]
    fn test_field_value_untagged_serde() {
        let v: FieldValue = serde_json::from_str("3").unwrap();
        assert_eq!(v, FieldValue::Int(3));
        let v: FieldValue = serde_json::from_str("\"full-time\"").unwrap();
        assert_eq!(v, FieldValue::from("full-time"));
        let v: FieldValue = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_option_into_field_value() {
        assert_eq!(FieldValue::from(None::<i64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(5_i64)), FieldValue::Int(5));
    }

    #[test]
    fn test_record_ignores_unchanged_values() {
        let mut changes = ChangeSet::new();
        assert!(!changes.record("status", 3_i64, 3_i64));
        assert!(changes.is_empty());

        assert!(changes.record("status", 0_i64, 3_i64));
        assert!(changes.has_changed_field("status"));
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_int_and_text_are_distinct() {
        let changes = ChangeSet::new().with_change("status", 3_i64, "3");
        assert!(changes.has_changed_field("status"));
    }

    #[test]
    fn test_iter_in_field_order() {
        let changes = ChangeSet::new()
            .with_change("work_schedule_profile", "A", "B")
            .with_change("status", "X", "Y");
        let fields: Vec<&str> = changes.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["status", "work_schedule_profile"]);
    }
}
