//! Exact-match filters for scans.

use serde_json::Value;

use crate::record::Record;

/// A single field condition.
///
/// A field missing from a record compares as `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value.
    Eq(String, Value),
    /// Field differs from the value.
    Ne(String, Value),
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::Eq(field, value) => record.get(field).unwrap_or(&Value::Null) == value,
            Condition::Ne(field, value) => record.get(field).unwrap_or(&Value::Null) != value,
        }
    }
}

/// Conjunction of field conditions. The empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value` (builder pattern).
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.into(), value.into()));
        self
    }

    /// Require `field != value` (builder pattern).
    pub fn ne(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Ne(field.into(), value.into()));
        self
    }

    /// The conditions in declaration order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check a record against every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }
}
