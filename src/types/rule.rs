use std::collections::BTreeMap;

use serde_json::{Map, Value as Json};

use super::operator::Operator;
use super::value::Value;

/// One authored condition: a rule type, an operator and its parameters.
///
/// Records handed to evaluators have been merged against the
/// [`RuleTemplate`](super::template::RuleTemplate), so every parameter a
/// built-in rule type reads is present.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRecord {
    pub rule_type: String,
    pub operator: String,
    pub params: BTreeMap<String, Value>,
    /// Stored fields with no [`Value`] representation, kept for round-trips.
    pub extra: Map<String, Json>,
}

impl RuleRecord {
    #[must_use]
    pub fn new(rule_type: &str, operator: &str) -> Self {
        Self {
            rule_type: rule_type.to_owned(),
            operator: operator.to_owned(),
            params: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// Set a parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_owned(), value.into());
        self
    }

    /// Parsed operator, or `None` if the stored identifier is unknown.
    #[must_use]
    pub fn parsed_operator(&self) -> Option<Operator> {
        self.operator.parse().ok()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Numeric parameter; missing or non-numeric reads as `0.0`.
    #[must_use]
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, Value::as_number)
    }

    /// List parameter; missing or scalar reads as empty.
    #[must_use]
    pub fn list(&self, key: &str) -> &[String] {
        self.get(key).map(Value::as_list).unwrap_or_default()
    }

    /// Text parameter; missing or non-text reads as `""`.
    #[must_use]
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(Value::as_text).unwrap_or_default()
    }
}
