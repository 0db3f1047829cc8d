use std::collections::BTreeMap;

use super::rule::RuleRecord;
use super::rule_type::{Dimension, RuleType};
use super::value::Value;

/// Rule type assumed when a stored rule names none.
pub const DEFAULT_RULE_TYPE: &str = "cart:subtotal";
/// Operator assumed when a stored rule names none.
pub const DEFAULT_OPERATOR: &str = "greater_than";

/// Canonical parameter defaults merged into every rule before evaluation.
#[derive(Debug, Clone, Default)]
pub struct RuleTemplate {
    defaults: BTreeMap<String, Value>,
}

impl RuleTemplate {
    /// Defaults for the built-in rule types, with one empty term list per
    /// taxonomy.
    #[must_use]
    pub fn builtin<S: AsRef<str>>(taxonomies: &[S]) -> Self {
        let empty_list = || Value::List(Vec::new());
        let empty_text = || Value::Text(String::new());

        let mut defaults = BTreeMap::new();
        for key in [
            "value",
            "value_two",
            "date_operator",
            "time_one",
            "time_two",
            "date_one",
            "date_two",
            "billing_cities",
            "shipping_cities",
        ] {
            defaults.insert(key.to_owned(), empty_text());
        }
        for key in [
            "coupons",
            "weekly_days",
            "users",
            "billing_countries",
            "shipping_countries",
        ] {
            defaults.insert(key.to_owned(), empty_list());
        }
        defaults.insert("cart_value_type".to_owned(), Value::from("in_cart"));
        defaults.insert("logged_in".to_owned(), Value::from("no"));
        defaults.insert(Dimension::Products.param_key(), empty_list());
        for taxonomy in taxonomies {
            defaults.insert(Dimension::for_taxonomy(taxonomy.as_ref()).param_key(), empty_list());
        }

        Self { defaults }
    }

    /// Add or replace a default.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.defaults.insert(key.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// Fill in every missing parameter of `rule` and, for types that keep
    /// their operator under another field, lift it into `rule.operator`.
    ///
    /// Stored parameters always win over defaults. Applying this twice is the
    /// same as applying it once.
    #[must_use]
    pub fn normalize(&self, mut rule: RuleRecord, ty: Option<&RuleType>) -> RuleRecord {
        for (key, value) in &self.defaults {
            if !rule.params.contains_key(key) && !rule.extra.contains_key(key) {
                rule.params.insert(key.clone(), value.clone());
            }
        }

        if let Some(ty) = ty.filter(|ty| ty.operator_field != "operator") {
            let stored = rule.text(&ty.operator_field).trim().to_owned();
            if !stored.is_empty() {
                rule.operator = stored;
            }
        }

        rule
    }
}
