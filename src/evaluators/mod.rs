//! Predicate evaluators, one family per file, and the table that dispatches
//! a rule to its evaluator by rule-type id.
//!
//! Evaluators are pure: they read a normalized [`RuleRecord`] and the
//! [`ContextSnapshot`] and answer whether the rule matches. Bad input is a
//! non-match, never an error.

mod cart;
mod customer;
mod date;
mod products;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub use cart::{CartMetric, CartTotal, Coupons};
pub use customer::{AddressKind, City, Country, LoggedIn, Users};
pub use date::{Instant, WeeklyDays};
pub use products::CartItems;

use crate::{ContextSnapshot, Operator, RegistryError, RuleRecord, RuleTypeRegistry};

/// Decides whether one rule matches a snapshot.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool;
}

impl<F> Evaluator for F
where
    F: Fn(&RuleRecord, &ContextSnapshot) -> bool + Send + Sync,
{
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        self(rule, ctx)
    }
}

/// Dispatch table from rule-type id to evaluator.
#[derive(Default)]
pub struct EvaluatorRegistry {
    table: HashMap<String, Box<dyn Evaluator>>,
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.table.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("EvaluatorRegistry").field("types", &ids).finish()
    }
}

impl EvaluatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluators for the built-in rule types. Every type in `types` that
    /// carries a [`Dimension`](crate::Dimension) gets a [`CartItems`]
    /// evaluator for it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRuleType`] if `types` lacks one of the
    /// built-in ids.
    pub fn with_builtin_evaluators(types: &RuleTypeRegistry) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let mut add = |id: &str, evaluator: Box<dyn Evaluator>| {
            if types.lookup(id).is_none() {
                return Err(RegistryError::UnknownRuleType { id: id.to_owned() });
            }
            registry.insert(id, evaluator)
        };

        add("cart:subtotal", Box::new(CartTotal(CartMetric::Subtotal)))?;
        add("cart:total_quantity", Box::new(CartTotal(CartMetric::ItemCount)))?;
        add("cart:total_weight", Box::new(CartTotal(CartMetric::TotalWeight)))?;
        add("cart:coupons", Box::new(Coupons))?;
        add("date:time", Box::new(Instant::time()))?;
        add("date:date", Box::new(Instant::date()))?;
        add("date:weekly_days", Box::new(WeeklyDays))?;
        add("user:users", Box::new(Users))?;
        add("user:logged_in", Box::new(LoggedIn))?;
        add("billing:city", Box::new(City(AddressKind::Billing)))?;
        add("shipping:city", Box::new(City(AddressKind::Shipping)))?;
        add("billing:country", Box::new(Country(AddressKind::Billing)))?;
        add("shipping:country", Box::new(Country(AddressKind::Shipping)))?;

        for ty in types.iter() {
            if let Some(dimension) = &ty.dimension {
                add(&ty.id, Box::new(CartItems::new(dimension.clone())))?;
            }
        }

        Ok(registry)
    }

    /// Add an evaluator for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateEvaluator`] if `id` already has one.
    pub fn register(
        &mut self,
        id: &str,
        evaluator: impl Evaluator + 'static,
    ) -> Result<(), RegistryError> {
        self.insert(id, Box::new(evaluator))
    }

    pub(crate) fn insert(
        &mut self,
        id: &str,
        evaluator: Box<dyn Evaluator>,
    ) -> Result<(), RegistryError> {
        if self.table.contains_key(id) {
            return Err(RegistryError::DuplicateEvaluator { id: id.to_owned() });
        }
        self.table.insert(id.to_owned(), evaluator);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn Evaluator> {
        self.table.get(id).map(Box::as_ref)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.table.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Shared list-operator logic. `configured` is deduplicated; `present`
/// answers whether one configured entry occurs in the context.
pub(crate) fn list_membership<'a>(
    op: Option<Operator>,
    configured: impl IntoIterator<Item = &'a str>,
    present: impl Fn(&str) -> bool,
) -> bool {
    let configured: BTreeSet<&str> = configured.into_iter().collect();
    let hits = configured.iter().filter(|item| present(item)).count();
    match op {
        Some(Operator::AnyInList) => hits > 0,
        Some(Operator::AllInList) => hits == configured.len(),
        Some(Operator::NotInList) => hits == 0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_TAXONOMIES;

    fn builtin() -> EvaluatorRegistry {
        let types = RuleTypeRegistry::with_builtin_types(DEFAULT_TAXONOMIES).unwrap();
        EvaluatorRegistry::with_builtin_evaluators(&types).unwrap()
    }

    #[test]
    fn builtin_covers_implemented_types() {
        let reg = builtin();
        for id in [
            "cart:subtotal",
            "cart:coupons",
            "cart_products:products",
            "cart_products:product_cat",
            "cart_products:product_shipping_class",
            "date:time",
            "date:weekly_days",
            "user:logged_in",
            "shipping:country",
        ] {
            assert!(reg.contains(id), "missing evaluator for {id}");
        }
        assert!(!reg.contains("billing:zipcode"));
        assert!(!reg.contains("user:roles"));
    }

    #[test]
    fn builtin_requires_types() {
        let err = EvaluatorRegistry::with_builtin_evaluators(&RuleTypeRegistry::new()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownRuleType {
                id: "cart:subtotal".into()
            }
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut reg = EvaluatorRegistry::new();
        reg.register("x:y", |_: &RuleRecord, _: &ContextSnapshot| true)
            .unwrap();
        let err = reg
            .register("x:y", |_: &RuleRecord, _: &ContextSnapshot| false)
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateEvaluator { id: "x:y".into() });
    }

    #[test]
    fn list_membership_operators() {
        let ctx = ["a", "b"];
        let present = |item: &str| ctx.contains(&item);
        assert!(list_membership(Some(Operator::AnyInList), ["b", "z"], present));
        assert!(!list_membership(Some(Operator::AllInList), ["b", "z"], present));
        assert!(list_membership(Some(Operator::AllInList), ["a", "b", "a"], present));
        assert!(list_membership(Some(Operator::NotInList), ["z"], present));
        assert!(!list_membership(Some(Operator::Between), ["a"], present));
        assert!(!list_membership(None, ["a"], present));
    }

    #[test]
    fn list_membership_empty_configured() {
        let present = |_: &str| true;
        assert!(!list_membership(Some(Operator::AnyInList), [], present));
        assert!(list_membership(Some(Operator::AllInList), [], present));
        assert!(list_membership(Some(Operator::NotInList), [], present));
    }
}
