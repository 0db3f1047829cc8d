use super::{list_membership, Evaluator};
use crate::{ContextSnapshot, Dimension, RuleRecord};

/// Set membership over one cart dimension: product ids, the term ids of a
/// taxonomy, or shipping classes. One instance per dimension; the configured
/// list is read from [`Dimension::param_key`].
#[derive(Debug, Clone)]
pub struct CartItems {
    dimension: Dimension,
    key: String,
}

impl CartItems {
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        let key = dimension.param_key();
        Self { dimension, key }
    }

    #[must_use]
    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }
}

impl Evaluator for CartItems {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let present = ctx.dimension(&self.dimension);
        list_membership(
            rule.parsed_operator(),
            rule.list(&self.key).iter().map(String::as_str),
            |id| present.contains(id),
        )
    }
}
