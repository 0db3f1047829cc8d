use super::{list_membership, Evaluator};
use crate::{ContextSnapshot, RuleRecord};

/// A scalar cart aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMetric {
    Subtotal,
    ItemCount,
    TotalWeight,
}

impl CartMetric {
    #[allow(clippy::cast_precision_loss)]
    fn read(self, ctx: &ContextSnapshot) -> f64 {
        match self {
            CartMetric::Subtotal => ctx.subtotal(),
            CartMetric::ItemCount => ctx.item_count() as f64,
            CartMetric::TotalWeight => ctx.total_weight(),
        }
    }
}

/// Compares one cart metric against `value`, or the closed range
/// `[value, value_two]`.
#[derive(Debug, Clone, Copy)]
pub struct CartTotal(pub CartMetric);

impl Evaluator for CartTotal {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let Some(op) = rule.parsed_operator() else {
            return false;
        };
        op.compare(
            self.0.read(ctx),
            rule.number("value"),
            rule.number("value_two"),
        )
        .unwrap_or(false)
    }
}

/// Membership of applied coupons in the configured `coupons` list.
///
/// Configured entries are coupon ids, mapped to codes through the snapshot;
/// an id the snapshot does not know is compared as a code. A cart without
/// coupons never matches, whatever the operator.
#[derive(Debug, Clone, Copy)]
pub struct Coupons;

impl Evaluator for Coupons {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let applied = ctx.coupons();
        if applied.is_empty() {
            return false;
        }
        let codes = rule
            .list("coupons")
            .iter()
            .map(|id| ctx.coupon_code(id).unwrap_or(id.as_str()));
        list_membership(rule.parsed_operator(), codes, |code| applied.contains(code))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::CartLine;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn cart(subtotal: f64) -> ContextSnapshot {
        ContextSnapshot::builder(noon())
            .line(CartLine::new(1, 3).subtotal(subtotal).weight(0.5))
            .build()
    }

    fn subtotal_rule(op: &str, value: &str, value_two: &str) -> RuleRecord {
        RuleRecord::new("cart:subtotal", op)
            .param("value", value)
            .param("value_two", value_two)
    }

    #[test]
    fn numeric_comparisons() {
        let eval = CartTotal(CartMetric::Subtotal);
        let ctx = cart(120.0);
        assert!(eval.evaluate(&subtotal_rule("greater_than", "100", ""), &ctx));
        assert!(!eval.evaluate(&subtotal_rule("less_than", "100", ""), &ctx));
        assert!(eval.evaluate(&subtotal_rule("equal_to", "120.00", ""), &ctx));
        assert!(eval.evaluate(&subtotal_rule("greater_than_or_equal", "120", ""), &ctx));
        assert!(!eval.evaluate(&subtotal_rule("less_than_or_equal", "119.99", ""), &ctx));
    }

    #[test]
    fn between_is_inclusive() {
        let eval = CartTotal(CartMetric::Subtotal);
        let rule = subtotal_rule("between", "50", "100");
        assert!(eval.evaluate(&rule, &cart(50.0)));
        assert!(eval.evaluate(&rule, &cart(100.0)));
        assert!(!eval.evaluate(&rule, &cart(100.01)));

        let outside = subtotal_rule("not_between", "50", "100");
        assert!(!eval.evaluate(&outside, &cart(50.0)));
        assert!(eval.evaluate(&outside, &cart(49.0)));
    }

    #[test]
    fn garbage_threshold_reads_as_zero() {
        let eval = CartTotal(CartMetric::Subtotal);
        assert!(eval.evaluate(&subtotal_rule("greater_than", "abc", ""), &cart(0.01)));
        assert!(!eval.evaluate(&subtotal_rule("greater_than", "abc", ""), &cart(0.0)));
    }

    #[test]
    fn item_count_and_weight() {
        let ctx = cart(10.0);
        let qty = RuleRecord::new("cart:total_quantity", "equal_to").param("value", 3_i64);
        assert!(CartTotal(CartMetric::ItemCount).evaluate(&qty, &ctx));
        let weight = RuleRecord::new("cart:total_weight", "greater_than").param("value", 1.4);
        assert!(CartTotal(CartMetric::TotalWeight).evaluate(&weight, &ctx));
    }

    #[test]
    fn list_operator_on_metric_is_no_match() {
        let rule = subtotal_rule("any_in_list", "1", "");
        assert!(!CartTotal(CartMetric::Subtotal).evaluate(&rule, &cart(5.0)));
    }

    #[test]
    fn coupons_map_ids_to_codes() {
        let ctx = ContextSnapshot::builder(noon())
            .coupon("summer")
            .coupon_code(3, "summer")
            .coupon_code(4, "winter")
            .build();
        let any = RuleRecord::new("cart:coupons", "any_in_list").param("coupons", vec![3]);
        assert!(Coupons.evaluate(&any, &ctx));
        let not = RuleRecord::new("cart:coupons", "not_in_list").param("coupons", vec![4]);
        assert!(Coupons.evaluate(&not, &ctx));
        let not_hit = RuleRecord::new("cart:coupons", "not_in_list").param("coupons", vec![3, 4]);
        assert!(!Coupons.evaluate(&not_hit, &ctx));
    }

    #[test]
    fn unmapped_coupon_id_compared_as_code() {
        let ctx = ContextSnapshot::builder(noon()).coupon("vip").build();
        let rule = RuleRecord::new("cart:coupons", "any_in_list").param("coupons", vec!["vip"]);
        assert!(Coupons.evaluate(&rule, &ctx));
    }

    #[test]
    fn no_applied_coupons_never_matches() {
        let ctx = ContextSnapshot::builder(noon()).build();
        for op in ["any_in_list", "not_in_list"] {
            let rule = RuleRecord::new("cart:coupons", op).param("coupons", vec![3]);
            assert!(!Coupons.evaluate(&rule, &ctx), "{op}");
        }
    }
}
