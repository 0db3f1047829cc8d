use std::time::Instant;

use crate::evaluators::EvaluatorRegistry;
use crate::{
    ContextSnapshot, EvaluationReport, MatchMode, RuleOutcome, RuleRecord, RuleSet,
    RuleTypeRegistry, Verdict,
};

/// Run one rule. Unknown types, types without an evaluator and illegal
/// operators are non-matches for this rule only.
pub(crate) fn evaluate_rule(
    types: &RuleTypeRegistry,
    evaluators: &EvaluatorRegistry,
    rule: &RuleRecord,
    ctx: &ContextSnapshot,
) -> RuleOutcome {
    let Some(ty) = types.lookup(&rule.rule_type) else {
        tracing::debug!(rule_type = %rule.rule_type, "unknown rule type");
        return RuleOutcome::UnknownType;
    };
    let Some(evaluator) = evaluators.get(&ty.id) else {
        tracing::debug!(rule_type = %ty.id, "no evaluator registered");
        return RuleOutcome::NoEvaluator;
    };
    if !ty.accepts(rule.parsed_operator()) {
        tracing::debug!(rule_type = %ty.id, operator = %rule.operator, "illegal operator");
        return RuleOutcome::IllegalOperator;
    }
    if evaluator.evaluate(rule, ctx) {
        RuleOutcome::Matched
    } else {
        RuleOutcome::NotMatched
    }
}

/// Reduce per-rule results to a verdict. An empty set never matches, and
/// neither does a set whose mode is unknown (`None`).
pub(crate) fn aggregate(mode: Option<MatchMode>, matched: usize, total: usize) -> Verdict {
    let hit = match (total, mode) {
        (0, _) | (_, None) => false,
        (_, Some(MatchMode::All)) => matched == total,
        (_, Some(MatchMode::Any)) => matched > 0,
    };
    Verdict::new(hit, mode.unwrap_or_default(), matched, total)
}

pub(crate) fn evaluate(
    types: &RuleTypeRegistry,
    evaluators: &EvaluatorRegistry,
    set: &RuleSet,
    ctx: &ContextSnapshot,
) -> Verdict {
    let matched = set
        .rules
        .iter()
        .filter(|rule| evaluate_rule(types, evaluators, rule, ctx).is_match())
        .count();
    let verdict = aggregate(set.effective_mode(), matched, set.rules.len());
    tracing::debug!(%verdict, "rule set evaluated");
    verdict
}

pub(crate) fn evaluate_detailed(
    types: &RuleTypeRegistry,
    evaluators: &EvaluatorRegistry,
    set: &RuleSet,
    ctx: &ContextSnapshot,
) -> EvaluationReport {
    let start = Instant::now();
    let outcomes: Vec<(String, RuleOutcome)> = set
        .rules
        .iter()
        .map(|rule| {
            (
                rule.rule_type.clone(),
                evaluate_rule(types, evaluators, rule, ctx),
            )
        })
        .collect();
    let matched = outcomes.iter().filter(|(_, o)| o.is_match()).count();
    let verdict = aggregate(set.effective_mode(), matched, outcomes.len());
    EvaluationReport::new(verdict, outcomes, start.elapsed())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{RuleSetBuilder, DEFAULT_TAXONOMIES};

    fn registries() -> (RuleTypeRegistry, EvaluatorRegistry) {
        let types = RuleTypeRegistry::with_builtin_types(DEFAULT_TAXONOMIES).unwrap();
        let evaluators = EvaluatorRegistry::with_builtin_evaluators(&types).unwrap();
        (types, evaluators)
    }

    fn ctx(subtotal: f64) -> ContextSnapshot {
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        ContextSnapshot::builder(now).subtotal(subtotal).build()
    }

    #[test]
    fn aggregate_laws() {
        let (all, any) = (Some(MatchMode::All), Some(MatchMode::Any));
        assert!(!aggregate(all, 0, 0).matched());
        assert!(!aggregate(any, 0, 0).matched());
        assert!(aggregate(all, 3, 3).matched());
        assert!(!aggregate(all, 2, 3).matched());
        assert!(aggregate(any, 1, 3).matched());
        assert!(!aggregate(any, 0, 3).matched());
        assert!(!aggregate(None, 3, 3).matched());
    }

    #[test]
    fn all_requires_every_rule() {
        let (types, evaluators) = registries();
        let set = RuleSetBuilder::new()
            .rule("cart:subtotal", "greater_than", |r| r.param("value", 100_i64))
            .rule("cart:subtotal", "less_than", |r| r.param("value", 200_i64))
            .build();
        assert!(evaluate(&types, &evaluators, &set, &ctx(150.0)).matched());
        assert!(!evaluate(&types, &evaluators, &set, &ctx(250.0)).matched());
    }

    #[test]
    fn any_requires_one_rule() {
        let (types, evaluators) = registries();
        let set = RuleSetBuilder::new()
            .rule("cart:subtotal", "greater_than", |r| r.param("value", 100_i64))
            .rule("cart:subtotal", "less_than", |r| r.param("value", 10_i64))
            .match_any()
            .build();
        let verdict = evaluate(&types, &evaluators, &set, &ctx(150.0));
        assert!(verdict.matched());
        assert_eq!(verdict.matched_rules(), 1);
        assert_eq!(verdict.mode(), MatchMode::Any);
    }

    #[test]
    fn rule_outcomes() {
        let (types, evaluators) = registries();
        let c = ctx(10.0);
        let unknown = RuleRecord::new("loyalty:tier", "any_in_list");
        assert_eq!(
            evaluate_rule(&types, &evaluators, &unknown, &c),
            RuleOutcome::UnknownType
        );
        let pro = RuleRecord::new("billing:zipcode", "any_in_list");
        assert_eq!(
            evaluate_rule(&types, &evaluators, &pro, &c),
            RuleOutcome::NoEvaluator
        );
        let illegal = RuleRecord::new("cart:subtotal", "all_in_list");
        assert_eq!(
            evaluate_rule(&types, &evaluators, &illegal, &c),
            RuleOutcome::IllegalOperator
        );
    }

    #[test]
    fn unknown_type_only_fails_its_rule() {
        let (types, evaluators) = registries();
        let set = RuleSetBuilder::new()
            .rule("loyalty:tier", "any_in_list", |r| r)
            .rule("cart:subtotal", "greater_than", |r| r.param("value", 1_i64))
            .match_any()
            .build();
        assert!(evaluate(&types, &evaluators, &set, &ctx(5.0)).matched());
    }

    #[test]
    fn detailed_matches_plain() {
        let (types, evaluators) = registries();
        let set = RuleSetBuilder::new()
            .rule("cart:subtotal", "greater_than", |r| r.param("value", 1_i64))
            .rule("user:roles", "any_in_list", |r| r)
            .match_any()
            .build();
        let c = ctx(5.0);
        let report = evaluate_detailed(&types, &evaluators, &set, &c);
        assert_eq!(report.verdict(), evaluate(&types, &evaluators, &set, &c));
        assert_eq!(report.matched(), ["cart:subtotal"]);
        assert_eq!(report.outcomes()[1].1, RuleOutcome::NoEvaluator);
    }
}
