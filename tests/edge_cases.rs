use chrono::{NaiveDate, NaiveDateTime};
use rategate::{
    Address, CartLine, ContextSnapshot, Customer, Engine, MatchMode, Operator, RegistryError,
    RuleOutcome, RuleRecord, RuleSet, RuleSetBuilder, RuleType, Verdict,
};

fn engine() -> Engine {
    Engine::with_defaults().unwrap()
}

fn noon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn empty_cart() -> ContextSnapshot {
    ContextSnapshot::builder(noon()).build()
}

fn single(engine: &Engine, rule: RuleRecord) -> RuleSet {
    engine.normalize_set(RuleSetBuilder::new().record(rule).build())
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn empty_set_under_both_modes() {
    let engine = engine();
    for mode in [MatchMode::All, MatchMode::Any] {
        let set = RuleSetBuilder::new().match_mode(mode).build();
        // Fewer than two rules always aggregate as ALL.
        let verdict = engine.evaluate(&set, &empty_cart());
        assert_eq!(verdict, Verdict::new(false, MatchMode::All, 0, 0));
    }
}

#[test]
fn unknown_type_fails_only_its_own_rule() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon()).subtotal(50.0).build();
    let set = engine
        .load_settings(
            r#"{"match_type":"any","rules":[
                {"type":"loyalty:tier","operator":"any_in_list"},
                {"type":"cart:subtotal","operator":"greater_than","value":"10"}
            ]}"#,
        )
        .unwrap();

    let report = engine.evaluate_detailed(&set, &ctx);
    assert_eq!(report.outcomes()[0].1, RuleOutcome::UnknownType);
    assert_eq!(report.outcomes()[1].1, RuleOutcome::Matched);
    assert!(report.verdict().matched());

    let all = RuleSet {
        match_mode: MatchMode::All,
        ..set
    };
    assert!(!engine.evaluate(&all, &ctx).matched());
}

#[test]
fn catalogued_type_without_evaluator_never_matches() {
    let engine = engine();
    for ty in ["billing:zipcode", "shipping:state", "user:roles", "order_history:first_purchase"] {
        assert!(engine.rule_types().lookup(ty).is_some(), "{ty}");
        let rule = engine.normalize(RuleRecord::new(ty, "any_in_list"));
        assert_eq!(engine.evaluate_rule(&rule, &empty_cart()), RuleOutcome::NoEvaluator);
    }
}

#[test]
fn illegal_operator_is_a_non_match() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon()).subtotal(500.0).build();
    let rule =
        engine.normalize(RuleRecord::new("cart:subtotal", "any_in_list").param("value", "1"));
    assert_eq!(engine.evaluate_rule(&rule, &ctx), RuleOutcome::IllegalOperator);

    let rule = engine.normalize(RuleRecord::new("cart:subtotal", "roughly").param("value", "1"));
    assert_eq!(engine.evaluate_rule(&rule, &ctx), RuleOutcome::IllegalOperator);
}

// ---------------------------------------------------------------------------
// Numeric thresholds
// ---------------------------------------------------------------------------

#[test]
fn missing_threshold_reads_as_zero() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon()).subtotal(0.01).build();
    let set = single(&engine, RuleRecord::new("cart:subtotal", "greater_than"));
    assert!(engine.evaluate(&set, &ctx).matched());
}

#[test]
fn non_numeric_threshold_reads_as_zero() {
    let engine = engine();
    let set = single(
        &engine,
        RuleRecord::new("cart:subtotal", "equal_to").param("value", "lots"),
    );
    assert!(engine.evaluate(&set, &empty_cart()).matched());
}

#[test]
fn not_between_is_the_complement() {
    let engine = engine();
    for (subtotal, inside) in [(4.99, false), (5.0, true), (10.0, true), (10.01, false)] {
        let ctx = ContextSnapshot::builder(noon()).subtotal(subtotal).build();
        for (op, expected) in [("between", inside), ("not_between", !inside)] {
            let set = single(
                &engine,
                RuleRecord::new("cart:subtotal", op)
                    .param("value", "5")
                    .param("value_two", "10"),
            );
            assert_eq!(engine.evaluate(&set, &ctx).matched(), expected, "{op} {subtotal}");
        }
    }
}

// ---------------------------------------------------------------------------
// Set membership
// ---------------------------------------------------------------------------

#[test]
fn all_in_list_with_empty_configuration_is_true() {
    let engine = engine();
    let set = single(&engine, RuleRecord::new("cart_products:products", "all_in_list"));
    assert!(engine.evaluate(&set, &empty_cart()).matched());
}

#[test]
fn duplicate_configured_ids_count_once() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon())
        .line(CartLine::new(1, 1))
        .line(CartLine::new(2, 1))
        .build();
    let set = single(
        &engine,
        RuleRecord::new("cart_products:products", "all_in_list").param("products", vec![1, 1, 2]),
    );
    assert!(engine.evaluate(&set, &ctx).matched());
}

#[test]
fn taxonomy_terms_and_shipping_classes() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon())
        .line(CartLine::new(1, 1).term("product_tag", 40).shipping_class(0))
        .line(CartLine::new(2, 1).shipping_class(21))
        .build();

    let tag = single(
        &engine,
        RuleRecord::new("cart_products:product_tag", "any_in_list")
            .param("cart_products_product_tag", vec![40]),
    );
    assert!(engine.evaluate(&tag, &ctx).matched());

    // Class "0" means no class and is never part of the cart's set.
    let none = single(
        &engine,
        RuleRecord::new("cart_products:product_shipping_class", "any_in_list")
            .param("cart_products_product_shipping_class", vec![0]),
    );
    assert!(!engine.evaluate(&none, &ctx).matched());

    let class = single(
        &engine,
        RuleRecord::new("cart_products:product_shipping_class", "all_in_list")
            .param("cart_products_product_shipping_class", vec![21]),
    );
    assert!(engine.evaluate(&class, &ctx).matched());
}

#[test]
fn custom_taxonomy_gets_a_rule_type() {
    let engine = Engine::builder().taxonomy("pa_color").build().unwrap();
    assert_eq!(
        engine
            .rule_types()
            .lookup("cart_products:pa_color")
            .map(|t| t.group.as_str()),
        Some("cart_products")
    );

    let ctx = ContextSnapshot::builder(noon())
        .line(CartLine::new(1, 1).term("pa_color", "red"))
        .build();
    let set = single(
        &engine,
        RuleRecord::new("cart_products:pa_color", "not_in_list")
            .param("cart_products_pa_color", vec!["blue"]),
    );
    assert!(engine.evaluate(&set, &ctx).matched());
}

// ---------------------------------------------------------------------------
// Customer and address
// ---------------------------------------------------------------------------

#[test]
fn anonymous_customer_is_in_no_user_list() {
    let engine = engine();
    let any = single(
        &engine,
        RuleRecord::new("user:users", "any_in_list").param("users", vec![1]),
    );
    let not = single(
        &engine,
        RuleRecord::new("user:users", "not_in_list").param("users", vec![1]),
    );
    assert!(!engine.evaluate(&any, &empty_cart()).matched());
    assert!(engine.evaluate(&not, &empty_cart()).matched());
}

#[test]
fn city_lists_are_trimmed_and_case_insensitive() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon())
        .customer(Customer {
            shipping: Address::new("Saint Paul", "US"),
            ..Customer::default()
        })
        .build();
    let set = single(
        &engine,
        RuleRecord::new("shipping:city", "any_in_list")
            .param("shipping_cities", " minneapolis ,SAINT PAUL,, "),
    );
    assert!(engine.evaluate(&set, &ctx).matched());
}

#[test]
fn country_codes_are_exact() {
    let engine = engine();
    let ctx = ContextSnapshot::builder(noon())
        .customer(Customer {
            billing: Address::new("Paris", "FR"),
            ..Customer::default()
        })
        .build();
    let lower = single(
        &engine,
        RuleRecord::new("billing:country", "any_in_list").param("billing_countries", vec!["fr"]),
    );
    let exact = single(
        &engine,
        RuleRecord::new("billing:country", "any_in_list").param("billing_countries", vec!["FR"]),
    );
    assert!(!engine.evaluate(&lower, &ctx).matched());
    assert!(engine.evaluate(&exact, &ctx).matched());
}

#[test]
fn logged_in_flag_defaults_to_no() {
    let engine = engine();
    let set = single(&engine, RuleRecord::new("user:logged_in", ""));
    assert!(engine.evaluate(&set, &empty_cart()).matched());

    let member = ContextSnapshot::builder(noon())
        .customer(Customer {
            id: Some("7".into()),
            logged_in: true,
            ..Customer::default()
        })
        .build();
    assert!(!engine.evaluate(&set, &member).matched());
}

#[test]
fn logged_in_flag_must_be_yes_or_no() {
    let engine = engine();
    for flag in ["", "maybe", "true"] {
        let set = single(
            &engine,
            RuleRecord::new("user:logged_in", "").param("logged_in", flag),
        );
        assert!(!engine.evaluate(&set, &empty_cart()).matched(), "{flag:?}");
    }

    let set = single(
        &engine,
        RuleRecord::new("user:logged_in", "").param("logged_in", " NO "),
    );
    assert!(engine.evaluate(&set, &empty_cart()).matched());
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

#[test]
fn before_and_after_are_strict() {
    let engine = engine();
    for op in ["before", "after"] {
        let set = single(
            &engine,
            RuleRecord::new("date:time", "")
                .param("date_operator", op)
                .param("time_one", "12:00"),
        );
        assert!(!engine.evaluate(&set, &empty_cart()).matched(), "{op}");
    }
}

#[test]
fn unparseable_instant_is_a_non_match() {
    let engine = engine();
    for op in ["before", "after", "between", "not_between"] {
        let set = single(
            &engine,
            RuleRecord::new("date:date", "")
                .param("date_operator", op)
                .param("date_one", "tomorrow")
                .param("date_two", "2030-01-01"),
        );
        assert!(!engine.evaluate(&set, &empty_cart()).matched(), "{op}");
    }
}

#[test]
fn date_window_spans_days() {
    let engine = engine();
    let set = single(
        &engine,
        RuleRecord::new("date:date", "")
            .param("date_operator", "between")
            .param("date_one", "2024-06-01")
            .param("date_two", "2024-06-30 23:59"),
    );
    assert!(engine.evaluate(&set, &empty_cart()).matched());
}

#[test]
fn weekly_days_use_the_snapshot_day() {
    let engine = engine();
    let weekend = single(
        &engine,
        RuleRecord::new("date:weekly_days", "")
            .param("date_operator", "any_in_list")
            .param("weekly_days", vec!["saturday", "sunday"]),
    );
    assert!(engine.evaluate(&weekend, &empty_cart()).matched());

    let monday = ContextSnapshot::builder(noon() + chrono::Duration::days(2)).build();
    assert!(!engine.evaluate(&weekend, &monday).matched());
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn duplicate_rule_type_is_rejected() {
    let err = Engine::builder()
        .rule_type(RuleType::new("cart:subtotal", "cart", 99, &[Operator::EqualTo]))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateRuleType {
            id: "cart:subtotal".into()
        }
    );
}

#[test]
fn evaluator_for_unknown_type_is_rejected() {
    let err = Engine::builder()
        .evaluator("loyalty:tier", |_: &RuleRecord, _: &ContextSnapshot| true)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::UnknownRuleType {
            id: "loyalty:tier".into()
        }
    );
}

#[test]
fn duplicate_evaluator_is_rejected() {
    let err = Engine::builder()
        .evaluator("billing:zipcode", |_: &RuleRecord, _: &ContextSnapshot| true)
        .evaluator("billing:zipcode", |_: &RuleRecord, _: &ContextSnapshot| false)
        .build()
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEvaluator { .. }));
}

#[test]
fn custom_rule_type_with_evaluator_and_default() {
    let engine = Engine::builder()
        .rule_type(RuleType::new(
            "loyalty:tier",
            "user",
            30,
            &[Operator::AnyInList, Operator::NotInList],
        ))
        .evaluator("loyalty:tier", |rule: &RuleRecord, ctx: &ContextSnapshot| {
            let tier = if ctx.subtotal() > 100.0 { "gold" } else { "basic" };
            rule.list("loyalty_tiers").iter().any(|t| t == tier)
        })
        .default_param("loyalty_tiers", vec!["gold"])
        .build()
        .unwrap();

    let rich = ContextSnapshot::builder(noon()).subtotal(250.0).build();
    let set = single(&engine, RuleRecord::new("loyalty:tier", "any_in_list"));
    assert!(engine.evaluate(&set, &rich).matched());
    assert!(!engine.evaluate(&set, &empty_cart()).matched());

    let users = engine.rule_types().list_by_group("user");
    assert_eq!(users.last().map(|t| t.id.as_str()), Some("loyalty:tier"));
}

#[test]
fn verdict_override_runs_after_aggregation() {
    let engine = Engine::builder()
        .verdict_override(|verdict, set| {
            verdict.with_matched(verdict.matched() && set.match_mode == MatchMode::Any)
        })
        .build()
        .unwrap();
    let ctx = ContextSnapshot::builder(noon()).subtotal(10.0).build();

    let rule = RuleRecord::new("cart:subtotal", "greater_than").param("value", "1");
    let all = single(&engine, rule.clone());
    let any = engine.normalize_set(RuleSetBuilder::new().record(rule).match_any().build());

    assert!(!engine.evaluate(&all, &ctx).matched());
    assert!(engine.evaluate(&any, &ctx).matched());
    assert!(!engine.decide(&all, &ctx, false).is_hidden());
}
