use super::{list_membership, Evaluator};
use crate::{Address, ContextSnapshot, RuleRecord, Value};

/// Which customer address a rule reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl AddressKind {
    fn address(self, ctx: &ContextSnapshot) -> &Address {
        match self {
            AddressKind::Billing => &ctx.customer().billing,
            AddressKind::Shipping => &ctx.customer().shipping,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            AddressKind::Billing => "billing",
            AddressKind::Shipping => "shipping",
        }
    }
}

/// Membership of the customer id in `users`. Guests have no id and are in
/// no list.
#[derive(Debug, Clone, Copy)]
pub struct Users;

impl Evaluator for Users {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let id = ctx.customer().id.as_deref();
        list_membership(
            rule.parsed_operator(),
            rule.list("users").iter().map(String::as_str),
            |user| id == Some(user),
        )
    }
}

/// `logged_in` is `"yes"` or `"no"`; matches when it equals the login state.
/// Any other value never matches.
#[derive(Debug, Clone, Copy)]
pub struct LoggedIn;

impl Evaluator for LoggedIn {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let wanted = match rule.get("logged_in") {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Text(s)) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("yes") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("no") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        };
        wanted == Some(ctx.customer().logged_in)
    }
}

/// City membership. The configured field is comma-separated text; entries
/// and the customer's city compare trimmed and case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct City(pub AddressKind);

impl Evaluator for City {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let key = format!("{}_cities", self.0.prefix());
        let configured = rule.text(&key).to_lowercase();
        let city = self.0.address(ctx).city.trim().to_lowercase();
        list_membership(
            rule.parsed_operator(),
            configured.split(',').map(str::trim).filter(|c| !c.is_empty()),
            |entry| entry == city,
        )
    }
}

/// Exact country-code membership.
#[derive(Debug, Clone, Copy)]
pub struct Country(pub AddressKind);

impl Evaluator for Country {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let key = format!("{}_countries", self.0.prefix());
        let country = &self.0.address(ctx).country;
        list_membership(
            rule.parsed_operator(),
            rule.list(&key).iter().map(String::as_str),
            |code| code == country,
        )
    }
}
