use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use thiserror::Error;

use super::rule::RuleRecord;

/// How individual rule results are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Every rule must match.
    #[default]
    All,
    /// At least one rule must match.
    Any,
}

impl MatchMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMode::All => "all",
            MatchMode::Any => "any",
        }
    }
}

/// Error returned when a stored `match_type` is neither `all` nor `any`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown match type '{0}'")]
pub struct UnknownMatchType(pub String);

impl FromStr for MatchMode {
    type Err = UnknownMatchType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(MatchMode::All),
            "any" => Ok(MatchMode::Any),
            other => Err(UnknownMatchType(other.to_owned())),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rules attached to one priced option, plus its override flags.
///
/// Built per request from stored settings with
/// [`Engine::load_settings()`](crate::Engine::load_settings), or in code with
/// [`RuleSetBuilder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<RuleRecord>,
    pub match_mode: MatchMode,
    /// Hide the option from non-privileged callers without running any rule.
    pub hide_unconditionally: bool,
    /// Stored alongside the rules and round-tripped. Privileged callers are
    /// exempt from hiding whether or not this is set.
    pub rules_disabled_for_privileged: bool,
    /// A stored `match_type` that is neither `all` nor `any`, kept verbatim
    /// for write-back. While set, the rule set never matches.
    pub unrecognized_match_type: Option<Json>,
    /// Stored top-level fields this crate does not interpret.
    pub extra: Map<String, Json>,
}

impl RuleSet {
    /// The mode actually applied: `All` when fewer than two rules exist, and
    /// `None` when the stored match type was not recognised.
    #[must_use]
    pub fn effective_mode(&self) -> Option<MatchMode> {
        if self.unrecognized_match_type.is_some() {
            None
        } else if self.rules.len() < 2 {
            Some(MatchMode::All)
        } else {
            Some(self.match_mode)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({} rules, match {}{})",
            self.rules.len(),
            self.effective_mode().map_or("unrecognized", MatchMode::as_str),
            if self.hide_unconditionally {
                ", hide unconditionally"
            } else {
                ""
            },
        )
    }
}

/// Builder for constructing a [`RuleSet`] in code.
///
/// # Example
///
/// ```
/// use rategate::RuleSetBuilder;
///
/// let rule_set = RuleSetBuilder::new()
///     .rule("cart:subtotal", "greater_than", |r| r.param("value", 100_i64))
///     .rule("billing:country", "any_in_list", |r| {
///         r.param("billing_countries", vec!["US", "CA"])
///     })
///     .match_any()
///     .build();
/// assert_eq!(rule_set.len(), 2);
/// ```
#[derive(Debug, Default)]
#[must_use]
pub struct RuleSetBuilder {
    rule_set: RuleSet,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. The closure sets its parameters.
    pub fn rule(
        mut self,
        rule_type: &str,
        operator: &str,
        f: impl FnOnce(RuleRecord) -> RuleRecord,
    ) -> Self {
        self.rule_set
            .rules
            .push(f(RuleRecord::new(rule_type, operator)));
        self
    }

    /// Append an already-built rule.
    pub fn record(mut self, rule: RuleRecord) -> Self {
        self.rule_set.rules.push(rule);
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.rule_set.match_mode = mode;
        self
    }

    pub fn match_any(self) -> Self {
        self.match_mode(MatchMode::Any)
    }

    pub fn hide_unconditionally(mut self, hide: bool) -> Self {
        self.rule_set.hide_unconditionally = hide;
        self
    }

    pub fn rules_disabled_for_privileged(mut self, disabled: bool) -> Self {
        self.rule_set.rules_disabled_for_privileged = disabled;
        self
    }

    pub fn build(self) -> RuleSet {
        self.rule_set
    }
}
