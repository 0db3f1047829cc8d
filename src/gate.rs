//! The decision gate: whether one priced option is shown or hidden, and a
//! rate pass that filters a whole list of options against one snapshot.

use std::fmt;

use crate::{ContextSnapshot, Engine, RuleSet};

/// Why an option stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowReason {
    /// The caller is exempt from hiding.
    Privileged,
    /// No rules are configured.
    NoRules,
    /// The rules were evaluated and did not match.
    RulesNotMatched,
}

/// Why an option is suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideReason {
    /// `hide_unconditionally` is set; no rule was run.
    Unconditional,
    RulesMatched,
}

/// Final outcome for one priced option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Show(ShowReason),
    Hide(HideReason),
}

impl Decision {
    #[must_use]
    pub fn is_hidden(self) -> bool {
        matches!(self, Decision::Hide(_))
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Show(ShowReason::Privileged) => f.write_str("show (privileged caller)"),
            Decision::Show(ShowReason::NoRules) => f.write_str("show (no rules)"),
            Decision::Show(ShowReason::RulesNotMatched) => f.write_str("show (rules not matched)"),
            Decision::Hide(HideReason::Unconditional) => f.write_str("hide (unconditional)"),
            Decision::Hide(HideReason::RulesMatched) => f.write_str("hide (rules matched)"),
        }
    }
}

/// Supplies the facts of the current request.
pub trait SnapshotSource {
    fn snapshot(&self) -> ContextSnapshot;
}

impl SnapshotSource for ContextSnapshot {
    fn snapshot(&self) -> ContextSnapshot {
        self.clone()
    }
}

/// Answers whether the current caller holds a management capability.
pub trait CapabilityCheck {
    fn is_privileged(&self) -> bool;
}

impl CapabilityCheck for bool {
    fn is_privileged(&self) -> bool {
        *self
    }
}

/// A priced option carrying its stored rule settings.
pub trait PricedOption {
    fn option_id(&self) -> &str;

    /// Stored settings JSON, or `None` when the option has none.
    fn rule_settings(&self) -> Option<&str>;
}

impl Engine {
    /// Decide one option. Privileged callers always see it; otherwise
    /// `hide_unconditionally` hides it without running any rule, an empty
    /// set shows it, and the (possibly overridden) verdict decides.
    pub fn decide(&self, set: &RuleSet, ctx: &ContextSnapshot, privileged: bool) -> Decision {
        if privileged {
            return Decision::Show(ShowReason::Privileged);
        }
        if set.hide_unconditionally {
            return Decision::Hide(HideReason::Unconditional);
        }
        if set.is_empty() {
            return Decision::Show(ShowReason::NoRules);
        }
        if self.evaluate(set, ctx).matched() {
            Decision::Hide(HideReason::RulesMatched)
        } else {
            Decision::Show(ShowReason::RulesNotMatched)
        }
    }
}

/// One rate-calculation pass: a single snapshot and capability answer shared
/// by every option decided through it.
#[derive(Debug)]
pub struct RatePass<'e> {
    engine: &'e Engine,
    snapshot: ContextSnapshot,
    privileged: bool,
}

impl<'e> RatePass<'e> {
    /// Take the snapshot and ask the capability check once.
    pub fn new(
        engine: &'e Engine,
        source: &impl SnapshotSource,
        capability: &impl CapabilityCheck,
    ) -> Self {
        Self {
            engine,
            snapshot: source.snapshot(),
            privileged: capability.is_privileged(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn privileged(&self) -> bool {
        self.privileged
    }

    /// Decide one option from its stored settings. Options without settings
    /// are shown; malformed settings are logged and the option is shown.
    pub fn decide_option(&self, option: &impl PricedOption) -> Decision {
        let Some(json) = option.rule_settings().filter(|s| !s.trim().is_empty()) else {
            return Decision::Show(ShowReason::NoRules);
        };
        let set = match self.engine.load_settings(json) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!(
                    option = option.option_id(),
                    error = %err,
                    "malformed rule settings"
                );
                return Decision::Show(ShowReason::NoRules);
            }
        };
        let decision = self.engine.decide(&set, &self.snapshot, self.privileged);
        tracing::debug!(option = option.option_id(), %decision, "option decided");
        decision
    }

    /// Keep the options that are not hidden, in their original order.
    pub fn filter<O: PricedOption>(&self, options: Vec<O>) -> Vec<O> {
        options
            .into_iter()
            .filter(|option| !self.decide_option(option).is_hidden())
            .collect()
    }
}
