use std::fmt;
use std::time::Duration;

use super::verdict::Verdict;

/// How a single rule fared during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Matched,
    NotMatched,
    /// The rule type is not in the registry.
    UnknownType,
    /// The rule type is known but nothing evaluates it.
    NoEvaluator,
    /// The operator is not legal for the rule type.
    IllegalOperator,
}

impl RuleOutcome {
    #[must_use]
    pub fn is_match(self) -> bool {
        self == RuleOutcome::Matched
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleOutcome::Matched => "matched",
            RuleOutcome::NotMatched => "not matched",
            RuleOutcome::UnknownType => "unknown type",
            RuleOutcome::NoEvaluator => "no evaluator",
            RuleOutcome::IllegalOperator => "illegal operator",
        })
    }
}

/// Detailed evaluation report returned by
/// [`Engine::evaluate_detailed()`](crate::Engine::evaluate_detailed).
///
/// Contains the verdict, the outcome of every rule in authored order, and
/// the wall-clock duration of the evaluation.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    verdict: Verdict,
    outcomes: Vec<(String, RuleOutcome)>,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        verdict: Verdict,
        outcomes: Vec<(String, RuleOutcome)>,
        duration: Duration,
    ) -> Self {
        Self {
            verdict,
            outcomes,
            duration,
        }
    }

    pub(crate) fn with_verdict(self, verdict: Verdict) -> Self {
        Self { verdict, ..self }
    }

    /// The evaluation verdict, same as [`Engine::evaluate()`](crate::Engine::evaluate).
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// `(rule type, outcome)` per rule, in authored order.
    #[must_use]
    pub fn outcomes(&self) -> &[(String, RuleOutcome)] {
        &self.outcomes
    }

    /// Rule types of the rules that matched.
    #[must_use]
    pub fn matched(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_match())
            .map(|(ty, _)| ty.as_str())
            .collect()
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verdict: {}", self.verdict)?;
        write!(f, ", matched: [{}]", self.matched().join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
