use std::fmt;

use super::ruleset::MatchMode;

/// Aggregated result of evaluating a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Verdict {
    matched: bool,
    mode: MatchMode,
    matched_rules: usize,
    total_rules: usize,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{} rules, {})",
            if self.matched { "match" } else { "no match" },
            self.matched_rules,
            self.total_rules,
            self.mode,
        )
    }
}

impl Verdict {
    pub fn new(matched: bool, mode: MatchMode, matched_rules: usize, total_rules: usize) -> Self {
        Self {
            matched,
            mode,
            matched_rules,
            total_rules,
        }
    }

    /// Whether the rule set matched, i.e. whether the option should be hidden.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched
    }

    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of rules that matched individually.
    #[must_use]
    pub fn matched_rules(&self) -> usize {
        self.matched_rules
    }

    #[must_use]
    pub fn total_rules(&self) -> usize {
        self.total_rules
    }

    /// The same verdict with its outcome replaced. Rule counts are kept so
    /// an override stays visible in diagnostics.
    pub fn with_matched(self, matched: bool) -> Self {
        Self { matched, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_verdict() {
        let v = Verdict::new(true, MatchMode::All, 2, 2);
        assert!(v.matched());
        assert_eq!(v.mode(), MatchMode::All);
        assert_eq!(v.matched_rules(), 2);
        assert_eq!(v.total_rules(), 2);
    }

    #[test]
    fn with_matched_keeps_counts() {
        let v = Verdict::new(false, MatchMode::Any, 0, 3).with_matched(true);
        assert!(v.matched());
        assert_eq!(v.matched_rules(), 0);
        assert_eq!(v.total_rules(), 3);
    }

    #[test]
    fn display() {
        let v = Verdict::new(false, MatchMode::All, 1, 2);
        assert_eq!(v.to_string(), "no match (1/2 rules, all)");
    }
}
