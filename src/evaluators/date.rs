use chrono::{Datelike, NaiveDateTime};

use super::{list_membership, Evaluator};
use crate::{ContextSnapshot, Operator, RuleRecord};

/// Compares the snapshot's `now` against one or two authored instants.
///
/// `before` and `after` read only the first instant and are strict. The
/// range operators need both; `between` is inclusive and `not_between` its
/// complement. Any instant that does not parse makes the rule a non-match.
#[derive(Debug, Clone, Copy)]
pub struct Instant {
    first: &'static str,
    second: &'static str,
}

impl Instant {
    /// Time of day, read from `time_one`/`time_two`.
    #[must_use]
    pub fn time() -> Self {
        Self {
            first: "time_one",
            second: "time_two",
        }
    }

    /// Calendar date or date-time, read from `date_one`/`date_two`.
    #[must_use]
    pub fn date() -> Self {
        Self {
            first: "date_one",
            second: "date_two",
        }
    }

    fn instant(rule: &RuleRecord, key: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        rule.get(key)?.as_temporal().map(|t| t.resolve(now))
    }
}

impl Evaluator for Instant {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let now = ctx.now();
        let Some(start) = Self::instant(rule, self.first, now) else {
            return false;
        };
        match rule.parsed_operator() {
            Some(Operator::Before) => now < start,
            Some(Operator::After) => now > start,
            Some(op @ (Operator::Between | Operator::NotBetween)) => {
                let Some(end) = Self::instant(rule, self.second, now) else {
                    return false;
                };
                let inside = start <= now && now <= end;
                if op == Operator::Between {
                    inside
                } else {
                    !inside
                }
            }
            _ => false,
        }
    }
}

/// Membership of the current weekday, as a lowercase English name such as
/// `"saturday"`, in `weekly_days`.
#[derive(Debug, Clone, Copy)]
pub struct WeeklyDays;

impl WeeklyDays {
    fn day_name(now: NaiveDateTime) -> &'static str {
        match now.weekday() {
            chrono::Weekday::Mon => "monday",
            chrono::Weekday::Tue => "tuesday",
            chrono::Weekday::Wed => "wednesday",
            chrono::Weekday::Thu => "thursday",
            chrono::Weekday::Fri => "friday",
            chrono::Weekday::Sat => "saturday",
            chrono::Weekday::Sun => "sunday",
        }
    }
}

impl Evaluator for WeeklyDays {
    fn evaluate(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> bool {
        let today = Self::day_name(ctx.now());
        list_membership(
            rule.parsed_operator(),
            rule.list("weekly_days").iter().map(String::as_str),
            |day| day.trim().eq_ignore_ascii_case(today),
        )
    }
}
