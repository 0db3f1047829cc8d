mod context;
mod error;
mod evaluation_report;
mod operator;
mod rule;
mod rule_type;
mod ruleset;
mod template;
mod value;
mod verdict;

pub use context::{Address, CartLine, ContextBuilder, ContextSnapshot, Customer};
pub use error::{RegistryError, SettingsError};
pub use evaluation_report::{EvaluationReport, RuleOutcome};
pub use operator::{
    Operator, UnknownOperator, MEMBERSHIP_OPERATORS, NUMERIC_OPERATORS, SET_OPERATORS,
    TEMPORAL_OPERATORS,
};
pub use rule::RuleRecord;
pub use rule_type::{
    Dimension, RuleType, RuleTypeRegistry, DEFAULT_TAXONOMIES, SHIPPING_CLASS_TAXONOMY,
};
pub use ruleset::{MatchMode, RuleSet, RuleSetBuilder, UnknownMatchType};
pub use template::{RuleTemplate, DEFAULT_OPERATOR, DEFAULT_RULE_TYPE};
pub use value::{Temporal, Value};
pub use verdict::Verdict;
