mod engine;
mod error;
mod evaluate;
pub mod evaluators;
mod gate;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod settings;
mod types;

pub use engine::{Engine, EngineBuilder, VerdictOverride};
pub use error::RategateError;
pub use evaluators::{Evaluator, EvaluatorRegistry};
pub use gate::{
    CapabilityCheck, Decision, HideReason, PricedOption, RatePass, ShowReason, SnapshotSource,
};
pub use types::{
    Address, CartLine, ContextBuilder, ContextSnapshot, Customer, Dimension, EvaluationReport,
    MatchMode, Operator, RegistryError, RuleOutcome, RuleRecord, RuleSet, RuleSetBuilder,
    RuleTemplate, RuleType, RuleTypeRegistry, SettingsError, Temporal, UnknownMatchType,
    UnknownOperator, Value, Verdict, DEFAULT_OPERATOR, DEFAULT_RULE_TYPE, DEFAULT_TAXONOMIES,
    MEMBERSHIP_OPERATORS, NUMERIC_OPERATORS, SET_OPERATORS, SHIPPING_CLASS_TAXONOMY,
    TEMPORAL_OPERATORS,
};
