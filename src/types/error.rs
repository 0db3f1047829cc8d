use thiserror::Error;

/// Errors raised while registering rule types or evaluators at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("rule type '{id}' is already registered")]
    DuplicateRuleType { id: String },

    #[error("an evaluator for rule type '{id}' is already registered")]
    DuplicateEvaluator { id: String },

    #[error("cannot register an evaluator for unknown rule type '{id}'")]
    UnknownRuleType { id: String },

    #[error("rule group '{group}' is already registered")]
    DuplicateGroup { group: String },
}

/// Errors raised while reading a persisted settings record.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings root must be a JSON object")]
    NotAnObject,
}
