//! The persisted per-option settings record and its migrations.
//!
//! ```json
//! {
//!   "hide_shipping_rate": false,
//!   "disable_shipping_rules": false,
//!   "match_type": "all",
//!   "rules": [{ "type": "cart:subtotal", "operator": "greater_than", "value": "100" }]
//! }
//! ```
//!
//! Reading is lenient: flags count only when they are literally `true`, a
//! missing `match_type` means `all`, a missing or non-array `rules` means no
//! rules, and fields this crate does not understand are carried through to
//! [`RuleSet::to_settings_json()`]. A `match_type` other than `all` or `any`
//! is kept as stored and makes the rule set a non-match.

use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as Json};

use crate::{
    MatchMode, RategateError, RuleRecord, RuleSet, SettingsError, Value, DEFAULT_OPERATOR,
    DEFAULT_RULE_TYPE,
};

/// `(legacy type, current type, legacy field, current field)`.
const LEGACY_RULE_TYPES: &[(&str, &str, &str, &str)] = &[
    (
        "cart_products:categories",
        "cart_products:product_cat",
        "categories",
        "cart_products_product_cat",
    ),
    (
        "cart_products:tags",
        "cart_products:product_tag",
        "tags",
        "cart_products_product_tag",
    ),
    (
        "cart_products:shipping_classes",
        "cart_products:product_shipping_class",
        "shipping_classes",
        "cart_products_product_shipping_class",
    ),
];

#[derive(Deserialize)]
struct StoredSettings {
    #[serde(default, deserialize_with = "strict_true")]
    hide_shipping_rate: bool,
    #[serde(default, deserialize_with = "strict_true")]
    disable_shipping_rules: bool,
    #[serde(default)]
    match_type: Option<Json>,
    #[serde(default)]
    rules: Json,
    #[serde(flatten)]
    extra: Map<String, Json>,
}

fn strict_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Json::deserialize(deserializer)?, Json::Bool(true)))
}

impl RuleSet {
    /// Parse a stored settings record. Rules are returned as stored (after
    /// legacy migration); pass the set through
    /// [`Engine::normalize_set()`](crate::Engine::normalize_set) or use
    /// [`Engine::load_settings()`](crate::Engine::load_settings) before
    /// evaluating.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if `json` is not valid JSON or its root is
    /// not an object.
    pub fn from_settings_json(json: &str) -> Result<Self, SettingsError> {
        let root: Json = serde_json::from_str(json)?;
        Self::from_settings_value(root)
    }

    /// Like [`from_settings_json()`](Self::from_settings_json), from an
    /// already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotAnObject`] if `root` is not an object.
    pub fn from_settings_value(root: Json) -> Result<Self, SettingsError> {
        if !root.is_object() {
            return Err(SettingsError::NotAnObject);
        }
        let stored: StoredSettings = serde_json::from_value(root)?;

        let rules = match stored.rules {
            Json::Array(items) => items.into_iter().filter_map(rule_from_json).collect(),
            Json::Null => Vec::new(),
            other => {
                tracing::warn!(rules = %other, "stored rules are not a list; ignoring them");
                Vec::new()
            }
        };

        let (match_mode, unrecognized_match_type) = match_mode(stored.match_type);
        Ok(RuleSet {
            rules,
            match_mode,
            hide_unconditionally: stored.hide_shipping_rate,
            rules_disabled_for_privileged: stored.disable_shipping_rules,
            unrecognized_match_type,
            extra: stored.extra,
        })
    }

    /// Read a settings record from a file.
    ///
    /// # Errors
    ///
    /// Returns [`RategateError`] on I/O failure or malformed settings.
    pub fn from_settings_file(path: impl AsRef<Path>) -> Result<Self, RategateError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_settings_json(&json)?)
    }

    /// The stored form of this rule set.
    ///
    /// A [`Value::DateTime`] parameter is written as its literal text, so it
    /// reads back as [`Value::Text`]. Evaluators parse either form the same
    /// way.
    #[must_use]
    pub fn to_settings_json(&self) -> Json {
        let mut root = Map::new();
        root.insert(
            "hide_shipping_rate".into(),
            Json::Bool(self.hide_unconditionally),
        );
        root.insert(
            "disable_shipping_rules".into(),
            Json::Bool(self.rules_disabled_for_privileged),
        );
        let match_type = self
            .unrecognized_match_type
            .clone()
            .unwrap_or_else(|| Json::from(self.match_mode.as_str()));
        root.insert("match_type".into(), match_type);
        root.insert(
            "rules".into(),
            Json::Array(self.rules.iter().map(rule_to_json).collect()),
        );
        for (key, value) in &self.extra {
            root.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Json::Object(root)
    }
}

/// The mode for a stored `match_type`, plus the stored value itself when it
/// names no mode. Missing or `null` means `all`.
fn match_mode(stored: Option<Json>) -> (MatchMode, Option<Json>) {
    let parsed = match &stored {
        None => return (MatchMode::All, None),
        Some(Json::String(s)) => s.parse::<MatchMode>().map_err(|err| err.to_string()),
        Some(other) => Err(format!("match type {other} is not a string")),
    };
    match parsed {
        Ok(mode) => (mode, None),
        Err(reason) => {
            tracing::warn!(%reason, "rule set will not match");
            (MatchMode::All, stored)
        }
    }
}

fn rule_from_json(json: Json) -> Option<RuleRecord> {
    let fields = match json {
        Json::Object(fields) => fields,
        other => {
            tracing::warn!(rule = %other, "skipping stored rule that is not an object");
            return None;
        }
    };

    let mut rule = RuleRecord::new(DEFAULT_RULE_TYPE, DEFAULT_OPERATOR);
    for (key, value) in fields {
        match value {
            Json::String(ty) if key == "type" => rule.rule_type = ty,
            Json::String(op) if key == "operator" => rule.operator = op,
            value => match Value::from_json(&value) {
                Some(param) if key != "type" && key != "operator" => {
                    rule.params.insert(key, param);
                }
                _ => {
                    rule.extra.insert(key, value);
                }
            },
        }
    }

    migrate_legacy(&mut rule);
    Some(rule)
}

fn migrate_legacy(rule: &mut RuleRecord) {
    let Some(&(legacy, current, legacy_field, current_field)) = LEGACY_RULE_TYPES
        .iter()
        .find(|(legacy, ..)| *legacy == rule.rule_type)
    else {
        return;
    };
    tracing::debug!(from = legacy, to = current, "remapping legacy rule type");
    current.clone_into(&mut rule.rule_type);
    if let Some(list) = rule
        .get(legacy_field)
        .filter(|v| matches!(v, Value::List(_)))
        .cloned()
    {
        rule.params.insert(current_field.to_owned(), list);
    }
}

fn rule_to_json(rule: &RuleRecord) -> Json {
    let mut fields = Map::new();
    fields.insert("type".into(), Json::from(rule.rule_type.as_str()));
    fields.insert("operator".into(), Json::from(rule.operator.as_str()));
    for (key, value) in &rule.params {
        fields.insert(key.clone(), value.to_json());
    }
    for (key, value) in &rule.extra {
        fields.insert(key.clone(), value.clone());
    }
    Json::Object(fields)
}
