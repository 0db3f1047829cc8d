use std::fmt;
use std::path::Path;

use crate::evaluators::{Evaluator, EvaluatorRegistry};
use crate::{
    ContextSnapshot, EvaluationReport, RategateError, RegistryError, RuleOutcome, RuleRecord,
    RuleSet, RuleTemplate, RuleType, RuleTypeRegistry, SettingsError, Value, Verdict,
    DEFAULT_TAXONOMIES,
};

/// Post-aggregation hook. Receives the verdict and the rule set it was
/// computed for and returns the verdict to use.
pub type VerdictOverride = Box<dyn Fn(Verdict, &RuleSet) -> Verdict + Send + Sync>;

/// The startup-built, read-only rule engine.
///
/// Holds the rule-type catalog, the evaluator table, the default template
/// and the optional verdict override. Build it once with [`EngineBuilder`]
/// and share it (e.g. through `Arc`) across requests; nothing in it changes
/// after [`EngineBuilder::build()`].
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use rategate::{ContextSnapshot, Engine, RuleSetBuilder};
///
/// let engine = Engine::with_defaults().unwrap();
/// let set = RuleSetBuilder::new()
///     .rule("cart:subtotal", "greater_than", |r| r.param("value", 100_i64))
///     .build();
/// let now = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let ctx = ContextSnapshot::builder(now).subtotal(120.0).build();
/// assert!(engine.evaluate(&engine.normalize_set(set), &ctx).matched());
/// ```
pub struct Engine {
    types: RuleTypeRegistry,
    evaluators: EvaluatorRegistry,
    template: RuleTemplate,
    verdict_override: Option<VerdictOverride>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("types", &self.types.len())
            .field("evaluators", &self.evaluators)
            .field("verdict_override", &self.verdict_override.is_some())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Engine with the built-in catalog and default taxonomies.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in configuration; the `Result` mirrors
    /// [`EngineBuilder::build()`].
    pub fn with_defaults() -> Result<Self, RegistryError> {
        EngineBuilder::new().build()
    }

    #[must_use]
    pub fn rule_types(&self) -> &RuleTypeRegistry {
        &self.types
    }

    #[must_use]
    pub fn evaluators(&self) -> &EvaluatorRegistry {
        &self.evaluators
    }

    #[must_use]
    pub fn template(&self) -> &RuleTemplate {
        &self.template
    }

    /// Merge `rule` against the default template.
    #[must_use]
    pub fn normalize(&self, rule: RuleRecord) -> RuleRecord {
        let ty = self.types.lookup(&rule.rule_type);
        self.template.normalize(rule, ty)
    }

    /// Normalize every rule of `set`.
    #[must_use]
    pub fn normalize_set(&self, mut set: RuleSet) -> RuleSet {
        set.rules = set.rules.into_iter().map(|r| self.normalize(r)).collect();
        set
    }

    /// Parse stored settings and normalize their rules.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if `json` is not a JSON object.
    pub fn load_settings(&self, json: &str) -> Result<RuleSet, SettingsError> {
        let set = RuleSet::from_settings_json(json)?;
        Ok(self.normalize_set(set))
    }

    /// Read stored settings from a file and normalize their rules.
    ///
    /// # Errors
    ///
    /// Returns [`RategateError`] on I/O failure or malformed settings.
    pub fn load_settings_file(&self, path: impl AsRef<Path>) -> Result<RuleSet, RategateError> {
        let set = RuleSet::from_settings_file(path)?;
        Ok(self.normalize_set(set))
    }

    /// Evaluate `set` against `ctx` and apply the verdict override.
    ///
    /// `set` is expected to be normalized. The override is not consulted for
    /// an empty set.
    pub fn evaluate(&self, set: &RuleSet, ctx: &ContextSnapshot) -> Verdict {
        let verdict = crate::evaluate::evaluate(&self.types, &self.evaluators, set, ctx);
        self.apply_override(verdict, set)
    }

    /// Like [`evaluate()`](Self::evaluate), with per-rule outcomes and timing.
    pub fn evaluate_detailed(&self, set: &RuleSet, ctx: &ContextSnapshot) -> EvaluationReport {
        let report = crate::evaluate::evaluate_detailed(&self.types, &self.evaluators, set, ctx);
        let verdict = self.apply_override(report.verdict(), set);
        report.with_verdict(verdict)
    }

    /// Evaluate a single rule.
    #[must_use]
    pub fn evaluate_rule(&self, rule: &RuleRecord, ctx: &ContextSnapshot) -> RuleOutcome {
        crate::evaluate::evaluate_rule(&self.types, &self.evaluators, rule, ctx)
    }

    fn apply_override(&self, verdict: Verdict, set: &RuleSet) -> Verdict {
        match &self.verdict_override {
            Some(hook) if !set.is_empty() => {
                let replaced = hook(verdict, set);
                if replaced.matched() != verdict.matched() {
                    tracing::debug!(from = %verdict, to = %replaced, "verdict overridden");
                }
                replaced
            }
            _ => verdict,
        }
    }
}

/// Startup configuration for an [`Engine`].
#[must_use]
pub struct EngineBuilder {
    taxonomies: Vec<String>,
    rule_types: Vec<RuleType>,
    evaluators: Vec<(String, Box<dyn Evaluator>)>,
    defaults: Vec<(String, Value)>,
    verdict_override: Option<VerdictOverride>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBuilder")
            .field("taxonomies", &self.taxonomies)
            .field("rule_types", &self.rule_types)
            .field("evaluators", &self.evaluators.len())
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            taxonomies: DEFAULT_TAXONOMIES.iter().map(|&t| t.to_owned()).collect(),
            rule_types: Vec::new(),
            evaluators: Vec::new(),
            defaults: Vec::new(),
            verdict_override: None,
        }
    }

    /// Replace the taxonomies exposed as `cart_products:<taxonomy>` types.
    pub fn taxonomies<S: AsRef<str>>(mut self, taxonomies: &[S]) -> Self {
        self.taxonomies = taxonomies.iter().map(|t| t.as_ref().to_owned()).collect();
        self
    }

    /// Expose one more taxonomy.
    pub fn taxonomy(mut self, taxonomy: &str) -> Self {
        self.taxonomies.push(taxonomy.to_owned());
        self
    }

    pub fn rule_type(mut self, ty: RuleType) -> Self {
        self.rule_types.push(ty);
        self
    }

    /// Evaluator for the rule type `id`, which must be registered (built in
    /// or through [`rule_type()`](Self::rule_type)) by the time of `build()`.
    pub fn evaluator(mut self, id: &str, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluators.push((id.to_owned(), Box::new(evaluator)));
        self
    }

    /// Extra default merged into every rule's parameters.
    pub fn default_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.defaults.push((key.to_owned(), value.into()));
        self
    }

    pub fn verdict_override(
        mut self,
        hook: impl Fn(Verdict, &RuleSet) -> Verdict + Send + Sync + 'static,
    ) -> Self {
        self.verdict_override = Some(Box::new(hook));
        self
    }

    /// # Errors
    ///
    /// Returns [`RegistryError`] on a duplicate rule type or evaluator, or an
    /// evaluator for an unregistered rule type.
    pub fn build(self) -> Result<Engine, RegistryError> {
        let mut types = RuleTypeRegistry::with_builtin_types(&self.taxonomies)?;
        for ty in self.rule_types {
            types.register(ty)?;
        }

        let mut evaluators = EvaluatorRegistry::with_builtin_evaluators(&types)?;
        for (id, evaluator) in self.evaluators {
            if types.lookup(&id).is_none() {
                return Err(RegistryError::UnknownRuleType { id });
            }
            evaluators.insert(&id, evaluator)?;
        }

        let mut template = RuleTemplate::builtin(&self.taxonomies);
        for (key, value) in self.defaults {
            template.insert(&key, value);
        }

        tracing::debug!(
            rule_types = types.len(),
            evaluators = evaluators.len(),
            "engine built"
        );

        Ok(Engine {
            types,
            evaluators,
            template,
            verdict_override: self.verdict_override,
        })
    }
}
