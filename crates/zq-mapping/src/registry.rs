//! Mapping registry
//!
//! One [`EntityRule`] per entity kind, plus the named functions and the
//! custom-field coercer those rules run with. Built once at startup and read
//! afterwards; replacing a kind's rule is an explicit registration.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use zq_model::{EntityKind, Record};

use crate::builtin::default_rules;
use crate::coercer::CustomFieldCoercer;
use crate::custom_fields::CustomFieldMapping;
use crate::entity::MappedEntity;
use crate::functions::FunctionRegistry;
use crate::rules::{EntityRule, RuleDsl, RuleSet};

/// Registry from entity kind to its mapping rule
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    rules: HashMap<EntityKind, EntityRule>,
    functions: FunctionRegistry,
    coercer: CustomFieldCoercer,
}

/// Build a registry holding the built-in rules for all eight entity kinds
/// and the built-in named functions
#[must_use]
pub fn new_default_registry() -> MappingRegistry {
    let mut registry = MappingRegistry::with_parts(
        FunctionRegistry::with_builtins(),
        CustomFieldCoercer::new(),
    );
    for rule in default_rules() {
        registry.register(rule);
    }
    registry
}

impl MappingRegistry {
    /// Create a registry without any rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry around existing functions and coercer
    #[must_use]
    pub fn with_parts(functions: FunctionRegistry, coercer: CustomFieldCoercer) -> Self {
        Self {
            rules: HashMap::new(),
            functions,
            coercer,
        }
    }

    /// Register a rule, replacing and returning any rule for the same kind
    pub fn register(&mut self, rule: EntityRule) -> Option<EntityRule> {
        debug!(
            kind = %rule.source_kind,
            target = %rule.target_kind,
            fields = rule.fields.len(),
            "registering entity rule"
        );
        self.rules.insert(rule.source_kind, rule)
    }

    /// Register every rule in a rule set; returns how many were registered
    pub fn apply_overrides(&mut self, set: RuleSet) -> usize {
        let count = set.rules.len();
        for rule in set.rules {
            if self.register(rule).is_some() {
                debug!("replaced built-in rule");
            }
        }
        count
    }

    /// Load a YAML rule file and register its rules
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_overrides(&mut self, path: &Path) -> crate::Result<usize> {
        let set = RuleDsl::parse_file(path)?;
        let count = self.apply_overrides(set);
        info!(path = %path.display(), count, "loaded rule overrides");
        Ok(count)
    }

    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&EntityRule> {
        self.rules.get(&kind)
    }

    #[must_use]
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.rules.contains_key(&kind)
    }

    /// Registered kinds, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.rules.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// All registered rules as a rule set, sorted by kind
    #[must_use]
    pub fn to_rule_set(&self) -> RuleSet {
        RuleSet {
            rules: self
                .kinds()
                .into_iter()
                .filter_map(|kind| self.rules.get(&kind).cloned())
                .collect(),
        }
    }

    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    #[must_use]
    pub fn coercer(&self) -> &CustomFieldCoercer {
        &self.coercer
    }

    pub fn coercer_mut(&mut self) -> &mut CustomFieldCoercer {
        &mut self.coercer
    }

    fn rule(&self, kind: EntityKind) -> crate::Result<&EntityRule> {
        self.rules.get(&kind).ok_or(crate::Error::MissingRule(kind))
    }

    /// Map a source record with the rule registered for `kind`
    ///
    /// # Errors
    ///
    /// Returns an error when no rule is registered for `kind`, when a field
    /// with the `Error` policy fails, or when a coercion override fails.
    pub fn map(&self, kind: EntityKind, source: &Record) -> crate::Result<Record> {
        self.map_entity(kind, source).map(|mapped| mapped.record)
    }

    /// Like [`MappingRegistry::map`], keeping the warnings
    ///
    /// # Errors
    ///
    /// See [`MappingRegistry::map`].
    pub fn map_entity(&self, kind: EntityKind, source: &Record) -> crate::Result<MappedEntity> {
        self.rule(kind)?.map(source, &self.functions, &self.coercer)
    }

    /// Map only the standard fields of a record
    ///
    /// # Errors
    ///
    /// Returns an error when no rule is registered for `kind` or a field with
    /// the `Error` policy fails.
    pub fn map_fields(&self, kind: EntityKind, source: &Record) -> crate::Result<MappedEntity> {
        self.rule(kind)?.map_fields(source, &self.functions)
    }

    /// Map only the custom fields of a record
    ///
    /// # Errors
    ///
    /// Returns an error when no rule is registered for `kind` or a coercion
    /// override fails.
    pub fn map_custom_fields(
        &self,
        kind: EntityKind,
        source: &Record,
    ) -> crate::Result<Option<CustomFieldMapping>> {
        self.rule(kind)?.map_custom_fields(source, &self.coercer)
    }
}
