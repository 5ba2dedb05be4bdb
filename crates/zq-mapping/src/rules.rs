//! Field and entity rules
//!
//! Rules are plain data: every transform and validation is a named kind, so
//! a rule set can be written to and read from YAML.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use zq_model::{EntityKind, Record, TargetKind, get_path, stringify};

use crate::functions::FunctionRegistry;
use crate::transforms::{apply_transform, apply_validation};

/// What a field rule does when its value is missing, fails to transform, or
/// fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    /// Abort the whole entity mapping
    Error,
    /// Keep the value at hand and report the failure
    #[default]
    Warning,
    /// Keep the raw source value rendered as a string and report the failure
    Transform,
    /// Substitute the rule's default and clear the failure
    Default,
    /// Leave the target field out and report the failure
    Skip,
}

/// Built-in value transforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformKind {
    Uppercase,
    Lowercase,
    Trim,
    /// Render any value as display text
    ToString,
    /// Join a list into one string
    ListJoin {
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// Priority name to numeric qTest priority id; unknown names fail
    PriorityId,
    /// Priority name to qTest priority name
    PriorityName,
    /// Execution status name to qTest status
    Status,
    /// Date or timestamp to RFC 3339; unparseable input fails
    DateIso,
    /// Replace null or empty strings with a fixed value
    DefaultIfEmpty { value: Value },
    /// Apply transforms in order
    Chain { transforms: Vec<TransformKind> },
    /// Named function from the [`FunctionRegistry`]
    Custom { name: String },
}

fn default_separator() -> String {
    ", ".to_string()
}

/// Built-in validation predicates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ValidationKind {
    NotEmpty,
    MaxLength { max: usize },
    Matches { pattern: String },
    OneOf { values: Vec<String> },
    Numeric,
    /// Named predicate from the [`FunctionRegistry`]
    Custom { name: String },
}

/// Mapping of one source field to one target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Source field name; dotted paths reach into nested objects
    pub source_field: String,

    /// Target field name
    pub target_field: String,

    #[serde(default)]
    pub required: bool,

    /// Alternate source fields read in order when the primary is absent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate: Option<ValidationKind>,

    #[serde(default)]
    pub on_fail: OnFail,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Result of running a field rule over one value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    pub is_valid: bool,
    pub value: Value,
    pub error: Option<String>,
}

impl FieldOutcome {
    fn valid(value: Value) -> Self {
        Self {
            is_valid: true,
            value,
            error: None,
        }
    }

    fn invalid(value: Value, error: String) -> Self {
        Self {
            is_valid: false,
            value,
            error: Some(error),
        }
    }
}

impl FieldRule {
    /// Create a rule copying `source_field` to `target_field` unchanged
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            required: false,
            fallbacks: Vec::new(),
            transform: None,
            validate: None,
            on_fail: OnFail::default(),
            default: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn fallback(mut self, source_field: impl Into<String>) -> Self {
        self.fallbacks.push(source_field.into());
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: TransformKind) -> Self {
        self.transform = Some(transform);
        self
    }

    #[must_use]
    pub fn validate(mut self, validate: ValidationKind) -> Self {
        self.validate = Some(validate);
        self
    }

    #[must_use]
    pub fn on_fail(mut self, on_fail: OnFail) -> Self {
        self.on_fail = on_fail;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Read this rule's source value, trying fallbacks in order
    #[must_use]
    pub fn read<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        std::iter::once(&self.source_field)
            .chain(self.fallbacks.iter())
            .find_map(|path| get_path(record, path))
    }

    /// Validate and transform one source value.
    ///
    /// A null value is handled first and never reaches the transform's error
    /// path or the validator. Otherwise the transform runs, then the
    /// validator runs on the transformed value. A failure at either stage is
    /// settled by `on_fail`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FieldRejected`] when the rule fails and its
    /// policy is [`OnFail::Error`].
    pub fn validate_and_transform(
        &self,
        source_value: Option<&Value>,
        functions: &FunctionRegistry,
    ) -> crate::Result<FieldOutcome> {
        let Some(raw) = source_value.filter(|value| !value.is_null()) else {
            return self.absent(functions);
        };

        let mut value = raw.clone();
        if let Some(transform) = &self.transform {
            match apply_transform(raw, transform, functions) {
                Ok(transformed) => value = transformed,
                Err(e) => {
                    let message = format!("Transform failed for '{}': {e}", self.source_field);
                    return self.fail(raw, value, message);
                }
            }
        }

        if let Some(check) = &self.validate {
            let message = match apply_validation(&value, check, functions) {
                Ok(true) => None,
                Ok(false) => Some(format!("Validation failed for '{}'", self.source_field)),
                Err(e) => Some(format!("Validation failed for '{}': {e}", self.source_field)),
            };
            if let Some(message) = message {
                return self.fail(raw, value, message);
            }
        }

        trace!(field = %self.source_field, "field mapped");
        Ok(FieldOutcome::valid(value))
    }

    fn absent(&self, functions: &FunctionRegistry) -> crate::Result<FieldOutcome> {
        if self.required {
            let message = format!("Required field '{}' is missing", self.source_field);
            return match (self.on_fail, &self.default) {
                (OnFail::Error, _) => {
                    Err(crate::Error::field_rejected(&self.source_field, message))
                }
                (OnFail::Default, Some(default)) => Ok(FieldOutcome::valid(default.clone())),
                _ => Ok(FieldOutcome::invalid(Value::Null, message)),
            };
        }

        // A transform may supply its own value for absent input.
        let value = self
            .transform
            .as_ref()
            .and_then(|transform| apply_transform(&Value::Null, transform, functions).ok())
            .unwrap_or(Value::Null);
        Ok(FieldOutcome::valid(value))
    }

    fn fail(&self, raw: &Value, value: Value, message: String) -> crate::Result<FieldOutcome> {
        debug!(field = %self.source_field, policy = ?self.on_fail, %message, "field rule failed");
        match self.on_fail {
            OnFail::Error => Err(crate::Error::field_rejected(&self.source_field, message)),
            OnFail::Default => Ok(FieldOutcome::valid(
                self.default.clone().unwrap_or(Value::Null),
            )),
            OnFail::Transform => Ok(FieldOutcome::invalid(
                Value::String(stringify(raw)),
                message,
            )),
            OnFail::Warning | OnFail::Skip => Ok(FieldOutcome::invalid(value, message)),
        }
    }
}

/// Rules for one entity kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRule {
    pub source_kind: EntityKind,
    pub target_kind: TargetKind,
    #[serde(default)]
    pub fields: Vec<FieldRule>,
    #[serde(default)]
    pub custom_fields_enabled: bool,
}

impl EntityRule {
    /// Create a rule set targeting the kind's default qTest kind
    #[must_use]
    pub fn new(source_kind: EntityKind) -> Self {
        Self {
            source_kind,
            target_kind: source_kind.default_target(),
            fields: Vec::new(),
            custom_fields_enabled: false,
        }
    }

    #[must_use]
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    #[must_use]
    pub fn with_custom_fields(mut self) -> Self {
        self.custom_fields_enabled = true;
        self
    }

    /// Find the rule writing `target_field`
    #[must_use]
    pub fn rule_for_target(&self, target_field: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.target_field == target_field)
    }
}

/// A document of entity rules, as stored in an override file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub rules: Vec<EntityRule>,
}

/// Reader and writer for rule documents
pub struct RuleDsl;

impl RuleDsl {
    /// Parse a rule set from YAML
    ///
    /// # Errors
    ///
    /// Returns an error when YAML parsing fails.
    pub fn parse(yaml: &str) -> crate::Result<RuleSet> {
        serde_yaml::from_str(yaml).map_err(|e| {
            let location = e
                .location()
                .map(|l| format!(" at line {}, column {}", l.line(), l.column()))
                .unwrap_or_default();
            crate::Error::Parse(format!("Failed to parse rules: {e}{location}"))
        })
    }

    /// Parse a rule set from a file
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn parse_file(path: &std::path::Path) -> crate::Result<RuleSet> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Parse(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Serialize a rule set to YAML
    ///
    /// # Errors
    ///
    /// Returns an error when serialization fails.
    pub fn to_yaml(rules: &RuleSet) -> crate::Result<String> {
        serde_yaml::to_string(rules)
            .map_err(|e| crate::Error::Parse(format!("Failed to serialize rules: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn functions() -> FunctionRegistry {
        FunctionRegistry::with_builtins()
    }

    #[test]
    fn test_required_missing_with_error_policy_raises() {
        let rule = FieldRule::new("name", "name").required().on_fail(OnFail::Error);
        let err = rule.validate_and_transform(None, &functions()).unwrap_err();
        assert_eq!(
            err,
            crate::Error::field_rejected("name", "Required field 'name' is missing")
        );
        assert!(rule
            .validate_and_transform(Some(&Value::Null), &functions())
            .is_err());
    }

    #[test]
    fn test_required_missing_with_default_policy_substitutes() {
        let rule = FieldRule::new("name", "name")
            .required()
            .on_fail(OnFail::Default)
            .default_value(json!("Untitled"));
        let outcome = rule.validate_and_transform(None, &functions()).unwrap();
        assert_eq!(outcome, FieldOutcome::valid(json!("Untitled")));
    }

    #[test]
    fn test_required_missing_with_warning_policy_reports() {
        let rule = FieldRule::new("name", "name").required();
        let outcome = rule.validate_and_transform(None, &functions()).unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.value, Value::Null);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Required field 'name' is missing")
        );

        let no_default = FieldRule::new("name", "name").required().on_fail(OnFail::Default);
        assert!(!no_default.validate_and_transform(None, &functions()).unwrap().is_valid);
    }

    #[test]
    fn test_optional_missing_runs_transform_for_its_default() {
        let rule = FieldRule::new("priority", "priority_id").transform(TransformKind::PriorityId);
        let outcome = rule.validate_and_transform(None, &functions()).unwrap();
        assert_eq!(outcome, FieldOutcome::valid(json!(3)));

        // A transform that cannot handle null leaves the value null.
        let rule = FieldRule::new("x", "x").transform(TransformKind::Custom {
            name: "missing".to_string(),
        });
        let outcome = rule.validate_and_transform(None, &functions()).unwrap();
        assert_eq!(outcome, FieldOutcome::valid(Value::Null));
    }

    #[test]
    fn test_optional_missing_skips_validation() {
        let rule = FieldRule::new("x", "x").validate(ValidationKind::NotEmpty);
        let outcome = rule.validate_and_transform(None, &functions()).unwrap();
        assert!(outcome.is_valid);
    }

    #[test]
    fn test_transform_failure_policies() {
        let base = FieldRule::new("priority", "priority_id").transform(TransformKind::PriorityId);
        let raw = json!("Urgent-ish");

        let err = base
            .clone()
            .on_fail(OnFail::Error)
            .validate_and_transform(Some(&raw), &functions())
            .unwrap_err();
        assert!(err.to_string().contains("Transform failed for 'priority'"));

        let outcome = base
            .clone()
            .on_fail(OnFail::Default)
            .default_value(json!(3))
            .validate_and_transform(Some(&raw), &functions())
            .unwrap();
        assert_eq!(outcome, FieldOutcome::valid(json!(3)));

        let outcome = base
            .clone()
            .validate_and_transform(Some(&raw), &functions())
            .unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.value, raw);
        assert!(outcome.error.unwrap().starts_with("Transform failed for 'priority'"));

        let outcome = base
            .on_fail(OnFail::Transform)
            .validate_and_transform(Some(&json!(["a"])), &functions())
            .unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.value, json!("[\"a\"]"));
    }

    #[test]
    fn test_validation_runs_on_transformed_value() {
        let rule = FieldRule::new("name", "name")
            .transform(TransformKind::Trim)
            .validate(ValidationKind::NotEmpty)
            .on_fail(OnFail::Skip);
        let outcome = rule
            .validate_and_transform(Some(&json!("   ")), &functions())
            .unwrap();
        assert!(!outcome.is_valid);
        assert_eq!(outcome.error.as_deref(), Some("Validation failed for 'name'"));

        let outcome = rule
            .validate_and_transform(Some(&json!("  Login ")), &functions())
            .unwrap();
        assert_eq!(outcome, FieldOutcome::valid(json!("Login")));
    }

    #[test]
    fn test_validator_error_counts_as_failure() {
        let rule = FieldRule::new("size", "size")
            .validate(ValidationKind::Custom {
                name: "non_negative".to_string(),
            })
            .on_fail(OnFail::Error);
        let err = rule
            .validate_and_transform(Some(&json!("big")), &functions())
            .unwrap_err();
        assert!(err.to_string().contains("Validation failed for 'size'"));
    }

    #[test]
    fn test_read_uses_fallbacks_in_order() {
        let rule = FieldRule::new("expectedResult", "expected")
            .fallback("expected_result")
            .fallback("inline.expectedResult");
        let record = json!({"expectedResult": null, "inline": {"expectedResult": "shown"}});
        assert_eq!(rule.read(record.as_object().unwrap()), Some(&json!("shown")));
    }

    #[test]
    fn test_parse_rule_set() {
        let yaml = r"
rules:
  - source_kind: folder
    target_kind: QTestModule
    fields:
      - source_field: name
        target_field: name
        required: true
        on_fail: error
        transform:
          op: chain
          transforms:
            - op: trim
            - op: custom
              name: collapse_whitespace
      - source_field: labels
        target_field: tags
        transform:
          op: list_join
";
        let set = RuleDsl::parse(yaml).unwrap();
        assert_eq!(set.rules.len(), 1);
        let rule = &set.rules[0];
        assert_eq!(rule.source_kind, EntityKind::Folder);
        assert!(!rule.custom_fields_enabled);
        assert_eq!(rule.fields[0].on_fail, OnFail::Error);
        assert_eq!(
            rule.fields[1].transform,
            Some(TransformKind::ListJoin {
                separator: ", ".to_string()
            })
        );
        assert_eq!(rule.fields[1].on_fail, OnFail::Warning);

        let yaml_out = RuleDsl::to_yaml(&set).unwrap();
        assert_eq!(RuleDsl::parse(&yaml_out).unwrap(), set);
    }

    #[test]
    fn test_parse_error_reports_location() {
        let err = RuleDsl::parse("rules:\n  - source_kind: galaxy\n").unwrap_err();
        assert!(matches!(err, crate::Error::Parse(_)));
        assert!(err.to_string().contains("line"));
    }
}
