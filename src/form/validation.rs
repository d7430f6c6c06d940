use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::form::component::ComponentType;
use crate::form::value::{FormModel, FormValue};

/// Declarative type hint for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// A single validation rule attached to a schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,
    /// Minimum length (strings, lists) or value (numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum length (strings, lists) or value (numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Rule {
    pub fn required(message: impl Into<String>) -> Self {
        Rule {
            required: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn max_len(max: usize) -> Self {
        Rule {
            max: Some(max as f64),
            message: Some(format!("must be shorter than {} characters", max)),
            ..Default::default()
        }
    }

    pub fn pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Rule {
            pattern: Some(pattern.into()),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Rules for one field, with type hints already derived from the component.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRules {
    pub field: String,
    pub label: String,
    pub component: ComponentType,
    pub rules: Vec<Rule>,
}

/// Per-field failure report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

/// The validation capability a form instance is bound to.
///
/// `names` restricts validation to those fields; `None` validates all.
/// On success returns the validated fields' current values.
pub trait FormValidator {
    fn validate(
        &mut self,
        fields: &[FieldRules],
        model: &FormModel,
        names: Option<&[String]>,
    ) -> Result<FormModel, ValidationErrors>;

    fn clear(&mut self, names: Option<&[String]>);

    /// Current failure messages for a field.
    fn errors_for(&self, _field: &str) -> Vec<String> {
        Vec::new()
    }
}

// ============================================================================
// Built-in rule validator
// ============================================================================

/// Validator that evaluates `Rule`s directly and remembers per-field failures.
#[derive(Debug, Default)]
pub struct RuleValidator {
    errors: BTreeMap<String, Vec<String>>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl FormValidator for RuleValidator {
    fn validate(
        &mut self,
        fields: &[FieldRules],
        model: &FormModel,
        names: Option<&[String]>,
    ) -> Result<FormModel, ValidationErrors> {
        let mut values = FormModel::new();
        let mut failures = Vec::new();

        for spec in fields {
            if let Some(names) = names {
                if !names.iter().any(|n| n == &spec.field) {
                    continue;
                }
            }

            let value = model.get(&spec.field).cloned().unwrap_or_default();
            let messages: Vec<String> = spec
                .rules
                .iter()
                .filter_map(|rule| check_rule(rule, &spec.label, &value))
                .collect();

            if messages.is_empty() {
                self.errors.remove(&spec.field);
            } else {
                self.errors.insert(spec.field.clone(), messages.clone());
                failures.push(FieldError {
                    field: spec.field.clone(),
                    messages,
                });
            }

            if let Some(v) = model.get(&spec.field) {
                values.insert(spec.field.clone(), v.clone());
            }
        }

        if failures.is_empty() {
            Ok(values)
        } else {
            Err(ValidationErrors { errors: failures })
        }
    }

    fn clear(&mut self, names: Option<&[String]>) {
        match names {
            Some(names) => {
                for name in names {
                    self.errors.remove(name);
                }
            }
            None => self.errors.clear(),
        }
    }

    fn errors_for(&self, field: &str) -> Vec<String> {
        self.errors.get(field).cloned().unwrap_or_default()
    }
}

fn is_empty_value(value: &FormValue) -> bool {
    match value {
        FormValue::Null => true,
        FormValue::String(s) => s.trim().is_empty(),
        FormValue::List(items) => items.is_empty(),
        _ => false,
    }
}

fn check_rule(rule: &Rule, label: &str, value: &FormValue) -> Option<String> {
    let fail = |fallback: String| Some(rule.message.clone().unwrap_or(fallback));

    if is_empty_value(value) {
        return if rule.required {
            fail(format!("{} is required", display_label(label)))
        } else {
            None
        };
    }

    if let Some(expected) = rule.rule_type {
        if !matches_type(expected, value) {
            return fail(format!("{} is not a valid {:?}", display_label(label), expected).to_lowercase());
        }
    }

    let measure = match value {
        FormValue::String(s) => Some(s.chars().count() as f64),
        FormValue::List(items) => Some(items.len() as f64),
        FormValue::Number(n) => n.as_f64(),
        _ => None,
    };
    if let Some(m) = measure {
        if rule.min.is_some_and(|min| m < min) || rule.max.is_some_and(|max| m > max) {
            return fail(format!("{} is out of range", display_label(label)));
        }
    }

    if let (Some(pattern), FormValue::String(s)) = (&rule.pattern, value) {
        match Regex::new(pattern) {
            Ok(re) if re.is_match(s) => {}
            Ok(_) => return fail(format!("{} has an invalid format", display_label(label))),
            Err(e) => {
                tracing::error!("invalid validation pattern '{}': {}", pattern, e);
                return fail(format!("{} has an invalid pattern rule", display_label(label)));
            }
        }
    }

    None
}

fn matches_type(expected: RuleType, value: &FormValue) -> bool {
    match expected {
        RuleType::String => matches!(value, FormValue::String(_)),
        RuleType::Number => matches!(value, FormValue::Number(_)),
        RuleType::Boolean => matches!(value, FormValue::Bool(_)),
        RuleType::Array => matches!(value, FormValue::List(_)),
        RuleType::Object => matches!(value, FormValue::Object(_) | FormValue::Date(_)),
    }
}

fn display_label(label: &str) -> &str {
    if label.is_empty() { "field" } else { label }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(field: &str, rules: Vec<Rule>) -> FieldRules {
        FieldRules {
            field: field.into(),
            label: field.into(),
            component: ComponentType::Input,
            rules,
        }
    }

    #[test]
    fn required_and_pattern() {
        let mut v = RuleValidator::new();
        let fields = vec![
            spec("name", vec![Rule::required("name please")]),
            spec("code", vec![Rule::pattern("^[A-Z]{3}$", "three capitals")]),
        ];

        let mut model = FormModel::new();
        model.insert("code".into(), "abc".into());

        let err = v.validate(&fields, &model, None).unwrap_err();
        assert_eq!(err.fields(), vec!["name", "code"]);
        assert_eq!(v.errors_for("name"), vec!["name please".to_string()]);

        model.insert("name".into(), "Ada".into());
        model.insert("code".into(), "ABC".into());
        let values = v.validate(&fields, &model, None).unwrap();
        assert_eq!(values.len(), 2);
        assert!(!v.has_errors());
    }

    #[test]
    fn restricted_to_names() {
        let mut v = RuleValidator::new();
        let fields = vec![
            spec("a", vec![Rule::required("a")]),
            spec("b", vec![Rule::required("b")]),
        ];
        let model = FormModel::new();
        let err = v.validate(&fields, &model, Some(&["b".to_string()])).unwrap_err();
        assert_eq!(err.fields(), vec!["b"]);
    }
}
