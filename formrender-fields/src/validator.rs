//! Rule evaluation for field values.
//!
//! Failures are data, never errors: every call produces a
//! [`ValidationResult`]. Rules run in order and the first failing rule wins.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::template::stringify;
use crate::types::{Context, Rule, ValidatorFn};

const REQUIRED_MESSAGE: &str = "This field is required";
const PATTERN_MESSAGE: &str = "Invalid format";
const CUSTOM_MESSAGE: &str = "Custom validation failed";

/// Outcome of validating one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message.into()),
        }
    }
}

/// Per-field results, in the order the rules map listed the fields.
pub type ValidationReport = IndexMap<String, ValidationResult>;

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `value` against `rules`. `None` stands for a value that was
    /// never set.
    pub async fn validate(
        &self,
        value: Option<&Value>,
        rules: &[Rule],
        context: &Context,
    ) -> ValidationResult {
        for rule in rules {
            if let Some(condition) = &rule.condition {
                if !condition.call(context) {
                    continue;
                }
            }
            let result = self.validate_rule(value, rule, context).await;
            if !result.is_valid {
                return result;
            }
        }
        ValidationResult::valid()
    }

    async fn validate_rule(
        &self,
        value: Option<&Value>,
        rule: &Rule,
        context: &Context,
    ) -> ValidationResult {
        let message = |fallback: String| rule.message.clone().unwrap_or(fallback);

        if rule.required && is_empty(value) {
            return ValidationResult::invalid(message(REQUIRED_MESSAGE.to_string()));
        }

        if let (Some(pattern), Some(v)) = (&rule.pattern, present(value)) {
            if !pattern.is_match(&stringify(v)) {
                return ValidationResult::invalid(message(PATTERN_MESSAGE.to_string()));
            }
        }

        if let Some(min) = rule.min {
            match measure(value) {
                Some(Measure::Length(len)) if (len as f64) < min => {
                    return ValidationResult::invalid(message(format!(
                        "Length must be at least {}",
                        format_bound(min)
                    )));
                }
                Some(Measure::Number(n)) if n < min => {
                    return ValidationResult::invalid(message(format!(
                        "Value must be at least {}",
                        format_bound(min)
                    )));
                }
                _ => {}
            }
        }

        if let Some(max) = rule.max {
            match measure(value) {
                Some(Measure::Length(len)) if (len as f64) > max => {
                    return ValidationResult::invalid(message(format!(
                        "Length must not exceed {}",
                        format_bound(max)
                    )));
                }
                Some(Measure::Number(n)) if n > max => {
                    return ValidationResult::invalid(message(format!(
                        "Value must not exceed {}",
                        format_bound(max)
                    )));
                }
                _ => {}
            }
        }

        if let Some(validator) = &rule.validator {
            let target = value.cloned().unwrap_or(Value::Null);
            let outcome = match validator {
                ValidatorFn::Sync(f) => f(&target, context),
                ValidatorFn::Async(f) => f(target, context.clone()).await,
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => return ValidationResult::invalid(message(CUSTOM_MESSAGE.to_string())),
                Err(error) => {
                    return ValidationResult::invalid(message(format!(
                        "Validation error: {error}"
                    )));
                }
            }
        }

        ValidationResult::valid()
    }

    /// Validate each field named in `rules`, reading its value from `values`.
    pub async fn validate_fields(
        &self,
        values: &Map<String, Value>,
        rules: &IndexMap<String, Vec<Rule>>,
        context: &Context,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();
        for (name, field_rules) in rules {
            let result = self.validate(values.get(name), field_rules, context).await;
            report.insert(name.clone(), result);
        }
        report
    }

    pub fn has_errors(report: &ValidationReport) -> bool {
        report.values().any(|result| !result.is_valid)
    }

    pub fn get_all_error_messages(report: &ValidationReport) -> Vec<String> {
        report
            .values()
            .filter(|result| !result.is_valid)
            .filter_map(|result| result.error_message.clone())
            .collect()
    }
}

enum Measure {
    Length(usize),
    Number(f64),
}

fn measure(value: Option<&Value>) -> Option<Measure> {
    match value? {
        Value::String(s) => Some(Measure::Length(s.chars().count())),
        Value::Array(items) => Some(Measure::Length(items.len())),
        Value::Number(n) => n.as_f64().map(Measure::Number),
        _ => None,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 && bound.is_finite() {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}
