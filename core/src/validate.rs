//! Declarative flag validation.
//!
//! A [`Validator`] is a rule plus an optional custom message template. Rules
//! run against the flag's current [`Value`] after parsing, so an unset flag is
//! checked against its default.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{Validator, Value};
//!
//! let rule = Validator::range(1.0, 10.0);
//! assert!(rule.validate(&Value::Int(5)).is_ok());
//!
//! let err = rule.validate(&Value::Int(15)).unwrap_err().with_field("count");
//! assert_eq!(err.to_string(), "count: must be between 1 and 10");
//!
//! let custom = Validator::gt(0.0).with_message("custom %v");
//! let err = custom.validate(&Value::Int(0)).unwrap_err().with_field("n");
//! assert_eq!(err.to_string(), "n: custom 0");
//! ```

mod rules;
mod tags;
pub mod template;

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use thiserror::Error;

pub use rules::Expected;
pub use tags::parse_tags;
pub use template::Arg;

use crate::types::Value;
use rules::{Failure, Rule};

/// A single flag that failed one of its rules.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {}", template::render(.template, .args))]
pub struct ValidationError {
    field: String,
    template: String,
    args: Vec<Arg>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, template: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            field: field.into(),
            template: template.into(),
            args,
        }
    }

    /// Attaches the name of the flag the error belongs to.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// The rendered message without the field prefix.
    pub fn message(&self) -> String {
        template::render(&self.template, &self.args)
    }
}

/// Every flag that failed validation in one pass, at most one entry per flag.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Returns `None` when nothing failed.
    pub(crate) fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() { None } else { Some(Self(errors)) }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Names of the failed flags, in validation order.
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(ValidationError::field).collect()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A validation rule attached to a flag.
///
/// Validators are plain values: cloning one and customizing the clone with
/// [`with_message`](Self::with_message) leaves the original untouched.
#[derive(Debug, Clone)]
pub struct Validator {
    rule: Rule,
    message: Option<String>,
}

impl Validator {
    fn from_rule(rule: Rule) -> Self {
        Self {
            rule,
            message: None,
        }
    }

    /// Rejects zero values: `0`, `""`, empty slices and slices holding a zero
    /// element. A scalar `bool` always passes.
    pub fn required() -> Self {
        Self::from_rule(Rule::Required)
    }

    /// Inclusive numeric bounds. Strings are read as numbers.
    pub fn range(min: f64, max: f64) -> Self {
        Self::from_rule(Rule::Range { min, max })
    }

    /// Exact length in characters (strings) or digits (numeric slices).
    pub fn len(n: usize) -> Self {
        Self::from_rule(Rule::Len(n))
    }

    /// Strings must match `pattern`. An invalid pattern matches everything.
    pub fn pattern(pattern: &str) -> Self {
        Self::from_rule(Rule::Pattern {
            source: pattern.to_string(),
            regex: Regex::new(pattern).ok(),
        })
    }

    /// The value (or every slice element) must be one of `allowed`.
    pub fn one_of<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_rule(Rule::OneOf(allowed.into_iter().map(Into::into).collect()))
    }

    pub fn eq(expected: impl Into<Expected>) -> Self {
        Self::from_rule(Rule::Eq(expected.into()))
    }

    /// Numbers (or every numeric slice element) must be strictly greater.
    pub fn gt(bound: f64) -> Self {
        Self::from_rule(Rule::Gt(bound))
    }

    /// Numbers (or every numeric slice element) must be strictly less.
    pub fn lt(bound: f64) -> Self {
        Self::from_rule(Rule::Lt(bound))
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Self::from_rule(Rule::Contains(needle.into()))
    }

    pub fn alpha() -> Self {
        Self::from_rule(Rule::Alpha)
    }

    pub fn alphanum() -> Self {
        Self::from_rule(Rule::Alphanum)
    }

    /// Rejects anything that is not a string (or slice of strings) shaped
    /// like an email address.
    pub fn email() -> Self {
        Self::from_rule(Rule::Email)
    }

    /// Rejects anything that is not a string (or slice of strings) with a
    /// scheme and a host.
    pub fn url() -> Self {
        Self::from_rule(Rule::Url)
    }

    /// A caller-supplied check; its error string becomes the message.
    pub fn custom(check: impl Fn(&Value) -> Result<(), String> + 'static) -> Self {
        Self::from_rule(Rule::Custom(Rc::new(check)))
    }

    /// Replaces the default message template. An empty template restores it.
    pub fn with_message(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        self.message = (!template.is_empty()).then_some(template);
        self
    }

    /// Checks `value`. The returned error has an empty field name; the flag
    /// registry fills it in.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        match self.rule.check(value) {
            Ok(()) => Ok(()),
            Err(Failure::Args(args)) => {
                let template = match &self.message {
                    Some(message) => message.clone(),
                    None => self.rule.default_template().into_owned(),
                };
                Err(ValidationError::new("", template, args))
            }
            Err(Failure::Message(message)) => {
                Err(ValidationError::new("", self.message.clone().unwrap_or(message), Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_renders_args() {
        let err = Validator::one_of(["a", "b"])
            .validate(&Value::Str("c".into()))
            .unwrap_err()
            .with_field("mode");
        assert_eq!(err.to_string(), "mode: must be one of a,b");
    }

    #[test]
    fn test_with_message_does_not_touch_original() {
        let base = Validator::required();
        let custom = base.clone().with_message("name please");
        let value = Value::Str(String::new());
        assert_eq!(base.validate(&value).unwrap_err().message(), "field is required");
        assert_eq!(custom.validate(&value).unwrap_err().message(), "name please");
    }

    #[test]
    fn test_message_placeholder_mismatch_is_left_raw() {
        let err = Validator::contains("x")
            .with_message("needs %v and %v")
            .validate(&Value::Str("abc".into()))
            .unwrap_err();
        assert_eq!(err.message(), "needs %v and %v");
    }

    #[test]
    fn test_eq_reports_expected_value() {
        let err = Validator::eq("prod")
            .validate(&Value::Str("dev".into()))
            .unwrap_err();
        assert_eq!(err.message(), "must equal 'prod'");
    }

    #[test]
    fn test_custom_validator_message() {
        let even = Validator::custom(|v| match v {
            Value::Int(i) if i % 2 != 0 => Err(format!("{i} is odd")),
            _ => Ok(()),
        });
        assert!(even.validate(&Value::Int(4)).is_ok());
        let err = even.validate(&Value::Int(3)).unwrap_err().with_field("n");
        assert_eq!(err.to_string(), "n: 3 is odd");
    }

    #[test]
    fn test_validation_errors_one_per_line() {
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::new("a", "field is required", Vec::new()),
            ValidationError::new("b", "must be less than %v", vec![Arg::Str("3".into())]),
        ])
        .unwrap();
        assert_eq!(errors.to_string(), "a: field is required\nb: must be less than 3");
        assert_eq!(errors.fields(), vec!["a", "b"]);
        assert!(ValidationErrors::from_vec(Vec::new()).is_none());
    }
}
