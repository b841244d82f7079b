//! Rule kinds and how each one inspects a [`Value`].
//!
//! Every check returns the template arguments of its failure. Numeric rules
//! read strings as numbers (unparsable text counts as `0`); slice rules check
//! every element and most of them reject an empty slice outright.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::template::Arg;
use crate::types::Value;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex must compile")
});

/// Expected value of an equality rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Expected {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Expected {
    fn as_f64(&self) -> f64 {
        match self {
            Self::Int(i) => *i as f64,
            Self::Float(x) => *x,
            Self::Bool(_) => 0.0,
            Self::Str(s) => s.trim().parse().unwrap_or(0.0),
        }
    }

    fn to_arg(&self) -> Arg {
        match self {
            Self::Int(i) => Arg::Int(*i),
            Self::Float(x) => Arg::Float(*x),
            Self::Bool(b) => Arg::Bool(*b),
            Self::Str(s) => Arg::Str(s.clone()),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_arg(), f)
    }
}

impl From<i64> for Expected {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Expected {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Expected {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Expected {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Expected {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Expected {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

pub(crate) type CustomFn = Rc<dyn Fn(&Value) -> Result<(), String>>;

#[derive(Clone)]
pub(crate) enum Rule {
    Required,
    Range { min: f64, max: f64 },
    Len(usize),
    Pattern { source: String, regex: Option<Regex> },
    OneOf(Vec<String>),
    Eq(Expected),
    Gt(f64),
    Lt(f64),
    Contains(String),
    Alpha,
    Alphanum,
    Email,
    Url,
    Custom(CustomFn),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("Required"),
            Self::Range { min, max } => f.debug_struct("Range").field("min", min).field("max", max).finish(),
            Self::Len(n) => f.debug_tuple("Len").field(n).finish(),
            Self::Pattern { source, .. } => f.debug_tuple("Pattern").field(source).finish(),
            Self::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Self::Eq(expected) => f.debug_tuple("Eq").field(expected).finish(),
            Self::Gt(x) => f.debug_tuple("Gt").field(x).finish(),
            Self::Lt(x) => f.debug_tuple("Lt").field(x).finish(),
            Self::Contains(s) => f.debug_tuple("Contains").field(s).finish(),
            Self::Alpha => f.write_str("Alpha"),
            Self::Alphanum => f.write_str("Alphanum"),
            Self::Email => f.write_str("Email"),
            Self::Url => f.write_str("Url"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Why a rule rejected a value.
pub(crate) enum Failure {
    /// Render the rule's template with these arguments.
    Args(Vec<Arg>),
    /// A custom check produced its own message.
    Message(String),
}

type Check = Result<(), Failure>;

fn fail(args: Vec<Arg>) -> Check {
    Err(Failure::Args(args))
}

impl Rule {
    pub(crate) fn default_template(&self) -> Cow<'static, str> {
        match self {
            Self::Required => "field is required".into(),
            Self::Range { .. } => "must be between %v and %v".into(),
            Self::Len(_) => "must be exactly %v".into(),
            Self::Pattern { .. } => "must match pattern '%v'".into(),
            Self::OneOf(allowed) => format!("must be one of {}", vec!["%v"; allowed.len()].join(",")).into(),
            Self::Eq(_) => "must equal '%v'".into(),
            Self::Gt(_) => "must be greater than %v".into(),
            Self::Lt(_) => "must be less than %v".into(),
            Self::Contains(_) => "must contain '%v'".into(),
            Self::Alpha => "must contain only alphabetic characters".into(),
            Self::Alphanum => "must contain only alphanumeric characters".into(),
            Self::Email => "must be a valid email address".into(),
            Self::Url => "must be a valid URL".into(),
            Self::Custom(_) => "invalid value".into(),
        }
    }

    pub(crate) fn check(&self, value: &Value) -> Check {
        match self {
            Self::Required => required(value),
            Self::Range { min, max } => range(value, *min, *max),
            Self::Len(n) => len(value, *n),
            Self::Pattern { source, regex } => match (regex, value) {
                (Some(re), Value::Str(s)) if !re.is_match(s) => fail(vec![Arg::Str(source.clone())]),
                _ => Ok(()),
            },
            Self::OneOf(allowed) => one_of(value, allowed),
            Self::Eq(expected) => eq(value, expected),
            Self::Gt(x) => gt(value, *x),
            Self::Lt(x) => lt(value, *x),
            Self::Contains(needle) => match value {
                Value::Str(s) if !s.contains(needle.as_str()) => fail(vec![Arg::Str(needle.clone())]),
                _ => Ok(()),
            },
            Self::Alpha => charset(value, |c| c.is_ascii_alphabetic()),
            Self::Alphanum => charset(value, |c| c.is_ascii_alphanumeric()),
            Self::Email => text_format(value, |s| EMAIL.is_match(s)),
            Self::Url => text_format(value, is_url),
            Self::Custom(check) => (check.as_ref())(value).map_err(Failure::Message),
        }
    }
}

/// Scalar numeric view of a value; `None` for bools and slices.
fn scalar_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Uint(u) => Some(*u as f64),
        Value::Float(x) => Some(*x),
        Value::Str(s) => Some(str_f64(s)),
        _ => None,
    }
}

fn str_f64(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

/// Numeric slice view; strings are only read as numbers when `strings` is set.
fn list_f64(value: &Value, strings: bool) -> Option<Vec<f64>> {
    match value {
        Value::Ints(v) => Some(v.iter().map(|i| *i as f64).collect()),
        Value::Uints(v) => Some(v.iter().map(|u| *u as f64).collect()),
        Value::Floats(v) => Some(v.clone()),
        Value::Strs(v) if strings => Some(v.iter().map(|s| str_f64(s)).collect()),
        _ => None,
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Int(_) | Value::Uint(_) | Value::Float(_))
}

fn required(value: &Value) -> Check {
    let missing = match value {
        Value::Bool(_) => false,
        Value::Int(i) => *i == 0,
        Value::Uint(u) => *u == 0,
        Value::Float(x) => *x == 0.0,
        Value::Str(s) => s.is_empty(),
        Value::Bools(v) => v.is_empty(),
        Value::Ints(v) => v.is_empty() || v.contains(&0),
        Value::Uints(v) => v.is_empty() || v.contains(&0),
        Value::Floats(v) => v.is_empty() || v.contains(&0.0),
        Value::Strs(v) => v.is_empty() || v.iter().any(String::is_empty),
    };
    if missing { fail(Vec::new()) } else { Ok(()) }
}

fn range(value: &Value, min: f64, max: f64) -> Check {
    let outside = |x: f64| x < min || x > max;
    let args = || vec![Arg::Float(min), Arg::Float(max)];

    if let Some(x) = scalar_f64(value) {
        return if outside(x) { fail(args()) } else { Ok(()) };
    }
    match list_f64(value, true) {
        Some(items) if items.is_empty() || items.iter().any(|x| outside(*x)) => fail(args()),
        _ => Ok(()),
    }
}

fn len(value: &Value, n: usize) -> Check {
    let chars = || vec![Arg::Str(format!("{n} characters"))];
    let digits = || vec![Arg::Str(format!("{n} digits"))];

    match value {
        Value::Str(s) if s.chars().count() != n => fail(chars()),
        Value::Strs(v) if v.iter().any(|s| s.chars().count() != n) => fail(chars()),
        Value::Ints(v) if v.is_empty() || v.iter().any(|i| i.to_string().len() != n) => fail(digits()),
        Value::Uints(v) if v.is_empty() || v.iter().any(|u| u.to_string().len() != n) => fail(digits()),
        Value::Floats(v) if v.is_empty() || v.iter().any(|x| format!("{x:.6}").len() != n) => fail(digits()),
        _ => Ok(()),
    }
}

fn one_of(value: &Value, allowed: &[String]) -> Check {
    let args = || allowed.iter().cloned().map(Arg::Str).collect::<Vec<_>>();
    let has_str = |s: &str| allowed.iter().any(|a| a == s);
    let has_int = |i: i64| allowed.iter().any(|a| a.parse::<i64>() == Ok(i));
    let has_uint = |u: u64| allowed.iter().any(|a| a.parse::<u64>() == Ok(u));
    let has_float = |x: f64| allowed.iter().any(|a| a.parse::<f64>() == Ok(x));

    let ok = match value {
        Value::Str(s) => has_str(s),
        Value::Int(i) => has_int(*i),
        Value::Uint(u) => has_uint(*u),
        Value::Float(x) => has_float(*x),
        Value::Strs(v) => !allowed.is_empty() && v.iter().all(|s| has_str(s)),
        Value::Ints(v) => !allowed.is_empty() && !v.is_empty() && v.iter().all(|i| has_int(*i)),
        Value::Uints(v) => !allowed.is_empty() && !v.is_empty() && v.iter().all(|u| has_uint(*u)),
        Value::Floats(v) => !allowed.is_empty() && !v.is_empty() && v.iter().all(|x| has_float(*x)),
        Value::Bool(_) | Value::Bools(_) => true,
    };
    if ok { Ok(()) } else { fail(args()) }
}

fn eq(value: &Value, expected: &Expected) -> Check {
    let args = || vec![expected.to_arg()];
    let want = expected.as_f64();

    let ok = match (value, expected) {
        (Value::Str(s), Expected::Str(e)) => s == e,
        (Value::Str(_), _) => true,
        (Value::Bool(b), Expected::Bool(e)) => b == e,
        (Value::Bool(_), _) => true,
        (Value::Int(_) | Value::Uint(_) | Value::Float(_), _) => scalar_f64(value) == Some(want),
        (Value::Strs(v), _) => {
            let text = expected.to_string();
            !v.is_empty() && v.iter().all(|s| *s == text)
        }
        (Value::Bools(v), Expected::Bool(e)) => !v.is_empty() && v.iter().all(|b| b == e),
        (Value::Bools(_), _) => false,
        (Value::Ints(_) | Value::Uints(_) | Value::Floats(_), _) => list_f64(value, false)
            .is_some_and(|items| !items.is_empty() && items.iter().all(|x| *x == want)),
    };
    if ok { Ok(()) } else { fail(args()) }
}

fn gt(value: &Value, bound: f64) -> Check {
    let args = || vec![Arg::Float(bound)];
    if is_number(value) {
        return match scalar_f64(value) {
            Some(x) if x <= bound => fail(args()),
            _ => Ok(()),
        };
    }
    match list_f64(value, false) {
        Some(items) if items.is_empty() || items.iter().any(|x| *x <= bound) => fail(args()),
        _ => Ok(()),
    }
}

fn lt(value: &Value, bound: f64) -> Check {
    let int_args = || vec![Arg::Str(format!("{bound:.0}"))];
    let float_args = || vec![Arg::Str(format!("{bound:.2}"))];

    match value {
        Value::Int(i) if *i as f64 >= bound => fail(int_args()),
        Value::Uint(u) if *u as f64 >= bound => fail(int_args()),
        Value::Float(x) if *x >= bound => fail(float_args()),
        Value::Ints(v) if v.iter().any(|i| *i as f64 >= bound) => fail(int_args()),
        Value::Uints(v) if v.iter().any(|u| *u as f64 >= bound) => fail(int_args()),
        Value::Floats(v) if v.is_empty() => fail(vec![Arg::Str(format!("{bound:.0} items"))]),
        Value::Floats(v) if v.iter().any(|x| *x >= bound) => fail(float_args()),
        _ => Ok(()),
    }
}

fn charset(value: &Value, allowed: fn(char) -> bool) -> Check {
    let matches = |s: &str| !s.is_empty() && s.chars().all(allowed);
    match value {
        Value::Str(s) if !matches(s) => fail(Vec::new()),
        Value::Strs(v) if v.is_empty() => fail(vec![Arg::List(Vec::new())]),
        Value::Strs(v) => match v.iter().find(|s| !matches(s)) {
            Some(bad) => fail(vec![Arg::Str(bad.clone())]),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// An absolute URL with a scheme and a non-empty host.
fn is_url(s: &str) -> bool {
    Url::parse(s).is_ok_and(|url| {
        !url.scheme().is_empty() && url.host_str().is_some_and(|host| !host.is_empty())
    })
}

/// Email and URL checks: strings only, every other kind of value fails.
fn text_format(value: &Value, valid: impl Fn(&str) -> bool) -> Check {
    match value {
        Value::Str(s) if valid(s) => Ok(()),
        Value::Strs(v) if v.is_empty() => fail(Vec::new()),
        Value::Strs(v) => match v.iter().find(|s| !valid(s)) {
            Some(bad) => fail(vec![Arg::Str(bad.clone())]),
            None => Ok(()),
        },
        _ => fail(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passes(rule: &Rule, value: Value) -> bool {
        rule.check(&value).is_ok()
    }

    #[test]
    fn test_required_zero_values() {
        let rule = Rule::Required;
        assert!(!passes(&rule, Value::Str(String::new())));
        assert!(!passes(&rule, Value::Int(0)));
        assert!(!passes(&rule, Value::Float(0.0)));
        assert!(passes(&rule, Value::Bool(false)));
        assert!(!passes(&rule, Value::Strs(vec!["a".into(), String::new()])));
        assert!(!passes(&rule, Value::Uints(Vec::new())));
        assert!(passes(&rule, Value::Uints(vec![3])));
    }

    #[test]
    fn test_range_reads_strings_as_numbers() {
        let rule = Rule::Range { min: 1.0, max: 10.0 };
        assert!(passes(&rule, Value::Str("5".into())));
        assert!(!passes(&rule, Value::Str("abc".into())));
        assert!(passes(&rule, Value::Ints(vec![1, 10])));
        assert!(!passes(&rule, Value::Ints(Vec::new())));
        assert!(passes(&rule, Value::Bool(true)));
    }

    #[test]
    fn test_len_counts_characters_and_digits() {
        assert!(passes(&Rule::Len(5), Value::Str("héllo".into())));
        assert!(!passes(&Rule::Len(5), Value::Strs(vec!["hello".into(), "hi".into()])));
        assert!(passes(&Rule::Len(3), Value::Ints(vec![123, 456])));
        assert!(!passes(&Rule::Len(3), Value::Ints(vec![123, 12])));
        assert!(passes(&Rule::Len(9), Value::Floats(vec![12.3456])));
        assert!(passes(&Rule::Len(3), Value::Int(12345)));
    }

    #[test]
    fn test_one_of_numeric_and_string() {
        let rule = Rule::OneOf(vec!["1".into(), "2".into(), "red".into()]);
        assert!(passes(&rule, Value::Int(2)));
        assert!(!passes(&rule, Value::Int(3)));
        assert!(passes(&rule, Value::Str("red".into())));
        assert!(passes(&rule, Value::Strs(Vec::new())));
        assert!(!passes(&rule, Value::Ints(Vec::new())));
        assert_eq!(rule.default_template(), "must be one of %v,%v,%v");
    }

    #[test]
    fn test_eq_compares_numerically() {
        let rule = Rule::Eq(Expected::Int(10));
        assert!(passes(&rule, Value::Int(10)));
        assert!(passes(&rule, Value::Float(10.0)));
        assert!(!passes(&rule, Value::Float(10.5)));
        assert!(!passes(&rule, Value::Uints(Vec::new())));

        let rule = Rule::Eq(Expected::Str("hello".into()));
        assert!(passes(&rule, Value::Str("hello".into())));
        assert!(!passes(&rule, Value::Str("world".into())));
    }

    #[test]
    fn test_gt_and_lt_bounds_are_exclusive() {
        assert!(!passes(&Rule::Gt(18.0), Value::Int(18)));
        assert!(passes(&Rule::Gt(18.0), Value::Uint(19)));
        assert!(passes(&Rule::Gt(18.0), Value::Str("5".into())));
        assert!(!passes(&Rule::Lt(18.0), Value::Int(18)));
        assert!(passes(&Rule::Lt(18.5), Value::Float(18.0)));
        assert!(passes(&Rule::Lt(18.0), Value::Ints(Vec::new())));
        assert!(!passes(&Rule::Lt(18.0), Value::Floats(Vec::new())));
    }

    #[test]
    fn test_lt_formats_bound_by_kind() {
        match Rule::Lt(18.0).check(&Value::Float(20.0)) {
            Err(Failure::Args(args)) => assert_eq!(args, vec![Arg::Str("18.00".into())]),
            _ => panic!("expected failure"),
        }
        match Rule::Lt(18.0).check(&Value::Int(20)) {
            Err(Failure::Args(args)) => assert_eq!(args, vec![Arg::Str("18".into())]),
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_charset_rules() {
        assert!(passes(&Rule::Alpha, Value::Str("hello".into())));
        assert!(!passes(&Rule::Alpha, Value::Str("hello123".into())));
        assert!(passes(&Rule::Alphanum, Value::Str("abc123".into())));
        assert!(!passes(&Rule::Alphanum, Value::Str("abc!@#".into())));
        assert!(!passes(&Rule::Alpha, Value::Strs(Vec::new())));
        assert!(passes(&Rule::Alpha, Value::Int(5)));
    }

    #[test]
    fn test_email_and_url() {
        assert!(passes(&Rule::Email, Value::Str("user@example.com".into())));
        assert!(!passes(&Rule::Email, Value::Str("user@".into())));
        assert!(!passes(&Rule::Email, Value::Int(1)));
        assert!(passes(&Rule::Url, Value::Str("http://example.com".into())));
        assert!(passes(&Rule::Url, Value::Str("https://example.com:8080/path?q=1".into())));
        assert!(!passes(&Rule::Url, Value::Str("example.com".into())));
        assert!(!passes(&Rule::Url, Value::Str(String::new())));
    }

    #[test]
    fn test_url_rejects_malformed_hosts() {
        for bad in ["http://exa mple.com", "http://a b", "http://[::1", "mailto:user@example.com", "file:///tmp/x"] {
            assert!(!passes(&Rule::Url, Value::Str(bad.into())), "{bad}");
        }
        assert!(passes(&Rule::Url, Value::Str("http://[::1]:8080/".into())));
        assert!(!passes(&Rule::Url, Value::Strs(vec!["https://ok.example".into(), "http://a b".into()])));
    }

    #[test]
    fn test_pattern_without_regex_always_passes() {
        let rule = Rule::Pattern {
            source: "([".into(),
            regex: None,
        };
        assert!(passes(&rule, Value::Str("anything".into())));
    }
}
