//! Parser for `validate = "..."` rule strings.
//!
//! A rule string is a comma-separated list of clauses: bare rule names
//! (`required`, `alpha`, `alphanum`, `email`, `url`), `name=value` rules
//! (`range=1-10`, `len=5`, `pattern=^a+$`, `in=a|b`, `eq=3`, `gt=0`, `lt=9`,
//! `contains=x`) and `error_<name>=message` overrides. Malformed clauses are
//! dropped.

use std::collections::HashMap;

use tracing::trace;

use super::{Expected, Validator};

struct Clause<'a> {
    name: &'a str,
    value: &'a str,
}

fn clauses(tags: &str) -> impl Iterator<Item = Clause<'_>> {
    tags.split(',')
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(|clause| {
            let (name, value) = clause.split_once('=').unwrap_or((clause, ""));
            Clause {
                name: name.trim(),
                value: value.trim().trim_matches(|c: char| c == '"' || c == '\''),
            }
        })
}

/// Builds validators from a rule string, in clause order.
///
/// Each `error_<name>` message is applied to the first `<name>` rule only.
///
/// # Examples
///
/// ```
/// use flagtree_core::validate::parse_tags;
/// use flagtree_core::Value;
///
/// let rules = parse_tags("required,len=3,error_len='need %v'");
/// assert_eq!(rules.len(), 2);
///
/// let err = rules[1].validate(&Value::Str("ab".into())).unwrap_err();
/// assert_eq!(err.message(), "need 3 characters");
/// ```
pub fn parse_tags(tags: &str) -> Vec<Validator> {
    let mut messages: HashMap<&str, &str> = clauses(tags)
        .filter_map(|c| c.name.strip_prefix("error_").map(|rule| (rule, c.value)))
        .collect();

    let mut validators = Vec::new();
    for Clause { name, value } in clauses(tags) {
        if name.starts_with("error_") {
            continue;
        }
        let Some(validator) = build(name, value) else {
            trace!(clause = name, value, "dropping validation clause");
            continue;
        };
        let validator = match messages.remove(name) {
            Some(message) => validator.with_message(message),
            None => validator,
        };
        validators.push(validator);
    }
    validators
}

fn build(name: &str, value: &str) -> Option<Validator> {
    let needs_value = !matches!(name, "required" | "email" | "url" | "alpha" | "alphanum");
    if needs_value && value.is_empty() {
        return None;
    }

    match name {
        "required" => Some(Validator::required()),
        "email" => Some(Validator::email()),
        "url" => Some(Validator::url()),
        "alpha" => Some(Validator::alpha()),
        "alphanum" => Some(Validator::alphanum()),
        "range" => {
            let parts: Vec<&str> = value.split('-').collect();
            let [min, max] = parts.as_slice() else {
                return None;
            };
            let min = min.trim().parse().ok()?;
            let max = max.trim().parse().ok()?;
            Some(Validator::range(min, max))
        }
        "len" => value.parse().ok().map(Validator::len),
        "pattern" => regex::Regex::new(value).ok().map(|_| Validator::pattern(value)),
        "in" => Some(Validator::one_of(value.split('|'))),
        "eq" => Some(Validator::eq(parse_expected(value))),
        "gt" => value.parse().ok().map(Validator::gt),
        "lt" => value.parse().ok().map(Validator::lt),
        "contains" => Some(Validator::contains(value)),
        _ => None,
    }
}

fn parse_expected(value: &str) -> Expected {
    if let Ok(i) = value.parse::<i64>() {
        Expected::Int(i)
    } else if let Ok(x) = value.parse::<f64>() {
        Expected::Float(x)
    } else if let Ok(b) = value.parse::<bool>() {
        Expected::Bool(b)
    } else {
        Expected::Str(value.to_string())
    }
}
