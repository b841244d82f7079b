//! printf-style message templates.
//!
//! A template is only formatted when its placeholder count matches the number
//! of arguments; otherwise it is returned untouched.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%([0-9]*)(\.?)([0-9]*)([vTbcdefgopqstxX])").expect("static regex must compile")
});

/// One argument substituted into a message template.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.join(" ")),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for Arg {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for Arg {
    fn from(u: u64) -> Self {
        Self::Uint(u)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Counts the format placeholders in `template`.
pub fn count_placeholders(template: &str) -> usize {
    PLACEHOLDER.find_iter(template).count()
}

/// Formats `template` with `args` when the counts line up.
pub fn render(template: &str, args: &[Arg]) -> String {
    if args.is_empty() || count_placeholders(template) != args.len() {
        return template.to_string();
    }

    let mut pending = args.iter();
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            pending
                .next()
                .map(|arg| format_arg(arg, caps))
                .unwrap_or_default()
        })
        .into_owned()
}

fn format_arg(arg: &Arg, caps: &Captures<'_>) -> String {
    let width = caps[1].parse::<usize>().unwrap_or(0);
    let precision = if caps[2].is_empty() {
        None
    } else {
        Some(caps[3].parse::<usize>().unwrap_or(0))
    };

    let text = match (&caps[4], arg) {
        ("d", Arg::Float(x)) => format!("{}", x.trunc() as i64),
        ("f" | "F", Arg::Float(x)) => format!("{:.*}", precision.unwrap_or(6), x),
        ("f" | "F", Arg::Int(i)) => format!("{:.*}", precision.unwrap_or(6), *i as f64),
        ("f" | "F", Arg::Uint(u)) => format!("{:.*}", precision.unwrap_or(6), *u as f64),
        ("e", Arg::Float(x)) => format!("{:.*e}", precision.unwrap_or(6), x),
        ("q", Arg::Str(s)) => format!("{s:?}"),
        ("x", Arg::Int(i)) => format!("{i:x}"),
        ("x", Arg::Uint(u)) => format!("{u:x}"),
        ("X", Arg::Int(i)) => format!("{i:X}"),
        ("X", Arg::Uint(u)) => format!("{u:X}"),
        ("s" | "v", Arg::Str(s)) => match precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.clone(),
        },
        _ => arg.to_string(),
    };

    format!("{text:>width$}")
}
