//! Error types for parsing, validation and dispatch.
//!
//! Resolution never fails, so the taxonomy starts at the flag primitive:
//! [`FlagError`] for malformed or unknown flags, [`ValidationErrors`] for
//! rule failures, [`ParseError`] for anything one command's parse stage can
//! produce, and [`Error`] for the result of a whole run.

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Boxed error returned by user callbacks (actions, hooks, handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Syntax errors raised while consuming flag tokens.
///
/// These are fatal: the first one stops the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    /// A token such as `---name` or `-=value`.
    #[error("bad flag syntax: {0}")]
    BadSyntax(String),
    /// The flag name is not registered on the resolved command.
    #[error("flag provided but not defined: -{0}")]
    Undefined(String),
    /// `-h` or `-help` was given but no such flag is registered.
    #[error("flag: help requested")]
    HelpRequested,
    /// A non-switch flag appeared last with no `=value` and no next token.
    #[error("flag needs an argument: -{0}")]
    MissingValue(String),
    /// The value could not be parsed into the flag's declared type.
    #[error("invalid value {value:?} for flag -{name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
    /// A switch was given an explicit value that is not a boolean.
    #[error("invalid boolean value {value:?} for -{name}: {reason}")]
    InvalidBool {
        name: String,
        value: String,
        reason: String,
    },
}

/// Everything the parse stage of a single command can fail with.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error(transparent)]
    Flag(#[from] FlagError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Errors returned from running a command tree.
#[derive(Debug, Error)]
pub enum Error {
    /// A parse-stage failure, annotated with where to look for usage.
    #[error("{source}\nSee '{path} --help' for usage")]
    Usage {
        path: String,
        #[source]
        source: ParseError,
    },
    /// The replacement error produced by an application error handler.
    #[error(transparent)]
    Handled(BoxError),
    /// The pre-run hook refused to continue.
    #[error(transparent)]
    PreRun(BoxError),
    /// The action callback failed; its error is surfaced verbatim.
    #[error(transparent)]
    Action(BoxError),
}

impl Error {
    /// Returns the underlying parse error, if this run failed while parsing.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::Usage { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
