//! Per-command flag registry and the flag-token primitive.
//!
//! [`FlagSet::consume`] accepts `-name`, `--name`, `-name=value`,
//! `--name=value` and, for non-switch flags, `-name value`. It stops at the
//! first token that does not look like a flag; a bare `--` is consumed and
//! also stops it.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::FlagError;
use crate::types::Slot;
use crate::validate::{ValidationErrors, Validator};

/// One registered flag. Clones share the bound cell.
#[derive(Clone)]
pub(crate) struct FlagEntry {
    pub(crate) name: String,
    pub(crate) usage: String,
    pub(crate) slot: Rc<dyn Slot>,
    pub(crate) validators: Vec<Validator>,
    /// Copied from a parent command rather than registered here.
    pub(crate) inherited: bool,
}

impl FlagEntry {
    pub(crate) fn new(
        name: impl Into<String>,
        usage: impl Into<String>,
        slot: Rc<dyn Slot>,
        validators: Vec<Validator>,
    ) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            slot,
            validators,
            inherited: false,
        }
    }

    /// The same flag as seen by a subcommand: shared cell, no validators.
    pub(crate) fn inherit(&self) -> Self {
        Self {
            name: self.name.clone(),
            usage: self.usage.clone(),
            slot: Rc::clone(&self.slot),
            validators: Vec::new(),
            inherited: true,
        }
    }
}

impl fmt::Debug for FlagEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagEntry")
            .field("name", &self.name)
            .field("value", &self.slot.snapshot())
            .field("validators", &self.validators)
            .field("inherited", &self.inherited)
            .finish()
    }
}

/// Flags of one command, keyed and iterated by name.
#[derive(Debug, Clone, Default)]
pub(crate) struct FlagSet {
    entries: BTreeMap<String, FlagEntry>,
}

impl FlagSet {
    /// Registers `entry`, silently replacing any flag of the same name.
    pub(crate) fn insert(&mut self, entry: FlagEntry) {
        if self.entries.contains_key(&entry.name) {
            trace!(flag = %entry.name, "flag re-registered");
        }
        self.entries.insert(entry.name.clone(), entry);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flags registered on this command itself, `help` included.
    pub(crate) fn own_len(&self) -> usize {
        self.entries.values().filter(|entry| !entry.inherited).count()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &FlagEntry> {
        self.entries.values()
    }

    /// Applies leading flag tokens and returns how many tokens were used.
    ///
    /// Stops at the first non-flag token (anything shorter than two bytes or
    /// not starting with `-`). Errors are fatal and leave earlier flags set.
    pub(crate) fn consume(&self, args: &[String]) -> Result<usize, FlagError> {
        let mut pos = 0;
        while let Some(token) = args.get(pos) {
            if token.len() < 2 || !token.starts_with('-') {
                break;
            }
            if token == "--" {
                pos += 1;
                break;
            }

            let body = token.strip_prefix("--").unwrap_or(&token[1..]);
            if body.is_empty() || body.starts_with('-') || body.starts_with('=') {
                return Err(FlagError::BadSyntax(token.clone()));
            }
            pos += 1;

            let (name, inline) = match body.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (body, None),
            };
            let Some(entry) = self.entries.get(name) else {
                return Err(if name == "help" || name == "h" {
                    FlagError::HelpRequested
                } else {
                    FlagError::Undefined(name.to_string())
                });
            };

            if entry.slot.is_switch() {
                let value = inline.unwrap_or("true");
                entry.slot.assign(value).map_err(|reason| FlagError::InvalidBool {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason,
                })?;
                trace!(flag = name, value, "switch set");
                continue;
            }

            let value = match inline {
                Some(value) => value,
                None => {
                    let Some(next) = args.get(pos) else {
                        return Err(FlagError::MissingValue(name.to_string()));
                    };
                    pos += 1;
                    next.as_str()
                }
            };
            entry.slot.assign(value).map_err(|reason| FlagError::InvalidValue {
                name: name.to_string(),
                value: value.to_string(),
                reason,
            })?;
            trace!(flag = name, value, "flag set");
        }
        Ok(pos)
    }

    /// Runs every flag's validators against its current value.
    ///
    /// Validators of one flag run in registration order and stop at the first
    /// failure, so each flag contributes at most one error.
    pub(crate) fn validate(&self) -> Result<(), ValidationErrors> {
        let errors = self
            .entries
            .values()
            .filter(|entry| !entry.validators.is_empty())
            .filter_map(|entry| {
                let value = entry.slot.snapshot();
                entry
                    .validators
                    .iter()
                    .find_map(|validator| validator.validate(&value).err())
                    .map(|err| err.with_field(entry.name.as_str()))
            })
            .collect::<Vec<_>>();

        for err in &errors {
            trace!(flag = err.field(), "validation failed");
        }
        match ValidationErrors::from_vec(errors) {
            Some(errors) => Err(errors),
            None => Ok(()),
        }
    }
}
