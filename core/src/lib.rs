//! Command trees, typed flags, positional binding and declarative
//! validation for command-line tools.
//!
//! The building blocks:
//!
//! - [`Binding`]: a shared cell a flag or positional argument writes into.
//! - [`Command`]: a named node with flags, positionals, subcommands and an
//!   optional action.
//! - [`Validator`]: a rule checked against a flag's value after parsing,
//!   with an optional custom message template.
//! - [`App`]: the root command plus version, banner, default command, error
//!   handler and pre-run hook.
//!
//! Flags accept `-name`, `--name`, `-name=value` and `--name value`. A `bool`
//! flag is a switch: `--name` alone sets it. `Vec` flags append one element
//! per occurrence. Flags and positional arguments may be interleaved.
//!
//! With the default `derive` feature, `#[derive(Bindings)]` registers a
//! struct's fields in bulk. A field becomes a flag when it has both `name` and
//! `description`; `position` makes it positional; `flatten` recurses into a
//! nested struct. `default` is parsed into the field before registration and
//! ignored when it does not parse; `validate` takes a rule string (see
//! [`validate::parse_tags`]).
//!
//! # Example
//!
//! ```
//! use flagtree_core::{App, Binding, Validator};
//!
//! let count: Binding<Vec<i32>> = Binding::default();
//! let verbose = Binding::new(false);
//!
//! let mut app = App::new("demo", "Flag demo", "0.1.0");
//! app.flag("count", "Repeatable counter", &count, [Validator::lt(10.0)])
//!     .flag("verbose", "Verbose output", &verbose, []);
//!
//! app.run(["--count=1", "arg1", "--verbose", "--count=2", "arg2"]).unwrap();
//!
//! assert_eq!(count.get(), vec![1, 2]);
//! assert!(verbose.get());
//! assert_eq!(app.other_args().get(), vec!["arg1", "arg2"]);
//! ```

extern crate self as flagtree_core;

mod app;
mod command;
mod error;
mod flag;
mod help;
mod parser;
mod positional;
mod types;
pub mod validate;

pub use app::App;
pub use command::{Action, Bindings, Command};
pub use error::{BoxError, Error, FlagError, ParseError, Result};
pub use types::{Binding, FlagType, Primitive, Value};
pub use validate::{Expected, ValidationError, ValidationErrors, Validator};

#[cfg(feature = "derive")]
pub use flagtree_derive::Bindings;
