//! Command nodes, tree resolution and per-command dispatch.
//!
//! A [`Command`] owns its children, its flags and its positional slots.
//! Running a command first resolves the deepest subcommand named by the
//! arguments, then parses the remaining tokens on that subcommand and finally
//! runs its action.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{Binding, Command, Validator};
//!
//! let port = Binding::new(8080u16);
//! let files: Binding<Vec<String>> = Binding::default();
//!
//! let mut root = Command::new("app", "Demo application");
//! root.subcommand("serve", "Start the server")
//!     .flag("port", "Port to bind", &port, [Validator::gt(1024.0)])
//!     .flag("file", "Files to serve", &files, []);
//!
//! root.run(["serve", "--port", "9000", "--file=a", "--file=b"]).unwrap();
//! assert_eq!(port.get(), 9000);
//! assert_eq!(files.get(), vec!["a", "b"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::error::{BoxError, Error, ParseError, Result};
use crate::flag::{FlagEntry, FlagSet};
use crate::help;
use crate::parser;
use crate::positional::Positionals;
use crate::types::{Binding, FlagType, Primitive};
use crate::validate::Validator;

/// Callback run when a command is dispatched.
pub type Action = Box<dyn FnMut() -> std::result::Result<(), BoxError>>;

pub(crate) type ErrorHandler = dyn Fn(&str, ParseError) -> BoxError;

/// Types whose fields can be registered as flags and positionals in bulk.
///
/// Usually derived with `#[derive(Bindings)]`; see the crate docs for the
/// attribute vocabulary.
pub trait Bindings: Sized + 'static {
    /// Registers every flag field of `target` on `command`, applying
    /// declared defaults first.
    fn register_flags(target: &Binding<Self>, command: &mut Command);

    /// Registers every positional field of `target` on `command`.
    fn register_positionals(_target: &Binding<Self>, _command: &mut Command) {}
}

/// Application-wide settings visible while a command runs.
#[derive(Clone, Copy, Default)]
pub(crate) struct Context<'a> {
    pub(crate) error_handler: Option<&'a ErrorHandler>,
}

impl Context<'_> {
    fn parse_failure(&self, path: &str, err: ParseError) -> Error {
        debug!(path, error = %err, "parse failed");
        match self.error_handler {
            Some(handler) => Error::Handled(handler(path, err)),
            None => Error::Usage {
                path: path.to_string(),
                source: err,
            },
        }
    }
}

/// How a run ended on the resolved command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// Help was printed or the action ran.
    Done,
    /// The command has no action; `route` locates it below the root.
    Idle { route: Vec<usize>, args_empty: bool },
}

/// A named command with its own flags, positionals and subcommands.
pub struct Command {
    name: String,
    path: String,
    short_description: String,
    long_description: String,
    children: Vec<Command>,
    index: HashMap<String, usize>,
    flags: FlagSet,
    positionals: Positionals,
    action: Option<Action>,
    hidden: bool,
    help: Binding<bool>,
    showed_help: bool,
    other_args: Binding<Vec<String>>,
}

impl Command {
    /// Creates a detached command. Its path is its own name until it is
    /// attached to a parent.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        let mut command = Self {
            path: name.clone(),
            name,
            short_description: description.into(),
            long_description: String::new(),
            children: Vec::new(),
            index: HashMap::new(),
            flags: FlagSet::default(),
            positionals: Positionals::default(),
            action: None,
            hidden: false,
            help: Binding::new(false),
            showed_help: false,
            other_args: Binding::default(),
        };
        command.register_help();
        command
    }

    fn register_help(&mut self) {
        let help = self.help.clone();
        let usage = format!("Get help on the '{}' command.", self.path.to_lowercase());
        self.flags.insert(FlagEntry::new("help", usage, Rc::new(help), Vec::new()));
    }

    /// Recomputes this subtree's paths below `parent_path`.
    fn reroot(&mut self, parent_path: Option<&str>) {
        self.path = match parent_path {
            Some(parent) if !parent.is_empty() => format!("{parent} {}", self.name),
            _ => self.name.clone(),
        };
        self.register_help();
        let path = self.path.clone();
        for child in &mut self.children {
            child.reroot(Some(&path));
        }
    }

    fn attach(&mut self, mut child: Command) -> &mut Command {
        child.reroot(Some(&self.path));
        let slot = self.children.len();
        self.index.insert(child.name.clone(), slot);
        self.children.push(child);
        &mut self.children[slot]
    }

    /// Creates a subcommand and returns it for configuration.
    pub fn subcommand(&mut self, name: impl Into<String>, description: impl Into<String>) -> &mut Command {
        self.attach(Command::new(name, description))
    }

    /// Creates a subcommand that starts with a copy of this command's flags.
    ///
    /// The copy shares bound values but not validators, and it is taken now:
    /// flags registered on this command later are not inherited. Inherited
    /// flags do not count toward the subcommand's help threshold.
    pub fn subcommand_inherit_flags(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Command {
        let inherited: Vec<FlagEntry> = self
            .flags
            .entries()
            .filter(|entry| entry.name != "help")
            .map(FlagEntry::inherit)
            .collect();
        let child = self.subcommand(name, description);
        for entry in inherited {
            child.flags.insert(entry);
        }
        child
    }

    /// Adopts a detached command as a subcommand.
    pub fn add_command(&mut self, command: Command) -> &mut Command {
        self.attach(command)
    }

    /// Registers a flag bound to `binding`.
    ///
    /// Registering the same binding under several names makes them aliases.
    /// Registering a name twice replaces the earlier flag.
    pub fn flag<T: FlagType>(
        &mut self,
        name: &str,
        usage: &str,
        binding: &Binding<T>,
        validators: impl IntoIterator<Item = Validator>,
    ) -> &mut Self {
        self.flags.insert(FlagEntry::new(
            name,
            usage,
            Rc::new(binding.clone()),
            validators.into_iter().collect(),
        ));
        self
    }

    /// Binds the positional token at `index` to `binding`.
    pub fn positional<P: Primitive>(&mut self, index: usize, binding: &Binding<P>) -> &mut Self {
        self.positionals.insert(index, Rc::new(binding.clone()));
        self
    }

    /// Registers the flag fields of a [`Bindings`] struct.
    pub fn add_flags<S: Bindings>(&mut self, target: &Binding<S>) -> &mut Self {
        S::register_flags(target, self);
        self
    }

    /// Registers the positional fields of a [`Bindings`] struct.
    pub fn add_positionals<S: Bindings>(&mut self, target: &Binding<S>) -> &mut Self {
        S::register_positionals(target, self);
        self
    }

    pub fn action(&mut self, action: impl FnMut() -> std::result::Result<(), BoxError> + 'static) -> &mut Self {
        self.action = Some(Box::new(action));
        self
    }

    /// Hidden commands still resolve but are left out of help listings.
    pub fn hidden(&mut self, hidden: bool) -> &mut Self {
        self.hidden = hidden;
        self
    }

    /// Renames the command and its subtree paths.
    ///
    /// A parent that already holds this command keeps resolving it under the
    /// old name.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        let parent = self
            .path
            .strip_suffix(self.name.as_str())
            .map(|prefix| prefix.trim_end().to_string());
        self.name = name.into();
        self.reroot(parent.as_deref());
        self
    }

    pub fn set_short_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.short_description = description.into();
        self
    }

    pub fn set_long_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.long_description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Space-separated names from the root to this command.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn long_description(&self) -> &str {
        &self.long_description
    }

    /// Subcommands in registration order, hidden ones included.
    pub fn subcommands(&self) -> &[Command] {
        &self.children
    }

    pub fn find_subcommand(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&slot| &self.children[slot])
    }

    pub fn find_subcommand_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.index.get(name).map(|&slot| &mut self.children[slot])
    }

    /// Registered flag names in sorted order, `help` included.
    pub fn flag_names(&self) -> Vec<&str> {
        self.flags.entries().map(|entry| entry.name.as_str()).collect()
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }

    pub fn positional_count(&self) -> usize {
        self.positionals.len()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether the last run on this command ended in help output.
    pub fn is_help_requested(&self) -> bool {
        self.showed_help
    }

    /// Non-flag tokens of the last parse, shared with the command so it can
    /// be read from inside an action.
    pub fn other_args(&self) -> Binding<Vec<String>> {
        self.other_args.clone()
    }

    pub(crate) fn flag_set(&self) -> &FlagSet {
        &self.flags
    }

    pub fn help_text(&self) -> String {
        help::render(self)
    }

    pub fn print_help(&self) {
        print!("{}", self.help_text());
    }

    /// Runs this command on `args` with no application around it.
    pub fn run<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.execute(&Context::default(), &args).map(|_| ())
    }

    /// Finds the deepest command named by `args` and where its own tokens
    /// start.
    ///
    /// Every token is checked against the command resolved so far, so a
    /// subcommand name still matches after unrelated tokens.
    pub(crate) fn resolve(&self, args: &[String]) -> (Vec<usize>, usize) {
        let mut current = self;
        let mut route = Vec::new();
        let mut start = 0;
        for (i, token) in args.iter().enumerate() {
            if let Some(&slot) = current.index.get(token) {
                current = &current.children[slot];
                route.push(slot);
                start = i + 1;
            }
        }
        debug!(path = %current.path, consumed = start, "resolved command");
        (route, start)
    }

    /// Follows subcommand names from this command.
    pub(crate) fn route_to(&self, names: &[String]) -> Option<Vec<usize>> {
        let mut current = self;
        let mut route = Vec::with_capacity(names.len());
        for name in names {
            let slot = *current.index.get(name)?;
            current = &current.children[slot];
            route.push(slot);
        }
        Some(route)
    }

    pub(crate) fn descend_mut(&mut self, route: &[usize]) -> &mut Command {
        route
            .iter()
            .fold(self, |command, &slot| &mut command.children[slot])
    }

    pub(crate) fn execute(&mut self, ctx: &Context<'_>, args: &[String]) -> Result<Dispatch> {
        let (route, start) = self.resolve(args);
        let command = self.descend_mut(&route);
        let dispatch = command.dispatch(ctx, &args[start..])?;
        Ok(match dispatch {
            Dispatch::Done => Dispatch::Done,
            Dispatch::Idle { args_empty, .. } => Dispatch::Idle { route, args_empty },
        })
    }

    /// Help check, parse stage and action of an already resolved command.
    pub(crate) fn dispatch(&mut self, ctx: &Context<'_>, args: &[String]) -> Result<Dispatch> {
        self.help.set(false);
        self.showed_help = false;
        self.other_args.set(Vec::new());

        let asks_help = args
            .first()
            .is_none_or(|first| first == "--help" || first == "-h");
        if self.flags.own_len() > 1 && asks_help {
            debug!(path = %self.path, "showing help");
            self.showed_help = true;
            self.print_help();
            return Ok(Dispatch::Done);
        }

        match parser::parse(&self.flags, &self.positionals, args) {
            Ok(positionals) => self.other_args.set(positionals),
            Err(err) => return Err(ctx.parse_failure(&self.path, err)),
        }

        match self.action.as_mut() {
            Some(action) => {
                debug!(path = %self.path, "running action");
                action().map_err(Error::Action)?;
                Ok(Dispatch::Done)
            }
            None => Ok(Dispatch::Idle {
                route: Vec::new(),
                args_empty: args.is_empty(),
            }),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("path", &self.path)
            .field("flags", &self.flags)
            .field("positionals", &self.positionals)
            .field("children", &self.children)
            .field("hidden", &self.hidden)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_paths_follow_the_tree() {
        let mut root = Command::new("app", "");
        let start = root.subcommand("server", "").subcommand("start", "");
        assert_eq!(start.path(), "app server start");

        let mut detached = Command::new("db", "");
        detached.subcommand("migrate", "");
        root.add_command(detached);
        let migrate = root
            .find_subcommand("db")
            .and_then(|db| db.find_subcommand("migrate"))
            .unwrap();
        assert_eq!(migrate.path(), "app db migrate");
    }

    #[test]
    fn test_resolve_scans_every_token() {
        let mut root = Command::new("app", "");
        root.subcommand("server", "").subcommand("start", "");

        let (route, start) = root.resolve(&tokens(&["x", "server", "--y", "start", "z"]));
        assert_eq!(route, vec![0, 0]);
        assert_eq!(start, 4);

        let (route, start) = root.resolve(&tokens(&["start", "server"]));
        assert_eq!(route, vec![0]);
        assert_eq!(start, 2);
    }

    #[test]
    fn test_inherit_flags_is_a_snapshot() {
        let early = Binding::new(String::new());
        let late = Binding::new(false);
        let mut root = Command::new("app", "");
        root.flag("config", "Config file", &early, []);
        root.subcommand_inherit_flags("run", "");
        root.flag("late", "Added later", &late, []);

        let run = root.find_subcommand("run").unwrap();
        assert!(run.has_flag("config"));
        assert!(!run.has_flag("late"));
        assert_eq!(run.flag_names(), vec!["config", "help"]);
    }

    #[test]
    fn test_inherited_flag_shares_binding() {
        let config = Binding::new(String::new());
        let mut root = Command::new("app", "");
        root.flag("config", "Config file", &config, []);
        root.subcommand_inherit_flags("run", "").action(|| Ok(()));

        root.run(["run", "--config=prod.toml"]).unwrap();
        assert_eq!(config.get(), "prod.toml");
    }

    #[test]
    fn test_inherited_flags_do_not_block_subcommand() {
        let config = Binding::new(String::new());
        let ran = Rc::new(Cell::new(0));
        let mut root = Command::new("app", "");
        root.flag("config", "Config file", &config, [Validator::required()]);
        let seen = Rc::clone(&ran);
        root.subcommand_inherit_flags("sub", "").action(move || {
            seen.set(seen.get() + 1);
            Ok(())
        });

        root.run(["sub"]).unwrap();
        assert_eq!(ran.get(), 1);
        assert!(!root.find_subcommand("sub").unwrap().is_help_requested());

        root.run(["sub", "x"]).unwrap();
        assert_eq!(ran.get(), 2);
    }

    #[test]
    fn test_late_help_flag_does_not_skip_action() {
        let ran = Rc::new(Cell::new(false));
        let mut root = Command::new("app", "");
        let seen = Rc::clone(&ran);
        root.action(move || {
            seen.set(true);
            Ok(())
        });

        root.run(["x", "--help"]).unwrap();
        assert!(ran.get());
        assert!(!root.is_help_requested());
    }

    #[test]
    fn test_undefined_short_help_is_a_usage_error() {
        let mut root = Command::new("app", "");
        root.action(|| Ok(()));

        let err = root.run(["x", "-h"]).unwrap_err();
        assert_eq!(err.to_string(), "flag: help requested\nSee 'app --help' for usage");
    }

    #[test]
    fn test_help_precedence_over_action() {
        let ran = Rc::new(Cell::new(false));
        let flag = Binding::new(0i32);
        let mut root = Command::new("app", "");
        let seen = Rc::clone(&ran);
        root.flag("n", "Number", &flag, []).action(move || {
            seen.set(true);
            Ok(())
        });

        root.run(Vec::<String>::new()).unwrap();
        assert!(root.is_help_requested());
        root.run(["-h", "--n=3"]).unwrap();
        assert!(!ran.get());
        assert_eq!(flag.get(), 0);

        root.run(["--n=3"]).unwrap();
        assert!(ran.get());
        assert!(!root.is_help_requested());
    }

    #[test]
    fn test_only_help_flag_runs_action_without_args() {
        let ran = Rc::new(Cell::new(0));
        let mut root = Command::new("app", "");
        let seen = Rc::clone(&ran);
        root.action(move || {
            seen.set(seen.get() + 1);
            Ok(())
        });

        root.run(Vec::<String>::new()).unwrap();
        assert_eq!(ran.get(), 1);
    }

    #[test]
    fn test_parse_error_is_wrapped_with_path() {
        let mut root = Command::new("app", "");
        root.subcommand("server", "").action(|| Ok(()));

        let err = root.run(["server", "--bogus"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "flag provided but not defined: -bogus\nSee 'app server --help' for usage"
        );
    }

    #[test]
    fn test_action_error_is_returned_verbatim() {
        let mut root = Command::new("app", "");
        root.action(|| Err("boom".into()));

        let err = root.run(["x"]).unwrap_err();
        assert!(matches!(err, Error::Action(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_other_args_visible_inside_action() {
        let mut root = Command::new("app", "");
        let leftovers = root.other_args();
        let seen: Rc<Cell<usize>> = Rc::new(Cell::new(0));
        let count = Rc::clone(&seen);
        root.action(move || {
            count.set(leftovers.with(|args| args.len()));
            Ok(())
        });

        root.run(["a", "b", "c"]).unwrap();
        assert_eq!(seen.get(), 3);
    }

    #[test]
    fn test_set_name_updates_paths() {
        let mut root = Command::new("app", "");
        root.subcommand("old", "").subcommand("leaf", "");
        let old = root.find_subcommand_mut("old").unwrap();
        old.set_name("new");
        assert_eq!(old.path(), "app new");
        assert_eq!(old.subcommands()[0].path(), "app new leaf");
    }
}
