//! The application shell: a root command plus app-wide settings.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{App, Binding, Command, Validator};
//!
//! let name = Binding::new(String::new());
//! let mut app = App::new("greet", "Say hello", "1.0.0");
//! app.flag("name", "Who to greet", &name, [Validator::required()]);
//!
//! app.run(["--name=bob"]).unwrap();
//! assert_eq!(name.get(), "bob");
//!
//! name.set(String::new());
//! let err = app.run(["extra"]).unwrap_err();
//! assert!(err.to_string().starts_with("name: field is required"));
//! ```

use std::fmt;

use tracing::debug;

use crate::command::{Bindings, Command, Context, Dispatch, ErrorHandler};
use crate::error::{BoxError, Error, ParseError, Result};
use crate::types::{Binding, FlagType, Primitive};
use crate::validate::Validator;

type BannerFn = Box<dyn Fn(&App) -> String>;
type PreRunFn = Box<dyn FnMut(&App) -> std::result::Result<(), BoxError>>;

enum DefaultCommand {
    /// A detached command owned by the application.
    Owned(Box<Command>),
    /// Subcommand names leading to a command inside the tree.
    Path(Vec<String>),
}

/// A command-line application.
///
/// Settings are configured before [`run`](Self::run) and only read during it.
pub struct App {
    root: Command,
    version: String,
    banner: BannerFn,
    error_handler: Option<Box<ErrorHandler>>,
    pre_run: Option<PreRunFn>,
    default: Option<DefaultCommand>,
}

fn default_banner(app: &App) -> String {
    if app.version.is_empty() {
        format!("{} - {}", app.name(), app.short_description())
    } else {
        format!("{} {} - {}", app.name(), app.version, app.short_description())
    }
}

impl App {
    /// Creates an application whose root command is `name`.
    pub fn new(name: impl Into<String>, description: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            root: Command::new(name, description),
            version: version.into(),
            banner: Box::new(default_banner),
            error_handler: None,
            pre_run: None,
            default: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        self.root.name()
    }

    pub fn short_description(&self) -> &str {
        self.root.short_description()
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Command {
        &mut self.root
    }

    /// Replaces the banner generator.
    pub fn banner(&mut self, banner: impl Fn(&App) -> String + 'static) -> &mut Self {
        self.banner = Box::new(banner);
        self
    }

    pub fn banner_text(&self) -> String {
        (self.banner)(self)
    }

    pub fn print_banner(&self) {
        println!("{}\n", self.banner_text());
    }

    /// Rewrites parse-stage errors (flag syntax and validation).
    ///
    /// The handler receives the resolved command path and the error; its
    /// result is returned from [`run`](Self::run) as [`Error::Handled`].
    pub fn error_handler(&mut self, handler: impl Fn(&str, ParseError) -> BoxError + 'static) -> &mut Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Runs before command resolution on every [`run`](Self::run); an error
    /// aborts the run.
    pub fn pre_run(
        &mut self,
        hook: impl FnMut(&App) -> std::result::Result<(), BoxError> + 'static,
    ) -> &mut Self {
        self.pre_run = Some(Box::new(hook));
        self
    }

    /// Runs `command` when the resolved command has no action and no
    /// arguments are left.
    pub fn default_command(&mut self, command: Command) -> &mut Self {
        self.default = Some(DefaultCommand::Owned(Box::new(command)));
        self
    }

    /// Like [`default_command`](Self::default_command), for a command that is
    /// already part of the tree, named by its subcommand path below the root.
    /// An empty path names the root.
    pub fn default_subcommand<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Self {
        let names = path.iter().map(|name| name.as_ref().to_string()).collect();
        self.default = Some(DefaultCommand::Path(names));
        self
    }

    pub fn subcommand(&mut self, name: impl Into<String>, description: impl Into<String>) -> &mut Command {
        self.root.subcommand(name, description)
    }

    pub fn subcommand_inherit_flags(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> &mut Command {
        self.root.subcommand_inherit_flags(name, description)
    }

    pub fn add_command(&mut self, command: Command) -> &mut Command {
        self.root.add_command(command)
    }

    pub fn flag<T: FlagType>(
        &mut self,
        name: &str,
        usage: &str,
        binding: &Binding<T>,
        validators: impl IntoIterator<Item = Validator>,
    ) -> &mut Self {
        self.root.flag(name, usage, binding, validators);
        self
    }

    pub fn positional<P: Primitive>(&mut self, index: usize, binding: &Binding<P>) -> &mut Self {
        self.root.positional(index, binding);
        self
    }

    pub fn add_flags<S: Bindings>(&mut self, target: &Binding<S>) -> &mut Self {
        self.root.add_flags(target);
        self
    }

    pub fn add_positionals<S: Bindings>(&mut self, target: &Binding<S>) -> &mut Self {
        self.root.add_positionals(target);
        self
    }

    pub fn action(&mut self, action: impl FnMut() -> std::result::Result<(), BoxError> + 'static) -> &mut Self {
        self.root.action(action);
        self
    }

    pub fn long_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.root.set_long_description(description);
        self
    }

    /// Non-flag tokens left on the root command by the last run.
    pub fn other_args(&self) -> Binding<Vec<String>> {
        self.root.other_args()
    }

    pub fn print_help(&self) {
        self.root.print_help();
    }

    /// Runs the application on the process arguments, minus the program name.
    pub fn run_env(&mut self) -> Result<()> {
        self.run(std::env::args().skip(1))
    }

    /// Runs the application on `args`.
    pub fn run<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        if let Some(mut hook) = self.pre_run.take() {
            debug!(app = %self.name(), "running pre-run hook");
            let outcome = hook(self);
            self.pre_run = Some(hook);
            outcome.map_err(Error::PreRun)?;
        }

        let ctx = Context {
            error_handler: self.error_handler.as_deref(),
        };
        let Dispatch::Idle { route, args_empty: true } = self.root.execute(&ctx, &args)? else {
            return Ok(());
        };

        match &mut self.default {
            None => Ok(()),
            Some(DefaultCommand::Owned(command)) => {
                debug!(path = %command.path(), "running default command");
                command.dispatch(&ctx, &[]).map(|_| ())
            }
            Some(DefaultCommand::Path(names)) => {
                let Some(target) = self.root.route_to(names) else {
                    debug!(path = ?names, "default command not found");
                    return Ok(());
                };
                if target == route {
                    return Ok(());
                }
                let command = self.root.descend_mut(&target);
                debug!(path = %command.path(), "running default command");
                command.dispatch(&ctx, &[]).map(|_| ())
            }
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("version", &self.version)
            .field("has_error_handler", &self.error_handler.is_some())
            .field("has_pre_run", &self.pre_run.is_some())
            .finish()
    }
}
