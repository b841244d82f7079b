use flagtree_core::{App, Binding, Bindings, Command, Validator};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output options shared by every subcommand that prints.
#[derive(Debug, Default, Bindings)]
struct OutputArgs {
    #[cli(name = "upper", description = "Print in upper case")]
    upper: bool,
    #[cli(name = "prefix", description = "Text put before every line")]
    prefix: String,
}

#[derive(Debug, Default, Bindings)]
struct GreetArgs {
    #[cli(
        name = "name",
        description = "Who to greet",
        validate = "required,alpha,error_alpha='must be a plain word'"
    )]
    name: String,
    #[cli(name = "times", description = "How many greetings", default = "1", validate = "range=1-5")]
    times: u32,
    #[cli(position = 0)]
    greeting: String,
    #[cli(flatten)]
    output: OutputArgs,
}

fn render(output: &OutputArgs, line: String) -> String {
    let line = if output.upper { line.to_uppercase() } else { line };
    if output.prefix.is_empty() {
        line
    } else {
        format!("{}{line}", output.prefix)
    }
}

fn greet_command() -> Command {
    let args = Binding::new(GreetArgs::default());
    let mut command = Command::new("greet", "Greet someone");
    command
        .set_long_description("The first positional argument replaces the word 'Hello'.")
        .add_flags(&args)
        .add_positionals(&args);

    let leftovers = command.other_args();
    command.action(move || {
        args.with(|args| {
            let greeting = if args.greeting.is_empty() { "Hello" } else { args.greeting.as_str() };
            debug!(name = %args.name, times = args.times, extra = ?leftovers.get(), "greeting");
            for _ in 0..args.times {
                println!("{}", render(&args.output, format!("{greeting}, {}!", args.name)));
            }
        });
        Ok(())
    });
    command
}

fn math_command(app: &mut App) {
    let verbose = Binding::new(false);
    let numbers: Binding<Vec<i64>> = Binding::default();
    let scale = Binding::new(1i64);

    let math = app.subcommand("math", "Arithmetic on flag values");
    math.flag("verbose", "Show the whole sum", &verbose, []);

    let sum = math.subcommand_inherit_flags("sum", "Add numbers together");
    let required = Validator::required().with_message("at least one -n is needed");
    sum.flag("n", "A number to add (repeatable)", &numbers, [required])
        .flag("scale", "Multiply the total", &scale, [Validator::gt(0.0)]);

    sum.action(move || {
        let numbers = numbers.get();
        let total: i64 = numbers.iter().sum::<i64>() * scale.get();
        if verbose.get() {
            let terms: Vec<String> = numbers.iter().map(i64::to_string).collect();
            println!("{} = {total}", terms.join(" + "));
        } else {
            println!("{total}");
        }
        Ok(())
    });
}

fn check_command(app: &mut App) {
    let email = Binding::new(String::new());
    let site = Binding::new(String::new());
    let level = Binding::new(String::from("info"));

    let command = app.subcommand("check", "Validate contact details");
    command
        .flag("email", "Contact address", &email, [Validator::email()])
        .flag("site", "Home page", &site, [Validator::url()])
        .flag("level", "Log level", &level, [Validator::one_of(["debug", "info", "warn"])]);
    command.action(move || {
        println!("ok: {} {} {}", email.get(), site.get(), level.get());
        Ok(())
    });
}

fn fail_command(app: &mut App) {
    app.subcommand("fail", "Return an error from the action")
        .hidden(true)
        .action(|| Err("action failed on purpose".into()));
}

fn build_app() -> App {
    let mut app = App::new("flagtree-demo", "Demo of command trees, typed flags and validation", PACKAGE_VERSION);
    app.long_description("Run a subcommand with --help to see its flags.");

    math_command(&mut app);
    check_command(&mut app);
    fail_command(&mut app);
    app.add_command(greet_command());

    let mut status = Command::new("status", "Show the banner");
    status.action(|| {
        println!("flagtree-demo {PACKAGE_VERSION}");
        Ok(())
    });
    app.default_command(status);
    app.pre_run(|app| {
        debug!(app = %app.name(), banner = %app.banner_text(), "starting");
        Ok(())
    });
    app
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut app = build_app();
    if let Err(err) = app.run_env() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
