//! Per-command argument parsing.
//!
//! The flag primitive stops at the first non-flag token. To let flags and
//! positionals interleave freely, [`parse`] peels one positional token off at
//! a time and restarts the primitive on whatever follows it.

use tracing::trace;

use crate::error::{FlagError, ParseError};
use crate::flag::FlagSet;
use crate::positional::Positionals;

/// Splits `args` into flag occurrences and positional tokens.
///
/// Returns every positional token in its original relative order. Flag
/// errors abort immediately; bound flags keep whatever was already applied.
pub(crate) fn split(flags: &FlagSet, args: &[String]) -> Result<Vec<String>, FlagError> {
    let mut rest = args;
    let mut positionals = Vec::new();
    loop {
        let used = flags.consume(rest)?;
        rest = &rest[used..];
        let Some((token, tail)) = rest.split_first() else {
            break;
        };
        trace!(token = %token, "peeled positional");
        positionals.push(token.clone());
        rest = tail;
    }
    Ok(positionals)
}

/// Runs the parse stage of one command: flags, validation and positional
/// binding, in that order. Returns the positional tokens.
pub(crate) fn parse(flags: &FlagSet, positionals: &Positionals, args: &[String]) -> Result<Vec<String>, ParseError> {
    let tokens = split(flags, args)?;
    flags.validate()?;

    if !tokens.is_empty() {
        positionals.bind(&tokens);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::flag::FlagEntry;
    use crate::types::{Binding, Slot};
    use crate::validate::Validator;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    struct Fixture {
        flags: FlagSet,
        help: Binding<bool>,
        count: Binding<Vec<i32>>,
        verbose: Binding<bool>,
    }

    fn fixture() -> Fixture {
        let help = Binding::new(false);
        let count = Binding::new(Vec::new());
        let verbose = Binding::new(false);
        let mut flags = FlagSet::default();
        for (name, slot) in [
            ("help", Rc::new(help.clone()) as Rc<dyn Slot>),
            ("count", Rc::new(count.clone())),
            ("verbose", Rc::new(verbose.clone())),
        ] {
            flags.insert(FlagEntry::new(name, "", slot, Vec::new()));
        }
        Fixture {
            flags,
            help,
            count,
            verbose,
        }
    }

    #[test]
    fn test_split_interleaved_flags_and_positionals() {
        let f = fixture();
        let args = tokens(&["--count=1", "arg1", "--verbose", "--count=2", "arg2"]);
        let positionals = split(&f.flags, &args).unwrap();

        assert_eq!(positionals, vec!["arg1", "arg2"]);
        assert_eq!(f.count.get(), vec![1, 2]);
        assert!(f.verbose.get());
    }

    #[test]
    fn test_split_after_double_dash() {
        let f = fixture();
        let args = tokens(&["--verbose=false", "--", "--count=3", "x"]);
        let positionals = split(&f.flags, &args).unwrap();

        assert_eq!(positionals, vec!["--count=3", "x"]);
        assert!(f.count.get().is_empty());
    }

    fn with_required_name(f: &mut Fixture) {
        let name: Rc<dyn Slot> = Rc::new(Binding::new(String::new()));
        f.flags.insert(FlagEntry::new("name", "", name, vec![Validator::required()]));
    }

    #[test]
    fn test_parse_late_help_flag_is_an_ordinary_switch() {
        let mut f = fixture();
        with_required_name(&mut f);

        let err = parse(&f.flags, &Positionals::default(), &tokens(&["a", "--help"])).unwrap_err();
        assert!(matches!(err, ParseError::Validation(_)));
        assert!(f.help.get());
    }

    #[test]
    fn test_parse_undefined_short_help_is_an_error() {
        let f = fixture();
        let err = parse(&f.flags, &Positionals::default(), &tokens(&["a", "-h"])).unwrap_err();
        assert!(matches!(err, ParseError::Flag(FlagError::HelpRequested)));
    }

    #[test]
    fn test_parse_validation_failure_keeps_flag_side_effects() {
        let mut f = fixture();
        with_required_name(&mut f);

        let err = parse(&f.flags, &Positionals::default(), &tokens(&["--count=5"])).unwrap_err();
        assert!(matches!(err, ParseError::Validation(_)));
        assert_eq!(f.count.get(), vec![5]);
    }

    #[test]
    fn test_parse_binds_positionals() {
        let f = fixture();
        let target = Binding::new(String::new());
        let mut positionals = Positionals::default();
        positionals.insert(1, Rc::new(target.clone()));

        let outcome = parse(&f.flags, &positionals, &tokens(&["a", "--verbose", "b"])).unwrap();
        assert_eq!(outcome, tokens(&["a", "b"]));
        assert_eq!(target.get(), "b");
    }
}
