//! Command-line flag binding.
//!
//! # Responsibilities
//! - Build one `clap::Arg` per flag-backed variable, typed by its [`FlagKind`]
//! - Parse process arguments and feed each supplied flag through
//!   `Variable::parse_and_assign`
//!
//! # Design Decisions
//! - The clap command is rebuilt on every parse from the registry's current
//!   flag index, so late registrations are always included
//! - Typed binders validate at the clap layer for clap-style error messages;
//!   the variable's own parser still performs the final conversion
//! - Repeated flags: the last occurrence wins
//! - Positional arguments are accepted and ignored
//! - Signed and float flags take negative numbers as separate values
//!   (`--offset -5`); string flags take any next argument
//! - clap's own `--help` is disabled so `help` is an ordinary flag name

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};

use crate::error::ParseError;
use crate::var::{FlagKind, Setting, Variable};

const POSITIONALS: &str = "positional-args";

/// Panics when `var` is flag-backed but its name is reserved or its type has
/// no binder.
pub(crate) fn require_binder(var: &dyn Variable) {
    if var.flag_name() == POSITIONALS {
        panic!("flag --{}: name is reserved", POSITIONALS);
    }
    if var.flag_kind().is_none() {
        panic!(
            "flag --{}: type {} has no flag binder; declare it with a custom parse function",
            var.flag_name(),
            var.type_name()
        );
    }
}

fn check<T: Setting>(s: &str) -> Result<String, ParseError> {
    T::parse_setting(s).map(|_| s.to_string())
}

fn flag_arg(name: &str, var: &dyn Variable) -> Arg {
    let mut help = var.description().to_string();
    let default = var.format();
    if !default.is_empty() {
        help = format!("{} [default: {}]", help, default).trim_start().to_string();
    }

    let arg = Arg::new(name.to_string())
        .long(name.to_string())
        .help(help)
        .action(ArgAction::Append);

    match var.flag_kind() {
        Some(FlagKind::Bool) => arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true")
            .value_parser(check::<bool>),
        Some(FlagKind::Int) => arg.allow_negative_numbers(true).value_parser(check::<i64>),
        Some(FlagKind::Uint) => arg.value_parser(check::<u64>),
        Some(FlagKind::Float) => arg.allow_negative_numbers(true).value_parser(check::<f64>),
        Some(FlagKind::Duration) => arg.value_parser(check::<Duration>),
        Some(FlagKind::Str) | Some(FlagKind::Custom) => arg.allow_hyphen_values(true),
        None => arg,
    }
}

fn command(flags: &[(String, Arc<dyn Variable>)]) -> Command {
    flags.iter().fold(
        Command::new("live-config").disable_help_flag(true).arg(
            Arg::new(POSITIONALS)
                .num_args(0..)
                .action(ArgAction::Append)
                .hide(true),
        ),
        |cmd, (name, var)| cmd.arg(flag_arg(name, var.as_ref())),
    )
}

/// Parse `args` (including the binary name) and assign every supplied flag.
///
/// Returns the number of variables assigned.
pub(crate) fn parse<I, T>(flags: &[(String, Arc<dyn Variable>)], args: I) -> Result<usize, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut cmd = command(flags);
    let matches = cmd.try_get_matches_from_mut(args)?;

    let mut applied = 0;
    for (name, var) in flags {
        if matches.value_source(name) != Some(ValueSource::CommandLine) {
            continue;
        }
        let Some(value) = matches.get_many::<String>(name).and_then(|values| values.last()) else {
            continue;
        };
        if let Err(e) = var.parse_and_assign(value) {
            return Err(cmd.error(
                ErrorKind::ValueValidation,
                format!("invalid value {:?} for '--{}': {}", value, name, e),
            ));
        }
        tracing::debug!(flag = %name, "Flag applied");
        applied += 1;
    }
    Ok(applied)
}
