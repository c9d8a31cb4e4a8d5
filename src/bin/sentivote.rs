//! Sentivote CLI binary.

use std::process::ExitCode;

use clap::Parser;
use env_logger::{Env, Target};
use log::LevelFilter;

use sentivote::cli::args::SentivoteArgs;
use sentivote::cli::commands::execute_command;
use sentivote::error::SentivoteError;

/// Exit status for a rejected configuration or corpus setup.
const EXIT_USAGE: u8 = 2;

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        3 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to stderr so JSON on stdout stays parseable. `RUST_LOG` wins over
/// the `-v`/`-q` flags.
fn init_logging(verbosity: u8) {
    let default = level_for(verbosity).to_string().to_lowercase();
    env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .format_module_path(false)
        .format_target(verbosity > 2)
        .init();
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let fatal = err.chain().any(|cause| {
        cause
            .downcast_ref::<SentivoteError>()
            .is_some_and(SentivoteError::is_fatal)
    });
    if fatal {
        ExitCode::from(EXIT_USAGE)
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let args = SentivoteArgs::parse();
    init_logging(args.verbosity());

    match execute_command(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sentivote: {err:#}");
            exit_code(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_fatal_errors_exit_with_usage_status() {
        let err = Err::<(), _>(SentivoteError::configuration("threshold out of range"))
            .context("Invalid configuration")
            .unwrap_err();
        assert_eq!(exit_code(&err), ExitCode::from(EXIT_USAGE));

        let err = anyhow::Error::from(SentivoteError::training("linear_svc", "diverged"));
        assert_eq!(exit_code(&err), ExitCode::FAILURE);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Error);
        assert_eq!(level_for(1), LevelFilter::Warn);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }
}
