use std::ffi::OsString;

use clap::Parser;
use rc_core::RunCodeError;

mod check;
mod cli_args;
mod error_map;
mod inspect;
mod runner;
mod source_loader;

pub(crate) use cli_args::{CheckArgs, Cli, InspectArgs, Mode, RunArgs};
pub(crate) use error_map::{
    emit_error, json_string, map_cli_source_path, map_cli_source_scan, map_config_invalid,
    map_config_read,
};
pub(crate) use source_loader::{load_documents, load_options};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    init_tracing();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

// stdout is the line protocol; logs go to stderr.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<i32, RunCodeError> {
    match cli.command {
        Mode::Inspect(args) => inspect::run_inspect(args),
        Mode::Check(args) => check::run_check(args),
        Mode::Run(args) => runner::run_documents(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        assert_eq!(run_cli_from_args(["runcode", "explode"]), 2);
    }

    #[test]
    fn missing_document_reports_error_result() {
        assert_eq!(
            run_cli_from_args(["runcode", "check", "--document", "/no/such/file.xml"]),
            1
        );
    }
}
