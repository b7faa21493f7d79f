use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "runcode")]
#[command(about = "Inspect, compile and run RunCode elements of behavior documents")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    #[command(about = "Print the engine elements and the synthesized compilation unit")]
    Inspect(InspectArgs),
    #[command(about = "Compile every document and report diagnostics")]
    Check(CheckArgs),
    #[command(about = "Tick every engine element in document order")]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub(crate) struct SourceArgs {
    #[arg(long = "document")]
    pub(crate) document: String,
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct InspectArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[arg(long = "max-ticks", default_value_t = 1000)]
    pub(crate) max_ticks: usize,
}
