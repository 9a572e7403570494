use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cfgmodel",
    about = "Build a configuration model from the command line and inspect it",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log every store mutation to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Define keys, apply values, and show current and valid values
    Inspect(InspectArgs),
    /// Test a single value against a checker
    Check(CheckArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Define a key with its default value
    #[arg(long = "key", value_name = "NAME=DEFAULT")]
    pub keys: Vec<String>,

    /// Attach a checker to a defined key (any, nonempty, bool, int, port,
    /// range:MIN..MAX, float, float:MIN..MAX, oneof:A|B|C, not:SPEC)
    #[arg(long = "checker", value_name = "NAME=SPEC")]
    pub checkers: Vec<String>,

    /// Attach a value parser to a defined key (text, int, float, bool, json,
    /// list:KIND)
    #[arg(long = "parser", value_name = "NAME=KIND")]
    pub parsers: Vec<String>,

    /// Set the current value of a defined key
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub sets: Vec<String>,

    /// Reject values that fail their checker instead of storing them
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Checker spec, as accepted by `inspect --checker`
    pub checker: String,
    /// Value to test
    pub value: String,
}
