mod commands;
mod helpers;

use clap::Parser;
use goldiff_core::domain::GoldiffError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_goldiff_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            eprintln!("{}", diagnostic.fatal_exit_line());
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("goldiff".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "goldiff",
    version,
    about = "Tolerant comparison of produced output files against golden files"
)]
struct Cli {
    /// Log comparison decisions at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compare two files as sorted line sets, ignoring line order
    Lines(commands::LinesArgs),
    /// Compare two CSV files position by position with numeric tolerance
    Csv(commands::CsvArgs),
    /// Run fixture regression comparisons
    Regression(commands::RegressionArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Lines(args) => commands::run_lines_command(args),
        CliCommand::Csv(args) => commands::run_csv_command(args),
        CliCommand::Regression(args) => commands::run_regression_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compare(GoldiffError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_goldiff_error(&self) -> GoldiffError {
        match self {
            Self::Usage(message) => {
                GoldiffError::input_validation("INPUT.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compare(error) => error.clone(),
            Self::Internal(error) => GoldiffError::internal("SYS.CLI", format!("{error:#}")),
        }
    }
}
