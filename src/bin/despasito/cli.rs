use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Thermodynamic calculations with SAFT-γ group-contribution equations of state."
)]
pub struct Cli {
    /// Path to the JSON input file
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Output file, overrides `output_file` of the input file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a file in addition to the console output
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of threads used to evaluate the points of a calculation
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_arguments() {
        let cli = Cli::parse_from(["despasito", "input.json", "-vv", "-j", "4", "-o", "out.json"]);
        assert_eq!(cli.input, PathBuf::from("input.json"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        assert!(!cli.quiet);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["despasito", "input.json", "-q", "-v"]).is_err());
    }
}
