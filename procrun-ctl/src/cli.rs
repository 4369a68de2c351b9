use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "procrun-ctl")]
#[command(version, long_about = None)]
#[command(about = "Run a command with a deadline and report how it ended")]
#[command(after_help = "EXAMPLES:
    procrun-ctl ls -l
    procrun-ctl --timeout 5 --stream -- sh -c 'echo hi; sleep 10'
    procrun-ctl --dir /etc --env LC_ALL=C ls
    procrun-ctl --stdin-file input.txt --json cat
    procrun-ctl --request job.json

EXIT STATUS:
    the child's exit code, 124 on timeout, 130 on interrupt, 1 otherwise
")]
pub struct Cli {
    /// Program to run
    #[arg(value_name = "PROGRAM", required_unless_present = "request")]
    pub program: Option<String>,

    /// Program arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Load the request from a JSON file
    #[arg(short, long, value_name = "FILE", conflicts_with = "program")]
    pub request: Option<PathBuf>,

    /// Working directory for the program
    #[arg(short, long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Extra environment entry (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Timeout in seconds (0 disables)
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Seconds between SIGTERM and SIGKILL after a timeout or interrupt
    #[arg(short, long, value_name = "SECONDS")]
    pub grace: Option<u64>,

    /// Feed this file to the program's standard input
    #[arg(long, value_name = "FILE")]
    pub stdin_file: Option<PathBuf>,

    /// Print output lines as they arrive
    #[arg(short, long)]
    pub stream: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write captured stdout to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
