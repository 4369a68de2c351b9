//! procrun-ctl: run a command with a deadline and report how it ended

mod cli;
mod logging;
mod runner;

use clap::Parser;
use cli::Cli;
use console::style;
use runner::{run_command, RunConfig, EXIT_FAILURE};

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        RunConfig {
            program: cli.program,
            args: cli.args,
            request: cli.request,
            dir: cli.dir,
            env: cli.env,
            timeout: cli.timeout,
            grace: cli.grace,
            stdin_file: cli.stdin_file,
            stream: cli.stream,
            json: cli.json,
            output: cli.output,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    match run_command(RunConfig::from(cli)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(EXIT_FAILURE);
        }
    }
}
