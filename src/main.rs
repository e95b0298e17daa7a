use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use gsdl::cli::{self, Command};
use gsdl::commands;
use gsdl::logging::{self, Logger};

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Run(_) => "run",
        Command::List => "list",
        Command::Config => "config",
        Command::Version => "version",
    }
}

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    if matches!(args.command, Command::Version) {
        commands::version::run();
        return ExitCode::SUCCESS;
    }

    let name = command_name(&args.command);
    logging::init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));

    let result = match &args.command {
        Command::Run(opts) => commands::run::run(&args.global, opts, &log),
        Command::List => commands::list::run(&args.global, &log),
        Command::Config => commands::config::run(&args.global, &log),
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
