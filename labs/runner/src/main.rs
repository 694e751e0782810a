//! `berry-labs <command> ...`: 每个命令对应一条线性图像处理流水线.

mod commands;
mod error;

use std::process::ExitCode;

use log::{debug, warn};
use utils::{Args, UsageError};

use crate::error::LabError;

fn print_commands() {
    eprintln!("Usage: berry-labs <command> [args...]");
    eprintln!();
    eprintln!("Commands:");
    for c in commands::COMMANDS {
        eprintln!("    {} {}", c.name, c.usage);
    }
}

fn main() -> ExitCode {
    utils::init_logger();

    let threads = utils::cpus();
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!("cannot configure the thread pool: {e}");
    }
    debug!("using {threads} threads");

    let mut args = Args::from_env();
    let Some(name) = args.next_opt() else {
        print_commands();
        return ExitCode::FAILURE;
    };
    let Some(command) = commands::find(&name) else {
        eprintln!("{}", UsageError::UnknownCommand(name));
        print_commands();
        return ExitCode::FAILURE;
    };

    match (command.run)(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(LabError::Usage(e)) => {
            eprintln!("{e}");
            eprintln!("Usage: berry-labs {} {}", command.name, command.usage);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error running `{}`: {e}", command.name);
            ExitCode::FAILURE
        }
    }
}
