use clap::Parser;
use std::process;
use wod_processor::cli::{self, Args};

fn main() {
    let args = Args::parse();

    if let Err(error) = cli::setup_logging(&args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }

    match cli::run(&args) {
        Ok(stats) => {
            if !args.quiet {
                cli::print_summary(&stats, args.io().output.as_deref());
            }
            process::exit(0);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
