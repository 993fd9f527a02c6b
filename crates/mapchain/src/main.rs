//! mapchain: compose, query and generate source maps.

mod cli;
mod commands;
mod config;
mod output;

use camino::Utf8Path;
use clap::Parser;
use cli::Args;
use config::Config;
use miette::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mapchain=debug,source_map=debug,code_writer=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::load(Utf8Path::new("."), args.config.as_deref());

    match commands::run(&args, &config) {
        Ok(output) => {
            if output.ends_with('\n') {
                print!("{}", output);
            } else if !output.is_empty() {
                println!("{}", output);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
