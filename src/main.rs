mod cli;
mod config;
mod downloader;
mod env_file;
mod error;
mod extractor;
mod materializer;
mod network;
mod orchestrator;
mod patcher;
mod probe;
mod process;
mod prompt;
mod sources;
mod templates;

use clap::Parser;
use cli::command::Cli;
use cli::install::run_install;
use colored::Colorize;
use env_logger::Env;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run_install(&cli).await {
        Ok(outcome) => log::debug!("Finished: {outcome:?}"),
        Err(e) => {
            log::debug!("Installation failed: {e:?}");
            eprintln!("{}", format!("❌ {e}").red());
            std::process::exit(1);
        }
    }
}
