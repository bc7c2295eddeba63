mod cli;
mod logging;

use clap::Parser;

use crate::cli::Args;

#[tokio::main]
async fn main() {
    logging::init_logging_stderr();

    let args = Args::parse();
    if let Err(err) = cli::run(args).await {
        eprintln!("nav-inject error: {:#}", err);
        std::process::exit(1);
    }
}
