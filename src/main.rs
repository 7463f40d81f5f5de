//! Runscope CLI entry point.

use clap::Parser;

use runscope::cli::{commands, handle_error, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    match commands::execute(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => handle_error(err, json),
    }
}
