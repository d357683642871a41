use std::path::Path;

use clap::Parser;
use treeboard::cli::commands::Cli;
use treeboard::cli::handlers;
use treeboard::io::config_io;
use treeboard::logging;

fn main() {
    let cli = Cli::parse();

    // an unreadable config surfaces later as a command error
    let level = config_io::load_config(&config_io::config_path_for(Path::new(&cli.data)))
        .map(|c| c.log.level)
        .unwrap_or_else(|_| "warn".to_string());
    logging::init(&level);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
