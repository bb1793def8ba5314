/// # formdec
///
/// A standalone decoder for multipart/form-data captures.
///
/// This library contains the core streaming decoder. The `run` function
/// parses command-line arguments and drives the per-file batch loop.
pub mod buffer;
pub mod cli;
pub mod decoder;
pub mod error;
pub mod headers;
pub mod naming;
pub mod reader;
pub mod search;

use crate::cli::Cli;
use crate::decoder::{DecodeOptions, Decoder};
use clap::Parser;
use log::{error, info};
use std::fs::File;
use std::io::BufReader;

/// Initializes the logger, parses command-line arguments, and decodes each
/// input file in order.
///
/// This is the main entry point for the application. The exit status
/// reflects only argument and configuration validation; per-file decode
/// failures are logged and the batch continues with the next file.
pub fn run() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = cli.validate() {
        error!("Configuration validation error: {e}");
        std::process::exit(1);
    }

    let mut options = DecodeOptions::new(cli.output_dir.clone());
    options.list_only = cli.list;

    // One decoder for the whole run so unnamed-part numbering stays unique
    // across the batch
    let mut decoder = Decoder::new(options);

    for path in &cli.files {
        info!("[{}]", path.display());

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                error!("Unable to open {}: {e}", path.display());
                continue;
            }
        };

        match decoder.decode(BufReader::new(file)) {
            Ok(summary) => {
                info!(
                    "{}: {} part(s), {} bytes",
                    path.display(),
                    summary.parts.len(),
                    summary.total_bytes()
                );
            }
            Err(e) => {
                error!("{}: {e}", path.display());
            }
        }
    }
}
