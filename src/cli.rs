use crate::error::AppError;
use clap::Parser;
use std::fs::{self, File};
use std::path::PathBuf;

// Defines the command-line interface using clap.
#[derive(Parser, Clone)]
#[command(
    version,
    about = "Decode multipart/form-data captures into individual files.",
    long_about = "Decodes byte streams encoded in the multipart/form-data convention into discrete output files, or lists the parts without extracting them.\n Intended for form submissions captured to disk, e.g. web-server request bodies saved verbatim.\n Each part's Content-Disposition filename names its output file; parts without one are numbered unnamed.<counter>.\n A malformed part aborts the current file only; remaining files in the batch are still processed."
)]
pub struct Cli {
    /// List parts and their byte counts without extracting them
    #[arg(short, long)]
    pub list: bool,

    /// Directory where extracted files are stored
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Enable verbose logging for debugging (log level: debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Multipart capture files to decode, processed in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Validate that the output directory exists and is writable.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.output_dir.exists() {
            return Err(AppError::DirectoryNotFound(
                self.output_dir.to_string_lossy().to_string(),
            ));
        }

        if !self.output_dir.is_dir() {
            return Err(AppError::NotADirectory(
                self.output_dir.to_string_lossy().to_string(),
            ));
        }

        // Probe writability with a scratch file rather than trusting
        // permission bits
        let test_file = self.output_dir.join(".formdec_write_test");
        match File::create(&test_file) {
            Ok(_) => {
                let _ = fs::remove_file(&test_file); // Ignore errors on cleanup
                Ok(())
            }
            Err(_) => Err(AppError::DirectoryNotWritable(
                self.output_dir.to_string_lossy().to_string(),
            )),
        }
    }
}
