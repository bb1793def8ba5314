//! Output target resolution for decoded parts.
//!
//! Every part maps to one [`OutputTarget`]: a concrete path under the
//! configured output directory, or `Discard` when the part declared an
//! explicitly empty filename. Parts carrying no filename attribute at all are
//! named from a run-wide sequence counter, so unnamed parts stay unique even
//! across a batch of input files.

use crate::error::AppError;
use log::debug;
use std::path::PathBuf;

/// Where a part's body bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write (or, in list-only mode, count) body bytes for this path.
    File(PathBuf),
    /// The part declared `filename=""`; any body byte is a hard error.
    Discard,
}

/// Monotonically increasing counter for unnamed parts; scoped to one run and
/// never reset between input files.
#[derive(Debug, Default)]
pub struct SequenceCounter(u32);

impl SequenceCounter {
    pub fn next(&mut self) -> u32 {
        let n = self.0;
        self.0 += 1;
        n
    }
}

pub struct NameResolver {
    output_dir: PathBuf,
    list_only: bool,
    sequence: SequenceCounter,
}

impl NameResolver {
    pub fn new(output_dir: PathBuf, list_only: bool) -> Self {
        Self {
            output_dir,
            list_only,
            sequence: SequenceCounter::default(),
        }
    }

    /// Resolve the parsed `filename` attribute into an output target.
    ///
    /// `None` means the attribute was absent and a sequential name is
    /// synthesized; `Some("")` marks the part as discard; anything else is
    /// taken as the literal filename.
    pub fn resolve(&mut self, filename: Option<&str>) -> Result<OutputTarget, AppError> {
        let name = match filename {
            None => format!("unnamed.{:08x}", self.sequence.next()),
            Some("") => return Ok(OutputTarget::Discard),
            Some(name) => {
                Self::validate_filename(name)?;
                name.to_string()
            }
        };

        Ok(OutputTarget::File(self.unique_path(&name)))
    }

    /// Reject filenames that would escape the output directory.
    fn validate_filename(name: &str) -> Result<(), AppError> {
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(AppError::invalid_filename(name));
        }
        Ok(())
    }

    /// Find a path free of filesystem collisions by appending `.0`, `.1`, …
    /// to the name until one is unused.
    ///
    /// This check-then-act is non-atomic by design: the tool itself has no
    /// concurrency, and races against external writers are out of scope. In
    /// list-only mode nothing is created, so the check is skipped entirely.
    fn unique_path(&self, name: &str) -> PathBuf {
        let base = self.output_dir.join(name);
        if self.list_only || !base.exists() {
            return base;
        }

        let mut suffix = 0u32;
        loop {
            let candidate = self.output_dir.join(format!("{name}.{suffix}"));
            if !candidate.exists() {
                debug!("{} exists, using {}", base.display(), candidate.display());
                return candidate;
            }
            suffix += 1;
        }
    }
}
