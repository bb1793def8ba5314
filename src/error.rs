// SPDX-License-Identifier: MIT

use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    DirectoryNotFound(String),
    NotADirectory(String),
    DirectoryNotWritable(String),
    // Structural errors, fatal for the current input file only
    InvalidBoundary(String),     // Contains the offending boundary line detail
    InvalidDisposition(String),  // Contains the non-form-data disposition value
    MissingDisposition,
    UnknownHeader(String),       // Contains the unrecognized header line
    UnsupportedEncoding(String), // Contains the rejected encoding value
    InvalidFilename(String),     // Contains the problematic filename
    UnexpectedData(String),      // Non-empty body where an empty part was declared
    UnexpectedEof(String),       // Contains what was being read when input ended
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "IO error: {err}"),
            AppError::DirectoryNotFound(path) => write!(f, "Directory not found: {path}"),
            AppError::NotADirectory(path) => write!(f, "Not a directory: {path}"),
            AppError::DirectoryNotWritable(path) => {
                write!(f, "Output directory not writable: {path}")
            }
            AppError::InvalidBoundary(detail) => write!(f, "Invalid boundary line: {detail}"),
            AppError::InvalidDisposition(value) => {
                write!(f, "Invalid Content-Disposition (not form-data): {value}")
            }
            AppError::MissingDisposition => write!(f, "No Content-Disposition, invalid part"),
            AppError::UnknownHeader(line) => write!(f, "Unknown header: {line}"),
            AppError::UnsupportedEncoding(value) => {
                write!(f, "Unsupported Content-Transfer-Encoding: {value}")
            }
            AppError::InvalidFilename(filename) => {
                write!(
                    f,
                    "Invalid filename '{filename}': contains illegal characters or path traversal"
                )
            }
            AppError::UnexpectedData(target) => {
                write!(f, "Non-empty data where an empty part was declared: {target}")
            }
            AppError::UnexpectedEof(context) => {
                write!(f, "Unexpected end of input while reading {context}")
            }
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl std::error::Error for AppError {}

// Convenience constructors for the structural error family
impl AppError {
    /// Creates an InvalidBoundary error
    pub fn invalid_boundary<S: Into<String>>(detail: S) -> Self {
        AppError::InvalidBoundary(detail.into())
    }

    /// Creates an InvalidDisposition error
    pub fn invalid_disposition<S: Into<String>>(value: S) -> Self {
        AppError::InvalidDisposition(value.into())
    }

    /// Creates an UnknownHeader error
    pub fn unknown_header<S: Into<String>>(line: S) -> Self {
        AppError::UnknownHeader(line.into())
    }

    /// Creates an UnsupportedEncoding error
    pub fn unsupported_encoding<S: Into<String>>(value: S) -> Self {
        AppError::UnsupportedEncoding(value.into())
    }

    /// Creates an InvalidFilename error
    pub fn invalid_filename<S: Into<String>>(filename: S) -> Self {
        AppError::InvalidFilename(filename.into())
    }

    /// Creates an UnexpectedData error
    pub fn unexpected_data<S: Into<String>>(target: S) -> Self {
        AppError::UnexpectedData(target.into())
    }

    /// Creates an UnexpectedEof error
    pub fn unexpected_eof<S: Into<String>>(context: S) -> Self {
        AppError::UnexpectedEof(context.into())
    }

    /// Checks if the error describes a malformed stream rather than an I/O
    /// or configuration failure
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AppError::InvalidBoundary(_)
                | AppError::InvalidDisposition(_)
                | AppError::MissingDisposition
                | AppError::UnknownHeader(_)
                | AppError::UnsupportedEncoding(_)
                | AppError::InvalidFilename(_)
                | AppError::UnexpectedData(_)
                | AppError::UnexpectedEof(_)
        )
    }
}
