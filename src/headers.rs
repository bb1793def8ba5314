//! Part header micro-parser.
//!
//! Consumes header lines from the reader until the blank terminator line and
//! produces the part's resolved [`OutputTarget`]. The accepted header set is
//! deliberately small: `Content-Disposition` is required and must declare
//! `form-data`; `Content-Type` is accepted and ignored; any
//! `Content-Transfer-Encoding` is rejected since only the identity encoding
//! is supported; every other header name is an error. A second
//! `Content-Disposition` simply overwrites the first resolution.

use crate::error::AppError;
use crate::naming::{NameResolver, OutputTarget};
use crate::reader::{ChunkReader, LineOutcome, MAX_LINE_LEN};
use crate::search;
use std::io::Read;

const FILENAME_ATTR: &[u8] = b"filename=\"";

/// Read one part's header block, up to and including the blank line.
pub fn read_part_headers<R: Read>(
    reader: &mut ChunkReader<R>,
    resolver: &mut NameResolver,
) -> Result<OutputTarget, AppError> {
    let mut target: Option<OutputTarget> = None;

    loop {
        let line = match reader.read_line(MAX_LINE_LEN)? {
            LineOutcome::EndOfInput => return Err(AppError::unexpected_eof("headers")),
            LineOutcome::Line(line) => line,
        };

        if line == b"\r\n" {
            break;
        }

        if let Some(value) = header_value(&line, "content-disposition") {
            target = Some(parse_disposition(value, resolver)?);
        } else if header_value(&line, "content-type").is_some() {
            // Accepted, value ignored
        } else if let Some(value) = header_value(&line, "content-transfer-encoding") {
            return Err(AppError::unsupported_encoding(lossy_trimmed(value)));
        } else {
            return Err(AppError::unknown_header(lossy_trimmed(&line)));
        }
    }

    target.ok_or(AppError::MissingDisposition)
}

/// Match `name:` case-insensitively at the start of `line` and return the
/// value with leading spaces and tabs stripped.
fn header_value<'a>(line: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let name = name.as_bytes();
    if line.len() <= name.len() || line[name.len()] != b':' {
        return None;
    }
    if !line[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }

    let mut value = &line[name.len() + 1..];
    while let Some((&first, rest)) = value.split_first() {
        if first == b' ' || first == b'\t' {
            value = rest;
        } else {
            break;
        }
    }
    Some(value)
}

fn parse_disposition(
    value: &[u8],
    resolver: &mut NameResolver,
) -> Result<OutputTarget, AppError> {
    const FORM_DATA: &[u8] = b"form-data;";
    if value.len() < FORM_DATA.len() || !value[..FORM_DATA.len()].eq_ignore_ascii_case(FORM_DATA) {
        return Err(AppError::invalid_disposition(lossy_trimmed(value)));
    }

    // The filename is taken literally up to the next quote; escaped quotes
    // are not recognized, matching the wire format this tool targets.
    let filename = search::find(value, FILENAME_ATTR).map(|pos| {
        let rest = &value[pos + FILENAME_ATTR.len()..];
        let name = match rest.iter().position(|&b| b == b'"') {
            Some(quote) => &rest[..quote],
            None => trim_line_end(rest),
        };
        String::from_utf8_lossy(name).into_owned()
    });

    resolver.resolve(filename.as_deref())
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn lossy_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(trim_line_end(bytes)).into_owned()
}
