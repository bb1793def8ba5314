//! Streaming multipart/form-data decoder.
//!
//! The orchestrator fixes the boundary from the stream's first line, then
//! loops: parse one part's headers, stream its body into the resolved sink,
//! and re-read the boundary line to decide between the next part and the
//! `--`-suffixed terminator.
//!
//! The body copier is the part with real correctness risk. The delimiter is
//! matched with a leading CRLF prepended (it is always preceded by the line
//! terminator of the previous block) and may straddle two reads of the
//! source. The working window handles that with a withholding rule: when a
//! full window holds no match, only the first half of its capacity is
//! flushed, so any delimiter split across the refill point stays buffered
//! long enough to be seen whole. This requires the CRLF-prefixed delimiter to
//! be shorter than half the window capacity, which is checked up front
//! instead of assumed.

use crate::buffer::Window;
use crate::error::AppError;
use crate::headers;
use crate::naming::{NameResolver, OutputTarget};
use crate::reader::{ChunkReader, LineOutcome, MAX_LINE_LEN};
use crate::search;
use log::{info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

/// Default working window capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Report parts and byte counts without creating any files.
    pub list_only: bool,
    /// Directory prefixed to every resolved output path; assumed writable.
    pub output_dir: PathBuf,
    /// Capacity of the sliding window used while copying bodies.
    pub buffer_capacity: usize,
}

impl DecodeOptions {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            list_only: false,
            output_dir,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// One decoded part: its resolved path (`None` for discard-marked parts) and
/// exact body byte count. Counts are identical in list-only and extraction
/// modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub target: Option<PathBuf>,
    pub bytes: u64,
}

/// Result of decoding one input stream.
#[derive(Debug, Default)]
pub struct DecodeSummary {
    pub parts: Vec<PartRecord>,
    /// True when the `--`-suffixed terminator was reached; false for empty
    /// input or a stream that ended before the terminator.
    pub terminated: bool,
}

impl DecodeSummary {
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.bytes).sum()
    }
}

/// The boundary fixed from the stream's first line, stored in its
/// CRLF-prefixed matching form.
struct Boundary {
    delim: Vec<u8>,
}

impl Boundary {
    /// Fix the boundary from the first line of the stream. The line must be
    /// CRLF-terminated and non-empty, and the CRLF-prefixed delimiter must
    /// fit the window's withholding rule.
    fn from_first_line(line: &[u8], window_capacity: usize) -> Result<Self, AppError> {
        let text = line
            .strip_suffix(b"\r\n")
            .ok_or_else(|| AppError::invalid_boundary("missing CRLF terminator"))?;
        if text.is_empty() {
            return Err(AppError::invalid_boundary("empty boundary"));
        }

        let mut delim = Vec::with_capacity(text.len() + 2);
        delim.extend_from_slice(b"\r\n");
        delim.extend_from_slice(text);

        if delim.len() >= window_capacity / 2 {
            return Err(AppError::invalid_boundary(format!(
                "{} bytes does not fit half the {window_capacity}-byte window",
                text.len()
            )));
        }

        Ok(Self { delim })
    }

    /// The CRLF-prefixed form matched inside bodies.
    fn delimiter(&self) -> &[u8] {
        &self.delim
    }

    /// The boundary line's own text, without the CRLF prefix.
    fn text(&self) -> &[u8] {
        &self.delim[2..]
    }

    /// True when `line` is the stream terminator: the boundary text suffixed
    /// with `--` and its CRLF.
    fn is_terminator(&self, line: &[u8]) -> bool {
        line.len() == self.text().len() + 4
            && line.starts_with(self.text())
            && line.ends_with(b"--\r\n")
    }
}

/// Destination for one part's body bytes.
enum PartSink {
    File(File),
    /// List-only mode: count bytes, create nothing.
    Count,
    /// Discard-marked part: any positive write is a hard error.
    Discard,
}

impl PartSink {
    fn write(&mut self, bytes: &[u8]) -> Result<u64, AppError> {
        if bytes.is_empty() {
            return Ok(0);
        }
        match self {
            PartSink::Discard => Err(AppError::unexpected_data(format!(
                "{} bytes in part declared with filename=\"\"",
                bytes.len()
            ))),
            PartSink::Count => Ok(bytes.len() as u64),
            PartSink::File(file) => {
                file.write_all(bytes)?;
                Ok(bytes.len() as u64)
            }
        }
    }
}

/// How a body copy ended.
#[derive(Debug, PartialEq, Eq)]
enum BodyEnd {
    /// The delimiter was located; the boundary line is queued for re-reading.
    Delimiter,
    /// The source ran out before any delimiter appeared.
    EndOfInput,
}

/// Decoder state shared across every file of one run: the options and the
/// sequence counter for unnamed parts (threaded through the resolver, never
/// reset between files).
pub struct Decoder {
    options: DecodeOptions,
    resolver: NameResolver,
}

impl Decoder {
    pub fn new(options: DecodeOptions) -> Self {
        let resolver = NameResolver::new(options.output_dir.clone(), options.list_only);
        Self { options, resolver }
    }

    /// Decode one multipart stream.
    ///
    /// Empty input ends cleanly with an empty summary. End of input after a
    /// completed body, while looking for the next boundary line, is reported
    /// and stops this stream without escalating to an error. Structural
    /// violations and I/O failures abort the stream with `Err`.
    pub fn decode<R: Read>(&mut self, input: R) -> Result<DecodeSummary, AppError> {
        let mut reader = ChunkReader::new(input);
        let mut window = Window::new(self.options.buffer_capacity);
        let mut summary = DecodeSummary::default();

        let first = match reader.read_line(MAX_LINE_LEN)? {
            LineOutcome::EndOfInput => {
                info!("empty input");
                return Ok(summary);
            }
            LineOutcome::Line(line) => line,
        };
        let boundary = Boundary::from_first_line(&first, window.capacity())?;

        loop {
            let target = headers::read_part_headers(&mut reader, &mut self.resolver)?;
            let mut sink = self.open_sink(&target)?;
            let (bytes, end) = copy_body(&mut reader, &mut window, &boundary, &mut sink)?;
            drop(sink);

            match &target {
                OutputTarget::File(path) => {
                    info!("{} ({bytes} bytes)", path.display());
                    summary.parts.push(PartRecord {
                        target: Some(path.clone()),
                        bytes,
                    });
                }
                OutputTarget::Discard => {
                    summary.parts.push(PartRecord {
                        target: None,
                        bytes,
                    });
                }
            }

            if end == BodyEnd::EndOfInput {
                warn!("premature end of input while looking for boundary");
                return Ok(summary);
            }

            // Re-read the boundary's own line to check for the terminator
            match reader.read_line(MAX_LINE_LEN)? {
                LineOutcome::EndOfInput => {
                    warn!("premature end of input while looking for boundary");
                    return Ok(summary);
                }
                LineOutcome::Line(line) => {
                    if boundary.is_terminator(&line) {
                        summary.terminated = true;
                        return Ok(summary);
                    }
                }
            }
        }
    }

    fn open_sink(&self, target: &OutputTarget) -> Result<PartSink, AppError> {
        Ok(match target {
            OutputTarget::Discard => PartSink::Discard,
            OutputTarget::File(_) if self.options.list_only => PartSink::Count,
            OutputTarget::File(path) => PartSink::File(File::create(path)?),
        })
    }
}

/// Stream body bytes into `sink` until the delimiter is located, leaving the
/// reader positioned at the start of the boundary's own line.
fn copy_body<R: Read>(
    reader: &mut ChunkReader<R>,
    window: &mut Window,
    boundary: &Boundary,
    sink: &mut PartSink,
) -> Result<(u64, BodyEnd), AppError> {
    let mut copied = 0u64;
    window.clear();

    loop {
        reader.fill(window)?;
        // fill stops short of capacity only at true end of input
        let exhausted = !window.is_full();

        match search::find(window.filled(), boundary.delimiter()) {
            Some(offset) => {
                copied += sink.write(&window.filled()[..offset])?;
                window.consume(offset);
                debug_assert!(window.filled().starts_with(boundary.delimiter()));
                // Hand everything after the delimiter's leading CRLF back to
                // the reader so the boundary line is the next thing read.
                reader.unread(&window.filled()[2..]);
                window.clear();
                return Ok((copied, BodyEnd::Delimiter));
            }
            None if exhausted => {
                copied += sink.write(window.filled())?;
                window.clear();
                return Ok((copied, BodyEnd::EndOfInput));
            }
            None => {
                // Withholding rule: flush only the first half of the
                // capacity so a delimiter straddling the refill point is
                // never split. Since the full window held no match, any
                // partial occurrence starts inside the retained half.
                let keep = window.capacity() / 2;
                debug_assert!(window.len() >= keep);
                let flush = window.len() - keep;
                copied += sink.write(&window.filled()[..flush])?;
                window.consume(flush);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> DecodeOptions {
        DecodeOptions::new(dir.path().to_path_buf())
    }

    fn single_part(boundary: &str, headers: &str, body: &[u8]) -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(boundary.as_bytes());
        stream.extend_from_slice(b"\r\n");
        stream.extend_from_slice(headers.as_bytes());
        stream.extend_from_slice(b"\r\n");
        stream.extend_from_slice(body);
        stream.extend_from_slice(b"\r\n");
        stream.extend_from_slice(boundary.as_bytes());
        stream.extend_from_slice(b"--\r\n");
        stream
    }

    #[test]
    fn test_single_part_extraction() {
        let dir = TempDir::new().unwrap();
        let stream = single_part(
            "----X",
            "Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n",
            b"hello",
        );

        let mut decoder = Decoder::new(options(&dir));
        let summary = decoder.decode(Cursor::new(stream)).unwrap();

        assert!(summary.terminated);
        assert_eq!(summary.parts.len(), 1);
        assert_eq!(summary.parts[0].bytes, 5);
        assert_eq!(
            std::fs::read(dir.path().join("a.txt")).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_empty_input_ends_cleanly() {
        let dir = TempDir::new().unwrap();
        let mut decoder = Decoder::new(options(&dir));
        let summary = decoder.decode(Cursor::new(Vec::new())).unwrap();

        assert!(summary.parts.is_empty());
        assert!(!summary.terminated);
    }

    #[test]
    fn test_discard_part_with_empty_body() {
        let dir = TempDir::new().unwrap();
        let stream = single_part(
            "----X",
            "Content-Disposition: form-data; name=\"f\"; filename=\"\"\r\n",
            b"",
        );

        let mut decoder = Decoder::new(options(&dir));
        let summary = decoder.decode(Cursor::new(stream)).unwrap();

        assert!(summary.terminated);
        assert_eq!(
            summary.parts,
            vec![PartRecord {
                target: None,
                bytes: 0
            }]
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_discard_part_with_body_is_fatal() {
        let dir = TempDir::new().unwrap();
        let stream = single_part(
            "----X",
            "Content-Disposition: form-data; name=\"f\"; filename=\"\"\r\n",
            b"unexpected",
        );

        let mut decoder = Decoder::new(options(&dir));
        let result = decoder.decode(Cursor::new(stream));
        assert!(matches!(result, Err(AppError::UnexpectedData(_))));
    }

    #[test]
    fn test_boundary_longer_than_half_window_is_rejected() {
        let dir = TempDir::new().unwrap();
        let boundary = format!("--{}", "b".repeat(40));
        let stream = single_part(
            &boundary,
            "Content-Disposition: form-data; filename=\"a\"\r\n",
            b"data",
        );

        let mut opts = options(&dir);
        opts.buffer_capacity = 64;
        let mut decoder = Decoder::new(opts);
        let result = decoder.decode(Cursor::new(stream));
        assert!(matches!(result, Err(AppError::InvalidBoundary(_))));
    }

    #[test]
    fn test_delimiter_straddles_refill_midpoint() {
        // Capacity 64 flushes 32 bytes per cycle; place the delimiter so it
        // straddles every multiple of 32 in turn.
        let dir = TempDir::new().unwrap();
        let delimiter_len = "\r\n----X".len();

        for split in 1..delimiter_len {
            for cycle in [32usize, 64, 96] {
                let body_len = cycle - split;
                let body: Vec<u8> = (0..body_len).map(|i| (i % 251) as u8).collect();
                let stream = single_part(
                    "----X",
                    "Content-Disposition: form-data; name=\"f\"; filename=\"s.bin\"\r\n",
                    &body,
                );

                let mut opts = options(&dir);
                opts.buffer_capacity = 64;
                opts.list_only = true;
                let mut decoder = Decoder::new(opts);
                let summary = decoder.decode(Cursor::new(stream)).unwrap();

                assert!(summary.terminated, "split {split} cycle {cycle}");
                assert_eq!(
                    summary.parts[0].bytes, body_len as u64,
                    "split {split} cycle {cycle}"
                );
            }
        }
    }

    #[test]
    fn test_body_containing_boundary_lookalikes() {
        let dir = TempDir::new().unwrap();
        // Prefixes of the delimiter and the bare text must not end the part
        let body = b"----X almost\r\n----Y\r\n---\x00-X binary \xff\x00 tail";
        let stream = single_part(
            "----X",
            "Content-Disposition: form-data; name=\"f\"; filename=\"look.bin\"\r\n",
            body,
        );

        let mut decoder = Decoder::new(options(&dir));
        let summary = decoder.decode(Cursor::new(stream)).unwrap();

        assert!(summary.terminated);
        assert_eq!(summary.parts[0].bytes, body.len() as u64);
        assert_eq!(
            std::fs::read(dir.path().join("look.bin")).unwrap(),
            body.to_vec()
        );
    }

    #[test]
    fn test_premature_eof_after_body_is_soft() {
        let dir = TempDir::new().unwrap();
        let mut stream = Vec::new();
        stream.extend_from_slice(b"----X\r\n");
        stream.extend_from_slice(
            b"Content-Disposition: form-data; name=\"f\"; filename=\"cut.txt\"\r\n\r\n",
        );
        stream.extend_from_slice(b"body without terminator");

        let mut decoder = Decoder::new(options(&dir));
        let summary = decoder.decode(Cursor::new(stream)).unwrap();

        assert!(!summary.terminated);
        assert_eq!(summary.parts.len(), 1);
        assert_eq!(summary.parts[0].bytes, 23);
        assert_eq!(
            std::fs::read(dir.path().join("cut.txt")).unwrap(),
            b"body without terminator"
        );
    }

    #[test]
    fn test_unnamed_counter_spans_streams() {
        let dir = TempDir::new().unwrap();
        let stream = single_part(
            "----X",
            "Content-Disposition: form-data; name=\"f\"\r\n",
            b"one",
        );

        let mut decoder = Decoder::new(options(&dir));
        decoder.decode(Cursor::new(stream.clone())).unwrap();
        decoder.decode(Cursor::new(stream)).unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("unnamed.00000000")).unwrap(),
            b"one"
        );
        assert_eq!(
            std::fs::read(dir.path().join("unnamed.00000001")).unwrap(),
            b"one"
        );
    }
}
