//! Bounded line and chunk reading over an arbitrary byte source.
//!
//! `ChunkReader` wraps any [`Read`] impl and exposes the two operations the
//! decoder needs: a length-bounded `read_line` for boundary and header lines,
//! and `fill` to top up the working window for body copying. End of input is
//! a distinct outcome rather than an error, so every read site matches on
//! exactly the cases that can occur.
//!
//! `unread` hands bytes back to the stream. After a body copy locates the
//! delimiter, the still-buffered tail is pushed back so the boundary's own
//! line can be re-read through `read_line`; this replaces a seek on the
//! underlying source and therefore works on non-seekable inputs too.

use crate::buffer::Window;
use crate::error::AppError;
use std::collections::VecDeque;
use std::io::Read;

/// Length bound for boundary and header lines.
pub const MAX_LINE_LEN: usize = 8192;

/// Outcome of a bounded line read.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// A line including its terminator, or a partial line cut short by the
    /// length bound or by end of input.
    Line(Vec<u8>),
    /// The source was already exhausted before any byte was read.
    EndOfInput,
}

pub struct ChunkReader<R> {
    inner: R,
    pushback: VecDeque<u8>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushback: VecDeque::new(),
        }
    }

    /// Read bytes up to and including the next `\n`, or until `max_len - 1`
    /// bytes have been consumed, whichever comes first.
    ///
    /// End of input before any byte yields [`LineOutcome::EndOfInput`]; end
    /// of input mid-line yields the partial line, which callers reject when
    /// they require a terminated one.
    pub fn read_line(&mut self, max_len: usize) -> Result<LineOutcome, AppError> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        while line.len() + 1 < max_len {
            let n = self.read_raw(&mut byte)?;
            if n == 0 {
                if line.is_empty() {
                    return Ok(LineOutcome::EndOfInput);
                }
                break;
            }
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }

        Ok(LineOutcome::Line(line))
    }

    /// Append bytes into `window` until it is full or the source is
    /// exhausted; returns the number of bytes appended.
    ///
    /// Short reads from the source are normal and looped over here, so a
    /// window that is not full afterwards means true end of input.
    pub fn fill(&mut self, window: &mut Window) -> Result<usize, AppError> {
        let mut appended = 0;

        while !window.is_full() {
            let n = self.read_raw(window.free_space())?;
            if n == 0 {
                break;
            }
            window.advance(n);
            appended += n;
        }

        Ok(appended)
    }

    /// Push `bytes` back onto the stream; the next read sees them first, in
    /// the given order, before anything from the underlying source.
    pub fn unread(&mut self, bytes: &[u8]) {
        for &b in bytes.iter().rev() {
            self.pushback.push_front(b);
        }
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize, AppError> {
        if buf.is_empty() {
            return Ok(0);
        }

        if !self.pushback.is_empty() {
            let n = buf.len().min(self.pushback.len());
            for (slot, b) in buf[..n].iter_mut().zip(self.pushback.drain(..n)) {
                *slot = b;
            }
            return Ok(n);
        }

        self.inner.read(buf).map_err(AppError::Io)
    }
}
