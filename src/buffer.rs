//! Fixed-capacity working window for the body-copy loop.
//!
//! One `Window` is reused for every part of a stream: bytes are appended at
//! the tail as the reader refills it and consumed from the head as they are
//! flushed downstream. Consuming compacts the remainder to the front rather
//! than reallocating, so the capacity chosen at construction is the memory
//! bound for the whole decode.

/// A bounded byte window with explicit fill and consume operations.
#[derive(Debug)]
pub struct Window {
    buf: Vec<u8>,
    filled: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.buf.len()
    }

    /// The currently buffered bytes.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// The writable tail of the window; pair with [`Window::advance`].
    pub fn free_space(&mut self) -> &mut [u8] {
        &mut self.buf[self.filled..]
    }

    /// Record `n` bytes written into [`Window::free_space`].
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.buf.len());
        self.filled += n;
    }

    /// Drop the first `n` buffered bytes, compacting the remainder to the
    /// front of the window.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.filled);
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }

    /// Logically empty the window without touching its allocation.
    pub fn clear(&mut self) {
        self.filled = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn append(window: &mut Window, bytes: &[u8]) {
        window.free_space()[..bytes.len()].copy_from_slice(bytes);
        window.advance(bytes.len());
    }

    #[test]
    fn test_fill_and_consume() {
        let mut window = Window::new(8);
        assert_eq!(window.capacity(), 8);
        assert!(window.is_empty());

        append(&mut window, b"abcdef");
        assert_eq!(window.len(), 6);
        assert_eq!(window.filled(), b"abcdef");
        assert!(!window.is_full());

        window.consume(2);
        assert_eq!(window.filled(), b"cdef");

        append(&mut window, b"ghij");
        assert_eq!(window.filled(), b"cdefghij");
        assert!(window.is_full());
    }

    #[test]
    fn test_consume_all_and_clear() {
        let mut window = Window::new(4);
        append(&mut window, b"abcd");

        window.consume(4);
        assert!(window.is_empty());

        append(&mut window, b"xy");
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 4);
    }

    #[test]
    fn test_consume_zero_is_noop() {
        let mut window = Window::new(4);
        append(&mut window, b"ab");
        window.consume(0);
        assert_eq!(window.filled(), b"ab");
    }
}
