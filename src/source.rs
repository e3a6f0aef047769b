use std::io::{self, Write};

const INITIAL_CAPACITY: usize = 4096;

/// a growable byte buffer attached to a typed object, used both for
/// in-memory reads (populated from the odb) and writes (populated by a
/// kind-specific serializer before being handed to the odb)
pub struct Source {
    data: Vec<u8>,
    written_bytes: usize,
    open: bool,
}

impl Source {
    pub fn new() -> Self {
        Self { data: Vec::with_capacity(INITIAL_CAPACITY), written_bytes: 0, open: true }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let written_bytes = bytes.len();
        Self { data: bytes, written_bytes, open: true }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn close(&mut self) {
        self.open = false;
        self.data.clear();
        self.written_bytes = 0;
    }

    pub fn closed(mut self) -> Self {
        self.close();
        self
    }

    /// bytes written so far, truncated to the logical length (the documented
    /// growth policy doubles capacity as needed; `Vec::extend_from_slice`
    /// already amortizes this, so no explicit doubling loop is needed here)
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.written_bytes]
    }

    pub fn written_bytes(&self) -> usize {
        self.written_bytes
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Source {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.truncate(self.written_bytes);
        self.data.extend_from_slice(buf);
        self.written_bytes += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_accumulate_and_are_readable_via_as_slice() {
        let mut source = Source::new();
        source.write_all(b"hello ").unwrap();
        source.write_all(b"world").unwrap();
        assert_eq!(source.as_slice(), b"hello world");
        assert_eq!(source.written_bytes(), 11);
    }

    #[test]
    fn close_clears_buffer_and_marks_not_open() {
        let mut source = Source::new();
        source.write_all(b"data").unwrap();
        source.close();
        assert!(!source.is_open());
        assert_eq!(source.written_bytes(), 0);
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut source = Source::new();
        let big = vec![0xABu8; INITIAL_CAPACITY * 3];
        source.write_all(&big).unwrap();
        assert_eq!(source.as_slice(), big.as_slice());
    }
}
