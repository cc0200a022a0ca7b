//! # Record Serialization
//!
//! Fixed-width little-endian field writers and readers.
//!
//! ## Design
//!
//! - Stack buffer, no heap allocation per record
//! - Every write reports overflow instead of panicking
//! - Every read returns `None` past the end of the buffer

/// Largest record on either channel, rounded up.
pub const MAX_RECORD_SIZE: usize = 64;

/// Writes fields into a fixed stack buffer.
pub struct RecordWriter {
    buffer: [u8; MAX_RECORD_SIZE],
    position: usize,
}

impl RecordWriter {
    /// Creates an empty writer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_RECORD_SIZE],
            position: 0,
        }
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    #[inline]
    fn put<const N: usize>(&mut self, bytes: [u8; N]) -> bool {
        if self.position + N > MAX_RECORD_SIZE {
            return false;
        }
        self.buffer[self.position..self.position + N].copy_from_slice(&bytes);
        self.position += N;
        true
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        self.put([value])
    }

    /// Writes `count` zero bytes.
    #[inline]
    pub fn write_padding(&mut self, count: usize) -> bool {
        (0..count).all(|_| self.write_u8(0))
    }

    /// Writes an i32 in little-endian format.
    #[inline]
    pub fn write_i32(&mut self, value: i32) -> bool {
        self.put(value.to_le_bytes())
    }

    /// Writes a f32 in little-endian format.
    #[inline]
    pub fn write_f32(&mut self, value: f32) -> bool {
        self.put(value.to_le_bytes())
    }

    /// Writes a f64 in little-endian format.
    #[inline]
    pub fn write_f64(&mut self, value: f64) -> bool {
        self.put(value.to_le_bytes())
    }
}

impl Default for RecordWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads fields from a borrowed buffer.
pub struct RecordReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> RecordReader<'a> {
    /// Creates a reader over `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.buffer.get(self.position..self.position + N)?;
        self.position += N;
        bytes.try_into().ok()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    /// Skips `count` bytes.
    #[inline]
    pub fn skip(&mut self, count: usize) -> Option<()> {
        if self.remaining() < count {
            return None;
        }
        self.position += count;
        Some(())
    }

    /// Reads an i32 in little-endian format.
    #[inline]
    pub fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    /// Reads a f32 in little-endian format.
    #[inline]
    pub fn read_f32(&mut self) -> Option<f32> {
        self.take().map(f32::from_le_bytes)
    }

    /// Reads a f64 in little-endian format.
    #[inline]
    pub fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }
}
