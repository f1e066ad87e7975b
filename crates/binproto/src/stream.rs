//! Sequential byte sink and source used by every codec

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{Error, Result};

/// Sequential byte buffer
///
/// `read` must either return exactly `len` bytes or fail without consuming anything.
pub trait Stream {
    /// Append bytes to the stream
    fn write(&mut self, bytes: &[u8]);

    /// Consume exactly `len` bytes from the front of the stream
    fn read(&mut self, len: usize) -> Result<Bytes>;
}

/// In-memory [`Stream`] backed by a [`BytesMut`]
#[derive(Debug, Default, Clone)]
pub struct BufferStream {
    buf: BytesMut,
}

impl BufferStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Unread bytes
    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Whether every byte has been consumed
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of unread bytes
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Take the unread bytes
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Stream for BufferStream {
    fn write(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    fn read(&mut self, len: usize) -> Result<Bytes> {
        if len > self.buf.len() {
            return Err(Error::OutOfBounds {
                requested: len,
                available: self.buf.len(),
            });
        }
        Ok(self.buf.split_to(len).freeze())
    }
}

impl From<Bytes> for BufferStream {
    fn from(bytes: Bytes) -> Self {
        Self {
            buf: BytesMut::from(&bytes[..]),
        }
    }
}

impl From<&[u8]> for BufferStream {
    fn from(bytes: &[u8]) -> Self {
        Self {
            buf: BytesMut::from(bytes),
        }
    }
}

impl From<Vec<u8>> for BufferStream {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(&bytes[..])
    }
}
