use arrayvec::ArrayVec;
use snafu::ensure;

use core::ops::Deref;

use crate::error::{BufferOverflowSnafu, Error};
use crate::layout::MAX_FRAME_LEN;

/// Caller-owned telegram buffer with a fixed capacity.
///
/// The bus never allocates; the same `Frame` is meant to be reused for every
/// receive or send call. Writes past the capacity fail with
/// [`Error::BufferOverflow`] instead of spilling over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame<const N: usize = MAX_FRAME_LEN> {
    data: ArrayVec<u8, N>,
}

impl<const N: usize> Frame<N> {
    pub fn new() -> Self {
        Self {
            data: ArrayVec::new(),
        }
    }

    /// Create a frame holding a copy of `bytes`.
    /// # Errors
    /// Returns [`Error::BufferOverflow`] if `bytes` doesn't fit.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let mut frame = Self::new();
        frame.extend_from_slice(bytes)?;
        Ok(frame)
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        self.data
            .try_push(byte)
            .map_err(|_| Error::BufferOverflow { capacity: N })
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.data
            .try_extend_from_slice(bytes)
            .map_err(|_| Error::BufferOverflow { capacity: N })
    }

    /// Grow with zeros or shrink to exactly `len` bytes.
    pub fn resize(&mut self, len: usize) -> Result<(), Error> {
        ensure!(len <= N, BufferOverflowSnafu { capacity: N });
        self.data.truncate(len);
        while self.data.len() < len {
            self.data.push(0);
        }
        Ok(())
    }

    /// Store `byte` at `index`, zero-filling any gap before it.
    pub fn set(&mut self, index: usize, byte: u8) -> Result<(), Error> {
        if index >= self.data.len() {
            self.resize(index + 1)?;
        }
        self.data[index] = byte;
        Ok(())
    }

    /// Store `bytes` starting at `index`, zero-filling any gap before it.
    pub fn set_slice(&mut self, index: usize, bytes: &[u8]) -> Result<(), Error> {
        let end = index + bytes.len();
        if end > self.data.len() {
            self.resize(end)?;
        }
        self.data[index..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.data.as_mut_slice()
    }
}

impl<const N: usize> Deref for Frame<N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data.as_slice()
    }
}

impl<const N: usize> AsRef<[u8]> for Frame<N> {
    fn as_ref(&self) -> &[u8] {
        self.data.as_slice()
    }
}
