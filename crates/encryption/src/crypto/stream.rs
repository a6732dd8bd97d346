//! Stream adapters that push bytes through a [`Transform`].
//!
//! [`CryptoWriter`] wraps a byte sink: everything written is transformed and
//! forwarded, and [`CryptoWriter::flush_final_block`] emits the padded tail.
//! [`CryptoReader`] wraps a byte source: reads pull from the source, transform
//! and hand back output, finalizing the transform once the source is drained.
//!
//! Cipher failures travel through `std::io` as [`io::ErrorKind::InvalidData`]
//! and convert back into a [`CipherError`] with `?`.

use std::io::{self, Read, Write};

use super::cipher::{CipherError, Transform};

const READ_CHUNK: usize = 4096;

/// Write-side adapter: transforms bytes on their way into `inner`.
pub struct CryptoWriter<W: Write> {
    inner: W,
    transform: Box<dyn Transform>,
    scratch: Vec<u8>,
    finalized: bool,
}

impl<W: Write> CryptoWriter<W> {
    pub fn new(inner: W, transform: Box<dyn Transform>) -> Self {
        Self {
            inner,
            transform,
            scratch: Vec::new(),
            finalized: false,
        }
    }

    /// Finalize the transform and write the last block to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Finalized`] if called twice, or the transform's
    /// or sink's error.
    pub fn flush_final_block(&mut self) -> Result<(), CipherError> {
        if self.finalized {
            return Err(CipherError::Finalized);
        }
        self.finalized = true;
        self.scratch.clear();
        self.transform.finalize(&mut self.scratch)?;
        self.inner.write_all(&self.scratch).map_err(CipherError::Io)?;
        self.inner.flush().map_err(CipherError::Io)
    }

    /// Give back the sink. Does not finalize.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CryptoWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.finalized {
            return Err(CipherError::Finalized.into());
        }
        self.scratch.clear();
        self.transform.update(buf, &mut self.scratch)?;
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Read-side adapter: transforms bytes pulled from `inner`.
pub struct CryptoReader<R: Read> {
    inner: R,
    transform: Box<dyn Transform>,
    ready: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl<R: Read> CryptoReader<R> {
    pub fn new(inner: R, transform: Box<dyn Transform>) -> Self {
        Self {
            inner,
            transform,
            ready: Vec::new(),
            pos: 0,
            finished: false,
        }
    }

    /// Refill `ready` until it has unread bytes or the transform is finalized.
    fn fill(&mut self) -> Result<(), CipherError> {
        let mut chunk = [0u8; READ_CHUNK];
        while self.pos >= self.ready.len() && !self.finished {
            self.ready.clear();
            self.pos = 0;

            let n = self.inner.read(&mut chunk).map_err(CipherError::Io)?;
            if n == 0 {
                self.finished = true;
                self.transform.finalize(&mut self.ready)?;
            } else {
                self.transform.update(&chunk[..n], &mut self.ready)?;
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for CryptoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill()?;
        let available = &self.ready[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}
