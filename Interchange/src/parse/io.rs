//! Position-tracking stream adapters

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

/// A reader that knows its absolute position.
#[derive(Debug)]
pub struct CountingReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> CountingReader<R> {
    pub fn new(inner: R) -> Self {
        Self::starting_at(inner, 0)
    }

    /// Wrap a reader whose next byte sits at `position` in the file.
    pub fn starting_at(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf`, reporting a short read as [`Error::UnexpectedEof`].
    pub fn read_exact_or_eof(&mut self, buf: &mut [u8], context: &str) -> Result<()> {
        let start = self.position;
        self.read_exact(buf).map_err(|e| Error::from_read(e, start, context))
    }

    /// Read a 4-byte tag, or `None` if the stream ends cleanly before it.
    pub fn read_tag_or_end(&mut self) -> Result<Option<[u8; 4]>> {
        let start = self.position;
        let mut tag = [0u8; 4];
        let mut filled = 0;
        while filled < tag.len() {
            match self.read(&mut tag[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
        match filled {
            0 => Ok(None),
            4 => Ok(Some(tag)),
            _ => Err(Error::UnexpectedEof {
                offset: start,
                context: "chunk header".to_string(),
            }),
        }
    }

    /// Read exactly `length` bytes without trusting `length` for the allocation.
    pub fn read_owned(&mut self, length: u64, context: &str) -> Result<Vec<u8>> {
        let start = self.position;
        let mut bytes = Vec::new();
        self.by_ref().take(length).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != length {
            return Err(Error::UnexpectedEof {
                offset: start,
                context: context.to_string(),
            });
        }
        Ok(bytes)
    }

    /// Consume one byte if the stream has one; returns whether it did.
    pub fn skip_optional_byte(&mut self) -> Result<bool> {
        let mut pad = [0u8; 1];
        loop {
            match self.read(&mut pad) {
                Ok(n) => return Ok(n == 1),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

/// A writer that counts the bytes passed through it.
#[derive(Debug)]
pub struct CountingWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
