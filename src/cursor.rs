//! Forward-only byte reader over a WOD cast stream.
//!
//! Casts are wrapped at fixed line widths and the archives mix CR/LF and
//! LF line endings, so every non-printable byte is noise between fields.
//! The cursor hands out printable bytes only and never rewinds.

use std::io::{BufRead, ErrorKind};

use crate::error::{Result, WodError};

/// Sequential reader yielding printable bytes
pub struct ByteCursor<R> {
    source: R,
    offset: u64,
    exhausted: bool,
}

impl<R: BufRead> ByteCursor<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            offset: 0,
            exhausted: false,
        }
    }

    /// Next printable byte, or `EndOfStream`
    pub fn next_byte(&mut self) -> Result<u8> {
        loop {
            let byte = self.raw_byte()?.ok_or(WodError::EndOfStream)?;
            if is_printable(byte) {
                return Ok(byte);
            }
        }
    }

    /// True once a read has hit the end of the source
    pub fn at_end(&self) -> bool {
        self.exhausted
    }

    /// Bytes consumed from the source so far, noise included
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Discard bytes through the next line feed or the end of the source
    pub fn skip_line(&mut self) -> Result<()> {
        while let Some(byte) = self.raw_byte()? {
            if byte == b'\n' {
                break;
            }
        }
        Ok(())
    }

    /// True when only line-ending noise remains before the end of the source
    pub fn only_noise_remains(&mut self) -> Result<bool> {
        loop {
            let buf = match self.source.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if buf.is_empty() {
                self.exhausted = true;
                return Ok(true);
            }
            let noise = buf.iter().take_while(|b| !is_printable(**b)).count();
            if noise < buf.len() {
                self.source.consume(noise);
                self.offset += noise as u64;
                return Ok(false);
            }
            let len = buf.len();
            self.source.consume(len);
            self.offset += len as u64;
        }
    }

    pub fn into_inner(self) -> R {
        self.source
    }

    fn raw_byte(&mut self) -> Result<Option<u8>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            let buf = match self.source.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let Some(&byte) = buf.first() else {
                self.exhausted = true;
                return Ok(None);
            };
            self.source.consume(1);
            self.offset += 1;
            return Ok(Some(byte));
        }
    }
}

/// Printable ASCII, space included
fn is_printable(byte: u8) -> bool {
    (0x20..=0x7e).contains(&byte)
}
