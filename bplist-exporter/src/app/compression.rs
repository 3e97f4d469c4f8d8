/*!
 Detects and removes outer compression before preview bytes reach the decoder.
*/

use std::io::{self, Write};
#[cfg(feature = "gzip")]
use std::io::Read;

use crate::app::error::RuntimeError;

/// Largest decompressed payload that will be handed to the decoder
pub const MAX_DECOMPRESSED_SIZE: u64 = 64 * 1024 * 1024;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// The outer container wrapping a preview payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Xz,
}

impl Compression {
    /// Determine the compression from the leading magic bytes
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if bytes.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else {
            Compression::None
        }
    }
}

/// Strip any outer compression from `bytes`
pub fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>, RuntimeError> {
    decompress_with_limit(bytes, MAX_DECOMPRESSED_SIZE)
}

pub(crate) fn decompress_with_limit(bytes: Vec<u8>, limit: u64) -> Result<Vec<u8>, RuntimeError> {
    match Compression::detect(&bytes) {
        Compression::None => Ok(bytes),
        Compression::Gzip => gunzip(&bytes, limit),
        Compression::Xz => unxz(&bytes, limit),
    }
}

#[cfg(feature = "gzip")]
fn gunzip(bytes: &[u8], limit: u64) -> Result<Vec<u8>, RuntimeError> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(bytes)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(RuntimeError::GzipError)?;

    if out.len() as u64 > limit {
        return Err(RuntimeError::DecompressedTooLarge(limit));
    }
    Ok(out)
}

#[cfg(not(feature = "gzip"))]
fn gunzip(_: &[u8], _: u64) -> Result<Vec<u8>, RuntimeError> {
    Err(RuntimeError::DecompressionUnavailable("gzip"))
}

fn unxz(mut bytes: &[u8], limit: u64) -> Result<Vec<u8>, RuntimeError> {
    let mut out = LimitedWriter::new(limit);
    let result = lzma_rs::xz_decompress(&mut bytes, &mut out);

    if out.exceeded {
        return Err(RuntimeError::DecompressedTooLarge(limit));
    }
    result.map_err(RuntimeError::XzError)?;
    Ok(out.buffer)
}

/// A growable buffer that refuses writes past `limit` bytes
struct LimitedWriter {
    buffer: Vec<u8>,
    limit: u64,
    exceeded: bool,
}

impl LimitedWriter {
    fn new(limit: u64) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
            exceeded: false,
        }
    }
}

impl Write for LimitedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.buffer.len() as u64 + buf.len() as u64 > self.limit {
            self.exceeded = true;
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                "decompressed size limit reached",
            ));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
