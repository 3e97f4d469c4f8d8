/*!
Errors that can happen during the application's runtime
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
    path::PathBuf,
};

use bplist_preview::error::bplist::BinaryPlistError;

/// Errors that can happen during the application's runtime
#[derive(Debug)]
pub enum RuntimeError {
    InvalidOptions(String),
    CreateError(IoError, PathBuf),
    DiskError(IoError),
    ReadError(IoError, PathBuf),
    #[cfg(feature = "gzip")]
    GzipError(IoError),
    XzError(lzma_rs::error::Error),
    #[cfg(not(feature = "gzip"))]
    DecompressionUnavailable(&'static str),
    DecompressedTooLarge(u64),
    PreviewError(BinaryPlistError),
    Failures(usize),
}

impl Display for RuntimeError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RuntimeError::InvalidOptions(why) => write!(fmt, "Invalid options!\n{why}"),
            RuntimeError::CreateError(why, path) => write!(fmt, "{why}: {path:?}"),
            RuntimeError::DiskError(why) => write!(fmt, "{why}"),
            RuntimeError::ReadError(why, path) => write!(fmt, "Unable to read {path:?}: {why}"),
            #[cfg(feature = "gzip")]
            RuntimeError::GzipError(why) => write!(fmt, "Invalid gzip stream: {why}"),
            RuntimeError::XzError(why) => write!(fmt, "Invalid xz stream: {why}"),
            #[cfg(not(feature = "gzip"))]
            RuntimeError::DecompressionUnavailable(format) => write!(
                fmt,
                "Input is {format} compressed, but this build cannot decompress {format}"
            ),
            RuntimeError::DecompressedTooLarge(limit) => {
                write!(fmt, "Decompressed input is larger than {limit} bytes")
            }
            RuntimeError::PreviewError(why) => write!(fmt, "{why}"),
            RuntimeError::Failures(count) => write!(
                fmt,
                "{count} input{} could not be previewed",
                if *count == 1 { "" } else { "s" }
            ),
        }
    }
}
