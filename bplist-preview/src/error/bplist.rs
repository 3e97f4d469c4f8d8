/*!
 Errors that can happen when decoding binary property list (`bplist00`) data.
*/

use std::fmt::{Display, Formatter, Result};

/// The class of a fatal decoding failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The container structure is malformed
    Format,
    /// A computed offset, length, or reference points outside the permitted region
    Bounds,
    /// A value needed for addressing does not fit in the safe integer range
    Range,
}

/// Errors that can happen when decoding a binary property list
///
/// Every variant aborts the whole decode; no partial document is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryPlistError {
    /// The buffer is too short to hold a header and a trailer
    TooShort(usize),
    /// The buffer does not start with `bplist00`
    InvalidSignature,
    /// The trailer declares a zero-width offset table entry
    InvalidOffsetSize,
    /// The trailer declares a zero-width object reference
    InvalidReferenceSize,
    /// The trailer declares a document without objects
    NoObjects,
    /// The top object index is not smaller than the object count
    InvalidTopObject(u64, u64),
    /// The offset table starts inside the header
    InvalidOffsetTable(u64),
    /// A fat length is not followed by an integer marker
    InvalidLengthMarker(u8),
    /// A read would end at the first index past the permitted region
    OutOfBounds(u64, u64),
    /// An object offset lies outside of the data region
    InvalidOffset(u64, u64),
    /// An object reference is not smaller than the object count
    InvalidReference(u64, u64),
    /// A size-like value exceeds the safe integer range
    UnsafeInteger(u128),
    /// Address arithmetic overflowed
    Overflow,
}

impl BinaryPlistError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BinaryPlistError::TooShort(_)
            | BinaryPlistError::InvalidSignature
            | BinaryPlistError::InvalidOffsetSize
            | BinaryPlistError::InvalidReferenceSize
            | BinaryPlistError::NoObjects
            | BinaryPlistError::InvalidTopObject(..)
            | BinaryPlistError::InvalidOffsetTable(_)
            | BinaryPlistError::InvalidLengthMarker(_) => ErrorKind::Format,
            BinaryPlistError::OutOfBounds(..)
            | BinaryPlistError::InvalidOffset(..)
            | BinaryPlistError::InvalidReference(..) => ErrorKind::Bounds,
            BinaryPlistError::UnsafeInteger(_) | BinaryPlistError::Overflow => ErrorKind::Range,
        }
    }
}

impl Display for BinaryPlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            BinaryPlistError::TooShort(len) => {
                write!(fmt, "Buffer of {len} bytes is too short for a binary plist!")
            }
            BinaryPlistError::InvalidSignature => write!(fmt, "Invalid bplist00 signature!"),
            BinaryPlistError::InvalidOffsetSize => {
                write!(fmt, "Trailer offset integer size must be positive!")
            }
            BinaryPlistError::InvalidReferenceSize => {
                write!(fmt, "Trailer object reference size must be positive!")
            }
            BinaryPlistError::NoObjects => write!(fmt, "Trailer declares no objects!"),
            BinaryPlistError::InvalidTopObject(top, count) => {
                write!(fmt, "Top object {top} is outside of object count {count}!")
            }
            BinaryPlistError::InvalidOffsetTable(offset) => {
                write!(fmt, "Offset table at {offset:x} overlaps the header!")
            }
            BinaryPlistError::InvalidLengthMarker(marker) => {
                write!(fmt, "Expected an integer length marker, got {marker:x}!")
            }
            BinaryPlistError::OutOfBounds(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            BinaryPlistError::InvalidOffset(object, offset) => {
                write!(
                    fmt,
                    "Object {object} has offset {offset:x} outside of the data region!"
                )
            }
            BinaryPlistError::InvalidReference(reference, count) => {
                write!(
                    fmt,
                    "Object reference {reference} is outside of object count {count}!"
                )
            }
            BinaryPlistError::UnsafeInteger(value) => {
                write!(fmt, "Value {value} exceeds the safe integer range!")
            }
            BinaryPlistError::Overflow => write!(fmt, "Address arithmetic overflowed!"),
        }
    }
}

impl std::error::Error for BinaryPlistError {}
