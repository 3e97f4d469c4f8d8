/*!
 Data structures used to represent decoded binary property list data.
*/

use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result},
    rc::Rc,
};

/// The signature every binary property list starts with
pub const SIGNATURE: &[u8; 8] = b"bplist00";
/// Length of the signature at the start of the buffer
pub const HEADER_LENGTH: usize = 8;
/// Length of the trailer at the end of the buffer
pub const TRAILER_LENGTH: usize = 32;
/// The largest integer that is exactly representable in a double, `2^53 - 1`
///
/// Sizes and offsets beyond this are rejected; decoded integers beyond this are kept as decimal
/// text.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;
/// The most bytes of a data blob shown in its hex preview
pub const MAX_HEX_PREVIEW_BYTES: usize = 64;
/// Appended to a hex preview that does not show every byte
pub const ELLIPSIS: &str = "…";

/// Document-level parameters read from the last 32 bytes of the buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trailer {
    /// Informational only
    pub sort_version: u8,
    /// Width of each entry in the offset table
    pub offset_int_size: u8,
    /// Width of each object reference inside arrays and dictionaries
    pub object_ref_size: u8,
    /// Number of objects, and entries in the offset table
    pub num_objects: u64,
    /// Index of the root object
    pub top_object: u64,
    /// Absolute position of the offset table
    pub offset_table_offset: u64,
}

/// Ordered text-keyed container where a repeated key replaces the earlier value in place
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, Rc<RawObject>)>,
    positions: HashMap<String, usize>,
}

impl Dictionary {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value, overwriting any previous value stored under the same key
    pub fn insert(&mut self, key: String, value: Rc<RawObject>) {
        match self.positions.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Rc<RawObject>> {
        self.positions
            .get(key)
            .and_then(|&position| self.entries.get(position))
            .map(|(_, value)| value)
    }

    /// Iterate over the entries in the order their keys were first seen
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<RawObject>)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single object decoded from the document
///
/// Container members are shared handles into the per-call object cache, so an object
/// referenced from several places is decoded once.
#[derive(Debug, Clone, PartialEq)]
pub enum RawObject {
    Null,
    Bool(bool),
    /// An integer whose magnitude is within [`MAX_SAFE_INTEGER`]
    Integer(i64),
    /// An integer too large to be represented exactly as a number, in decimal
    BigInteger(String),
    /// Single precision reals are widened
    Real(f64),
    /// An absolute timestamp in ISO-8601 format
    Date(String),
    /// A data blob, never stored in full
    Data {
        /// Exact byte length of the blob
        length: usize,
        /// Lowercase hex of at most [`MAX_HEX_PREVIEW_BYTES`] bytes, followed by [`ELLIPSIS`]
        /// if truncated
        preview: String,
    },
    /// A keyed-archiver object identifier, in decimal
    Uid(String),
    String(String),
    Array(Vec<Rc<RawObject>>),
    Dictionary(Dictionary),
    /// A reference back to an object that was still being decoded, carrying its index
    Circular(usize),
    /// A leaf that could not be interpreted; the rest of the document is still decoded
    Diagnostic(String),
}

impl RawObject {
    /// Build a data blob record from the full payload
    pub fn data(bytes: &[u8]) -> Self {
        let shown = &bytes[..bytes.len().min(MAX_HEX_PREVIEW_BYTES)];
        let mut preview = String::with_capacity(shown.len() * 2 + ELLIPSIS.len());
        shown
            .iter()
            .for_each(|byte| preview.push_str(&format!("{byte:02x}")));
        if shown.len() < bytes.len() {
            preview.push_str(ELLIPSIS);
        }
        Self::Data {
            length: bytes.len(),
            preview,
        }
    }

    /// Convert any object into the text used when it appears as a dictionary key
    pub fn key_text(&self) -> String {
        match self {
            RawObject::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

impl Display for RawObject {
    /// Containers are summarized rather than expanded, so the output stays bounded for any document
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            RawObject::Null => write!(fmt, "null"),
            RawObject::Bool(value) => write!(fmt, "{value}"),
            RawObject::Integer(value) => write!(fmt, "{value}"),
            RawObject::BigInteger(value) => write!(fmt, "{value}"),
            RawObject::Real(value) => write!(fmt, "{value}"),
            RawObject::Date(value) => write!(fmt, "{value}"),
            RawObject::Data { length, .. } => write!(fmt, "<data: {length} bytes>"),
            RawObject::Uid(value) => write!(fmt, "<uid: {value}>"),
            RawObject::String(value) => write!(fmt, "{value}"),
            RawObject::Array(items) => write!(fmt, "<array: {} items>", items.len()),
            RawObject::Dictionary(dictionary) => {
                write!(fmt, "<dictionary: {} keys>", dictionary.len())
            }
            RawObject::Circular(index) => write!(fmt, "[Circular reference to object {index}]"),
            RawObject::Diagnostic(why) => write!(fmt, "{why}"),
        }
    }
}
