/*!
 Contains logic to decode a binary property list into a graph of [`RawObject`]s.

 Layout referenced from Apple's `CFBinaryPList.c`:
   - an 8 byte `bplist00` header
   - the objects, each starting with a marker byte whose high nibble is the type and low nibble
     is type-specific info
   - the offset table, mapping each object index to the position of its marker byte
   - a 32 byte trailer describing offset and reference widths, the object count, the root object,
     and where the offset table starts
*/

use std::rc::Rc;

use crate::{
    error::bplist::BinaryPlistError,
    util::{
        bplist::models::{
            Dictionary, RawObject, Trailer, HEADER_LENGTH, MAX_SAFE_INTEGER, SIGNATURE,
            TRAILER_LENGTH,
        },
        dates::apple_seconds_to_iso8601,
    },
};

/// `null`, `false`, or `true`, depending on the info nibble
const SIMPLE: u8 = 0x0;
/// Big-endian integer of `2^info` bytes
const INTEGER: u8 = 0x1;
/// Big-endian IEEE-754 float of `2^info` bytes
const REAL: u8 = 0x2;
/// Big-endian double counting seconds since 2001-01-01T00:00:00Z
const DATE: u8 = 0x3;
/// Raw bytes, with a fat length
const DATA: u8 = 0x4;
/// ASCII text, with a fat length counting bytes
const ASCII_STRING: u8 = 0x5;
/// UTF-16BE text, with a fat length counting code units
const UTF16_STRING: u8 = 0x6;
/// Unsigned integer of `info + 1` bytes
const UID: u8 = 0x8;
/// Object references, with a fat length
const ARRAY: u8 = 0xA;
/// Key references followed by value references, with a fat length counting entries
const DICTIONARY: u8 = 0xD;

/// Info nibble for `null`
const NULL: u8 = 0x0;
/// Info nibble for `false`
const FALSE: u8 = 0x8;
/// Info nibble for `true`
const TRUE: u8 = 0x9;
/// Info nibble indicating the length is stored in a following integer object
const FAT_LENGTH: u8 = 0xF;
/// Info nibble for an 8 byte date
const DATE_INFO: u8 = 0x3;
/// Objects nested deeper than this are replaced with a diagnostic instead of being decoded
pub const MAX_DECODE_DEPTH: usize = 256;

/// Contains logic and data used to decode a binary property list
///
/// All state is owned by the reader, so separate readers can run on separate threads
/// without any coordination.
#[derive(Debug)]
pub struct BinaryPlistReader<'a> {
    /// The binary property list we want to decode
    stream: &'a [u8],
    /// Document-level parameters, populated by [`BinaryPlistReader::parse`]
    trailer: Trailer,
    /// Byte position of each object, by index
    offsets: Vec<u64>,
    /// Completed objects, by index
    objects: Vec<Option<Rc<RawObject>>>,
    /// Objects on the current decoding path, by index
    in_progress: Vec<bool>,
    /// Number of objects on the current decoding path
    depth: usize,
}

impl<'a> BinaryPlistReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            trailer: Trailer::default(),
            offsets: vec![],
            objects: vec![],
            in_progress: vec![],
            depth: 0,
        }
    }

    /// The trailer read by the last call to [`BinaryPlistReader::parse`]
    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    /// Validate the container and decode the root object along with everything it references
    pub fn parse(&mut self) -> Result<Rc<RawObject>, BinaryPlistError> {
        self.validate_header()?;
        self.trailer = self.read_trailer()?;
        self.offsets = self.read_offset_table()?;

        self.objects = vec![None; self.offsets.len()];
        self.in_progress = vec![false; self.offsets.len()];
        self.depth = 0;

        self.decode(self.trailer.top_object)
    }

    /// Ensure the buffer can hold a header and a trailer and starts with the signature
    fn validate_header(&self) -> Result<(), BinaryPlistError> {
        if self.stream.len() < HEADER_LENGTH + TRAILER_LENGTH {
            return Err(BinaryPlistError::TooShort(self.stream.len()));
        }
        if !self.stream.starts_with(SIGNATURE) {
            return Err(BinaryPlistError::InvalidSignature);
        }
        Ok(())
    }

    /// Read and validate the last [`TRAILER_LENGTH`] bytes of the buffer
    fn read_trailer(&self) -> Result<Trailer, BinaryPlistError> {
        let trailer = &self.stream[self.stream.len() - TRAILER_LENGTH..];

        let offset_int_size = trailer[6];
        if offset_int_size == 0 {
            return Err(BinaryPlistError::InvalidOffsetSize);
        }
        let object_ref_size = trailer[7];
        if object_ref_size == 0 {
            return Err(BinaryPlistError::InvalidReferenceSize);
        }

        let num_objects = unsigned_from_be(&trailer[8..16])?;
        if num_objects == 0 {
            return Err(BinaryPlistError::NoObjects);
        }

        let top_object = unsigned_from_be(&trailer[16..24])?;
        if top_object >= num_objects {
            return Err(BinaryPlistError::InvalidTopObject(top_object, num_objects));
        }

        let offset_table_offset = unsigned_from_be(&trailer[24..32])?;
        if offset_table_offset < HEADER_LENGTH as u64 {
            return Err(BinaryPlistError::InvalidOffsetTable(offset_table_offset));
        }

        Ok(Trailer {
            sort_version: trailer[5],
            offset_int_size,
            object_ref_size,
            num_objects,
            top_object,
            offset_table_offset,
        })
    }

    /// Read the position of every object
    ///
    /// The whole table must fit before the trailer; this is checked before anything is allocated.
    fn read_offset_table(&self) -> Result<Vec<u64>, BinaryPlistError> {
        let width = u64::from(self.trailer.offset_int_size);
        let table_length = self
            .trailer
            .num_objects
            .checked_mul(width)
            .ok_or(BinaryPlistError::Overflow)?;
        let table = self.read_exact_bytes(self.trailer.offset_table_offset, table_length)?;

        table
            .chunks_exact(usize::from(self.trailer.offset_int_size))
            .map(unsigned_from_be)
            .collect()
    }

    /// The first index of the trailer; nothing at or past it is ever read as object data
    fn data_end(&self) -> u64 {
        self.stream.len().saturating_sub(TRAILER_LENGTH) as u64
    }

    /// Read exactly `n` bytes starting at `start`, never crossing into the trailer
    fn read_exact_bytes(&self, start: u64, n: u64) -> Result<&'a [u8], BinaryPlistError> {
        let end = start.checked_add(n).ok_or(BinaryPlistError::Overflow)?;
        let limit = self.data_end();
        if end > limit {
            return Err(BinaryPlistError::OutOfBounds(end, limit));
        }
        let stream = self.stream;
        stream
            .get(to_usize(start)?..to_usize(end)?)
            .ok_or(BinaryPlistError::OutOfBounds(end, limit))
    }

    /// Read the byte at `position`
    fn read_byte(&self, position: u64) -> Result<u8, BinaryPlistError> {
        Ok(self.read_exact_bytes(position, 1)?[0])
    }

    /// Read the length of a variable-size object
    ///
    /// Lengths below [`FAT_LENGTH`] are stored in the marker's info nibble. Otherwise, an integer
    /// object follows the marker; its info nibble gives the width as a power of two.
    ///
    /// Returns the length and the position of the first payload byte.
    fn read_length(&self, info: u8, position: u64) -> Result<(u64, u64), BinaryPlistError> {
        if info != FAT_LENGTH {
            return Ok((u64::from(info), position));
        }

        let marker = self.read_byte(position)?;
        if marker >> 4 != INTEGER {
            return Err(BinaryPlistError::InvalidLengthMarker(marker));
        }
        let width = 1u64 << (marker & 0x0F);
        let start = position + 1;
        let length = unsigned_from_be(self.read_exact_bytes(start, width)?)?;

        Ok((length, start + width))
    }

    /// Read `count` object references starting at `start`
    fn read_references(&self, start: u64, count: u64) -> Result<Vec<u64>, BinaryPlistError> {
        let width = self.trailer.object_ref_size;
        let length = count
            .checked_mul(u64::from(width))
            .ok_or(BinaryPlistError::Overflow)?;

        self.read_exact_bytes(start, length)?
            .chunks_exact(usize::from(width))
            .map(|chunk| {
                let reference = unsigned_from_be(chunk)?;
                if reference >= self.trailer.num_objects {
                    return Err(BinaryPlistError::InvalidReference(
                        reference,
                        self.trailer.num_objects,
                    ));
                }
                Ok(reference)
            })
            .collect()
    }

    /// Decode the object at `index`, or emit the already-decoded object
    ///
    /// An object that references itself, directly or through its members, gets a
    /// [`RawObject::Circular`] placeholder where the reference back to it would be.
    pub fn decode(&mut self, index: u64) -> Result<Rc<RawObject>, BinaryPlistError> {
        let slot = to_usize(index)?;
        match self.objects.get(slot) {
            Some(Some(object)) => return Ok(Rc::clone(object)),
            Some(None) => {}
            None => {
                return Err(BinaryPlistError::InvalidReference(
                    index,
                    self.trailer.num_objects,
                ))
            }
        }

        if self.in_progress[slot] {
            return Ok(Rc::new(RawObject::Circular(slot)));
        }
        if self.depth >= MAX_DECODE_DEPTH {
            return Ok(Rc::new(RawObject::Diagnostic(format!(
                "[Nesting deeper than {MAX_DECODE_DEPTH} objects]"
            ))));
        }

        self.in_progress[slot] = true;
        self.depth += 1;
        let result = self.read_object(slot);
        self.depth -= 1;
        self.in_progress[slot] = false;

        let object = Rc::new(result?);
        self.objects[slot] = Some(Rc::clone(&object));
        Ok(object)
    }

    /// Read the object whose marker byte is at the offset stored for `slot`
    fn read_object(&mut self, slot: usize) -> Result<RawObject, BinaryPlistError> {
        let offset = self.offsets[slot];
        if offset < HEADER_LENGTH as u64 || offset >= self.data_end() {
            return Err(BinaryPlistError::InvalidOffset(slot as u64, offset));
        }

        let marker = self.read_byte(offset)?;
        let tag = marker >> 4;
        let info = marker & 0x0F;
        let position = offset + 1;

        match tag {
            SIMPLE => Ok(match info {
                NULL => RawObject::Null,
                FALSE => RawObject::Bool(false),
                TRUE => RawObject::Bool(true),
                other => RawObject::Diagnostic(format!("[Unknown simple object {other:#x}]")),
            }),
            INTEGER => {
                let bytes = self.read_exact_bytes(position, 1u64 << info)?;
                Ok(integer_from_be(bytes))
            }
            REAL => match info {
                2 => {
                    let bytes = self.read_exact_bytes(position, 4)?;
                    Ok(RawObject::Real(f64::from(f32::from_be_bytes([
                        bytes[0], bytes[1], bytes[2], bytes[3],
                    ]))))
                }
                3 => Ok(RawObject::Real(self.read_double(position)?)),
                other => Ok(RawObject::Diagnostic(format!(
                    "[Unsupported real width of {} bytes]",
                    1u32 << other
                ))),
            },
            DATE => {
                if info != DATE_INFO {
                    return Ok(RawObject::Diagnostic(format!(
                        "[Invalid date marker {marker:#x}]"
                    )));
                }
                let seconds = self.read_double(position)?;
                Ok(match apple_seconds_to_iso8601(seconds) {
                    Some(date) => RawObject::Date(date),
                    None => RawObject::Diagnostic(format!("[Invalid date {seconds}]")),
                })
            }
            DATA => {
                let (length, start) = self.read_length(info, position)?;
                Ok(RawObject::data(self.read_exact_bytes(start, length)?))
            }
            ASCII_STRING => {
                let (length, start) = self.read_length(info, position)?;
                let bytes = self.read_exact_bytes(start, length)?;
                Ok(RawObject::String(String::from_utf8_lossy(bytes).into_owned()))
            }
            UTF16_STRING => {
                let (units, start) = self.read_length(info, position)?;
                let length = units.checked_mul(2).ok_or(BinaryPlistError::Overflow)?;
                let units: Vec<u16> = self
                    .read_exact_bytes(start, length)?
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                Ok(RawObject::String(String::from_utf16_lossy(&units)))
            }
            UID => {
                let bytes = self.read_exact_bytes(position, u64::from(info) + 1)?;
                let value = bytes
                    .iter()
                    .fold(0u128, |acc, byte| (acc << 8) | u128::from(*byte));
                Ok(RawObject::Uid(value.to_string()))
            }
            ARRAY => {
                let (count, start) = self.read_length(info, position)?;
                let references = self.read_references(start, count)?;

                let mut items = Vec::with_capacity(references.len());
                for reference in references {
                    items.push(self.decode(reference)?);
                }
                Ok(RawObject::Array(items))
            }
            DICTIONARY => {
                let (count, start) = self.read_length(info, position)?;
                let total = count.checked_mul(2).ok_or(BinaryPlistError::Overflow)?;
                let references = self.read_references(start, total)?;
                let (keys, values) = references.split_at(references.len() / 2);

                // Keys are decoded before any value
                let mut key_text = Vec::with_capacity(keys.len());
                for &key in keys {
                    key_text.push(self.decode(key)?.key_text());
                }

                let mut dictionary = Dictionary::with_capacity(keys.len());
                for (key, &value) in key_text.into_iter().zip(values) {
                    dictionary.insert(key, self.decode(value)?);
                }
                Ok(RawObject::Dictionary(dictionary))
            }
            other => Ok(RawObject::Diagnostic(format!(
                "[Unsupported object type {other:#x}]"
            ))),
        }
    }

    /// Read a big-endian double at `position`
    fn read_double(&self, position: u64) -> Result<f64, BinaryPlistError> {
        let bytes = self.read_exact_bytes(position, 8)?;
        Ok(f64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }
}

/// Decode a binary property list, returning its root object
pub fn parse_binary_plist(stream: &[u8]) -> Result<Rc<RawObject>, BinaryPlistError> {
    BinaryPlistReader::new(stream).parse()
}

/// Read a big-endian unsigned integer of any width used for addressing
///
/// Fails if the value exceeds [`MAX_SAFE_INTEGER`].
pub(crate) fn unsigned_from_be(bytes: &[u8]) -> Result<u64, BinaryPlistError> {
    let value = bytes
        .iter()
        .try_fold(0u128, |acc, byte| {
            acc.checked_mul(256)?.checked_add(u128::from(*byte))
        })
        .ok_or(BinaryPlistError::Overflow)?;

    if value > u128::from(MAX_SAFE_INTEGER) {
        return Err(BinaryPlistError::UnsafeInteger(value));
    }
    Ok(value as u64)
}

/// Interpret the payload of an integer object as big-endian two's complement, whatever its width
///
/// Values whose magnitude exceeds [`MAX_SAFE_INTEGER`] are kept as exact decimal text.
pub(crate) fn integer_from_be(bytes: &[u8]) -> RawObject {
    if bytes.len() > 16 {
        // Wide integers that are only sign extension above the low 16 bytes still fit in an i128
        let (high, low) = bytes.split_at(bytes.len() - 16);
        let fill = if bytes[0] & 0x80 != 0 { 0xFF } else { 0x00 };
        if high.iter().all(|byte| *byte == fill) && low[0] & 0x80 == fill & 0x80 {
            return integer_from_be(low);
        }
        return RawObject::BigInteger(signed_decimal(bytes));
    }

    let mut value: i128 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for byte in bytes {
        value = (value << 8) | i128::from(*byte);
    }
    if value.unsigned_abs() <= u128::from(MAX_SAFE_INTEGER) {
        RawObject::Integer(value as i64)
    } else {
        RawObject::BigInteger(value.to_string())
    }
}

/// Render a big-endian two's complement integer of any width as decimal text
fn signed_decimal(bytes: &[u8]) -> String {
    let negative = bytes.first().is_some_and(|byte| byte & 0x80 != 0);
    let mut magnitude = bytes.to_vec();

    if negative {
        let mut carry = true;
        for byte in magnitude.iter_mut().rev() {
            *byte = !*byte;
            if carry {
                let (sum, overflowed) = byte.overflowing_add(1);
                *byte = sum;
                carry = overflowed;
            }
        }
    }

    let digits = unsigned_decimal(&magnitude);
    if negative {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Render a big-endian unsigned integer of any width as decimal text, by repeated division
fn unsigned_decimal(magnitude: &[u8]) -> String {
    const CHUNK: u64 = 1_000_000_000;

    // Big-endian 32 bit limbs
    let mut padded = vec![0u8; (4 - magnitude.len() % 4) % 4];
    padded.extend_from_slice(magnitude);
    let mut limbs: Vec<u32> = padded
        .chunks_exact(4)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    // Least significant chunk first
    let mut chunks: Vec<u64> = vec![];
    let mut start = 0;
    loop {
        while limbs.get(start) == Some(&0) {
            start += 1;
        }
        if start == limbs.len() {
            break;
        }

        let mut remainder = 0u64;
        for limb in &mut limbs[start..] {
            let current = (remainder << 32) | u64::from(*limb);
            *limb = (current / CHUNK) as u32;
            remainder = current % CHUNK;
        }
        chunks.push(remainder);
    }

    match chunks.split_last() {
        None => "0".to_string(),
        Some((most_significant, rest)) => {
            let mut text = most_significant.to_string();
            rest.iter()
                .rev()
                .for_each(|chunk| text.push_str(&format!("{chunk:09}")));
            text
        }
    }
}

/// Convert an already-validated size into a slice index
fn to_usize(value: u64) -> Result<usize, BinaryPlistError> {
    usize::try_from(value).map_err(|_| BinaryPlistError::Overflow)
}
