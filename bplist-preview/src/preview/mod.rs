/*!
 Bounded, human-readable previews of binary property lists.

 A preview is produced in three stages: the [decoder](crate::util::bplist) builds an object graph,
 the [normalizer](normalize) bounds it, and the [renderer](render) pretty prints it. Each stage
 is usable on its own.

 ```
 use bplist_preview::preview::render_preview_or_fallback;

 let preview = render_preview_or_fallback(b"not a property list");
 assert_eq!(preview, "Unable to parse this preview");
 ```
*/

use crate::{
    error::bplist::BinaryPlistError,
    preview::{normalize::normalize, render::render},
    util::bplist::parser::parse_binary_plist,
};

pub mod models;
pub mod normalize;
pub mod render;

/// Containers nested deeper than this are replaced with a marker
pub const MAX_DEPTH: usize = 14;
/// Arrays show at most this many items
pub const MAX_ARRAY_ITEMS: usize = 240;
/// Dictionaries show at most this many keys
pub const MAX_OBJECT_KEYS: usize = 240;
/// Strings show at most this many characters
pub const MAX_STRING_LENGTH: usize = 8000;
/// Rendered text is cut after this many characters
pub const MAX_RENDERED_LENGTH: usize = 220_000;
/// Shown in place of a preview when the document cannot be decoded
pub const FALLBACK_MESSAGE: &str = "Unable to parse this preview";

/// Decode, normalize, and render a binary property list
pub fn render_preview(stream: &[u8]) -> Result<String, BinaryPlistError> {
    let root = parse_binary_plist(stream)?;
    Ok(render(&normalize(&root)))
}

/// Like [`render_preview`], but any failure yields [`FALLBACK_MESSAGE`]
pub fn render_preview_or_fallback(stream: &[u8]) -> String {
    render_preview(stream).unwrap_or_else(|_| FALLBACK_MESSAGE.to_string())
}
