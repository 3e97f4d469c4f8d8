/*!
 Walks a decoded object graph into a [`Normalized`] tree whose depth, width, string lengths,
 and overall rendered size are bounded.
*/

use std::{collections::HashSet, rc::Rc};

use crate::{
    preview::{
        models::Normalized, MAX_ARRAY_ITEMS, MAX_DEPTH, MAX_OBJECT_KEYS, MAX_RENDERED_LENGTH,
        MAX_STRING_LENGTH,
    },
    util::bplist::models::{Dictionary, RawObject, ELLIPSIS},
};

/// Replaces any value nested deeper than [`MAX_DEPTH`]
pub const DEPTH_MARKER: &str = "[Max depth reached]";
/// Replaces a container found inside itself
pub const CIRCULAR_MARKER: &str = "[Circular reference]";
/// Replaces values that would start past [`MAX_RENDERED_LENGTH`]
pub const LIMIT_MARKER: &str = "[Preview limit reached]";

/// Per-walk state for building a [`Normalized`] tree
#[derive(Debug, Default)]
pub struct Normalizer {
    /// Containers on the current path, by identity
    ancestors: HashSet<*const RawObject>,
    /// Lower bound on the characters the tree emitted so far renders as
    rendered: usize,
}

impl Normalizer {
    /// Normalize `object`, found `depth` levels below the root
    ///
    /// Once the rendered estimate reaches [`MAX_RENDERED_LENGTH`], the walk stops descending:
    /// anything emitted past that point would be cut by the renderer anyway.
    pub fn walk(&mut self, object: &Rc<RawObject>, depth: usize) -> Normalized {
        if self.exhausted() {
            return self.leaf(Normalized::Marker(LIMIT_MARKER.to_string()));
        }
        if depth > MAX_DEPTH {
            return self.leaf(Normalized::Marker(DEPTH_MARKER.to_string()));
        }

        let value = match object.as_ref() {
            RawObject::Array(items) => return self.walk_array(object, items, depth),
            RawObject::Dictionary(dictionary) => {
                return self.walk_dictionary(object, dictionary, depth)
            }
            RawObject::Null => Normalized::Null,
            RawObject::Bool(value) => Normalized::Bool(*value),
            RawObject::Integer(value) => Normalized::Integer(*value),
            RawObject::BigInteger(value) => Normalized::String(truncate_string(value)),
            RawObject::Real(value) if value.is_finite() => Normalized::Real(*value),
            RawObject::Real(value) => Normalized::String(non_finite_text(*value).to_string()),
            RawObject::Date(value) => Normalized::String(truncate_string(value)),
            RawObject::String(value) => Normalized::String(truncate_string(value)),
            RawObject::Data { length, preview } => Normalized::descriptor(
                "data",
                vec![
                    (
                        "length",
                        Normalized::Integer(i64::try_from(*length).unwrap_or(i64::MAX)),
                    ),
                    ("preview", Normalized::String(preview.clone())),
                ],
            ),
            RawObject::Uid(value) => Normalized::descriptor(
                "uid",
                vec![("value", Normalized::String(truncate_string(value)))],
            ),
            RawObject::Circular(_) => Normalized::Marker(object.to_string()),
            RawObject::Diagnostic(why) => Normalized::Marker(truncate_string(why)),
        };
        self.leaf(value)
    }

    fn walk_array(
        &mut self,
        object: &Rc<RawObject>,
        items: &[Rc<RawObject>],
        depth: usize,
    ) -> Normalized {
        let identity = Rc::as_ptr(object);
        if !self.ancestors.insert(identity) {
            return self.leaf(Normalized::Marker(CIRCULAR_MARKER.to_string()));
        }
        // Brackets
        self.charge(2);

        let mut out = Vec::with_capacity(items.len().min(MAX_ARRAY_ITEMS) + 1);
        let mut limited = false;
        for item in items.iter().take(MAX_ARRAY_ITEMS) {
            if self.exhausted() {
                out.push(self.leaf(Normalized::Marker(LIMIT_MARKER.to_string())));
                limited = true;
                break;
            }
            self.charge(indent_width(depth + 1));
            out.push(self.walk(item, depth + 1));
        }
        if !limited && items.len() > MAX_ARRAY_ITEMS {
            let more = format!("{ELLIPSIS} +{} more items", items.len() - MAX_ARRAY_ITEMS);
            out.push(self.leaf(Normalized::Marker(more)));
        }

        self.ancestors.remove(&identity);
        Normalized::Array(out)
    }

    fn walk_dictionary(
        &mut self,
        object: &Rc<RawObject>,
        dictionary: &Dictionary,
        depth: usize,
    ) -> Normalized {
        let identity = Rc::as_ptr(object);
        if !self.ancestors.insert(identity) {
            return self.leaf(Normalized::Marker(CIRCULAR_MARKER.to_string()));
        }
        // Braces
        self.charge(2);

        let mut out = Vec::with_capacity(dictionary.len().min(MAX_OBJECT_KEYS) + 1);
        // Truncation can map distinct keys onto the same text
        let mut seen = HashSet::new();
        let mut limited = false;
        for (key, value) in dictionary.iter().take(MAX_OBJECT_KEYS) {
            let key = unique_key(&mut seen, truncate_string(key));
            if self.exhausted() {
                out.push((key, self.leaf(Normalized::Marker(LIMIT_MARKER.to_string()))));
                limited = true;
                break;
            }
            self.charge(indent_width(depth + 1) + entry_width(&key));
            out.push((key, self.walk(value, depth + 1)));
        }
        if !limited && dictionary.len() > MAX_OBJECT_KEYS {
            let more = format!(
                "{ELLIPSIS} +{} more keys",
                dictionary.len() - MAX_OBJECT_KEYS
            );
            let more = unique_key(&mut seen, more);
            self.charge(entry_width(&more));
            out.push((more, self.leaf(Normalized::Marker("[truncated]".to_string()))));
        }

        self.ancestors.remove(&identity);
        Normalized::Object(out)
    }

    fn exhausted(&self) -> bool {
        self.rendered >= MAX_RENDERED_LENGTH
    }

    fn charge(&mut self, width: usize) {
        self.rendered = self.rendered.saturating_add(width);
    }

    /// Account for a value that will not be walked any further
    fn leaf(&mut self, value: Normalized) -> Normalized {
        self.charge(rendered_width(&value));
        value
    }
}

/// Normalize a decoded root object
pub fn normalize(root: &Rc<RawObject>) -> Normalized {
    Normalizer::default().walk(root, 0)
}

/// Fewest characters `value` can pretty print as, ignoring indentation and escapes
fn rendered_width(value: &Normalized) -> usize {
    match value {
        Normalized::Null | Normalized::Bool(_) => 4,
        Normalized::Integer(_) | Normalized::Real(_) => 1,
        Normalized::String(text) | Normalized::Marker(text) => text.chars().count() + 2,
        Normalized::Array(items) => 2 + items.iter().map(rendered_width).sum::<usize>(),
        Normalized::Object(entries) => {
            2 + entries
                .iter()
                .map(|(key, value)| entry_width(key) + rendered_width(value))
                .sum::<usize>()
        }
    }
}

/// A newline and two spaces per level before each item
fn indent_width(depth: usize) -> usize {
    1 + 2 * depth
}

/// Quotes, colon, and space around an object key
fn entry_width(key: &str) -> usize {
    key.chars().count() + 4
}

/// Suffix `key` with a counter until it differs from every key already in the object
fn unique_key(seen: &mut HashSet<String>, key: String) -> String {
    if seen.insert(key.clone()) {
        return key;
    }
    let mut count = 2;
    loop {
        let candidate = format!("{key} ({count})");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        count += 1;
    }
}

/// Text for reals that have no JSON number form
fn non_finite_text(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Keep at most [`MAX_STRING_LENGTH`] characters, noting how many were dropped
fn truncate_string(text: &str) -> String {
    match text.char_indices().nth(MAX_STRING_LENGTH) {
        None => text.to_string(),
        Some((cut, _)) => {
            let omitted = text[cut..].chars().count();
            format!("{}{ELLIPSIS} [+{omitted} chars]", &text[..cut])
        }
    }
}
