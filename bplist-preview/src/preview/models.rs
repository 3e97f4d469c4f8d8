/*!
 The bounded tree produced by the normalizer and consumed by the renderer.
*/

use std::fmt::{Display, Formatter, Result};

use json::{object::Object, JsonValue};

/// A display-ready value whose size is bounded regardless of the source document
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Array(Vec<Normalized>),
    /// Key order follows the source document
    Object(Vec<(String, Normalized)>),
    /// Text that stands in for content that was omitted or could not be decoded
    Marker(String),
}

impl Normalized {
    /// Build a small descriptor record, such as the one used for data blobs
    pub(crate) fn descriptor(kind: &str, fields: Vec<(&str, Normalized)>) -> Self {
        let mut entries = Vec::with_capacity(fields.len() + 1);
        entries.push(("$type".to_string(), Normalized::String(kind.to_string())));
        entries.extend(
            fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        Normalized::Object(entries)
    }

    /// Convert into the [`json`] tree used for pretty printing
    pub fn to_json(&self) -> JsonValue {
        match self {
            Normalized::Null => JsonValue::Null,
            Normalized::Bool(value) => JsonValue::Boolean(*value),
            Normalized::Integer(value) => JsonValue::from(*value),
            Normalized::Real(value) => JsonValue::from(*value),
            Normalized::String(value) | Normalized::Marker(value) => {
                JsonValue::from(value.as_str())
            }
            Normalized::Array(items) => {
                JsonValue::Array(items.iter().map(Normalized::to_json).collect())
            }
            Normalized::Object(entries) => {
                let mut object = Object::with_capacity(entries.len());
                entries
                    .iter()
                    .for_each(|(key, value)| object.insert(key, value.to_json()));
                JsonValue::Object(object)
            }
        }
    }
}

impl Display for Normalized {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            Normalized::Null => write!(fmt, "null"),
            Normalized::Bool(value) => write!(fmt, "{value}"),
            Normalized::Integer(value) => write!(fmt, "{value}"),
            Normalized::Real(value) => write!(fmt, "{value}"),
            Normalized::String(value) | Normalized::Marker(value) => write!(fmt, "{value}"),
            Normalized::Array(items) => {
                write!(fmt, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(fmt, ", ")?;
                    }
                    write!(fmt, "{item}")?;
                }
                write!(fmt, "]")
            }
            Normalized::Object(entries) => {
                write!(fmt, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(fmt, ", ")?;
                    }
                    write!(fmt, "{key}: {value}")?;
                }
                write!(fmt, "}}")
            }
        }
    }
}
