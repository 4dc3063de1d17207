use serde_json::{Map, Value};

use crate::models::Error;

/// A type with its own canonical JSON form, carried through generic JSON
/// under a reserved single-key wrapper.
pub trait Portable: Sized {
    /// Reserved wrapper key marking a nested value of this type.
    const TAG: &'static str;

    fn to_portable(&self) -> Result<Value, Error>;

    fn from_portable(value: Value) -> Result<Self, Error>;
}

/// `{TAG: value.to_portable()}`
pub fn tag<T: Portable>(value: &T) -> Result<Value, Error> {
    let mut map = Map::with_capacity(1);
    map.insert(T::TAG.to_owned(), value.to_portable()?);
    Ok(Value::Object(map))
}

pub fn is_tagged<T: Portable>(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.contains_key(T::TAG),
        _ => false,
    }
}

/// Inverse of [`tag`]. Fails unless `value` is exactly `{TAG: ..}`.
pub fn untag<T: Portable>(value: Value) -> Result<T, Error> {
    match value {
        Value::Object(mut map) if map.len() == 1 => match map.remove(T::TAG) {
            Some(inner) => T::from_portable(inner),
            None => Err(Error::InvalidBatch(format!("missing {} tag", T::TAG))),
        },
        _ => Err(Error::InvalidBatch(format!("expected {} tag", T::TAG))),
    }
}
