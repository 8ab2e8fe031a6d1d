//! Outbound side: model values → wire JSON.
//!
//! Every model type derives or implements `Serialize` in wire shape, so these
//! are thin wrappers that fold serializer failures into the crate error.

use serde::Serialize;
use serde_json::Value;

use crate::Result;

pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Compact JSON bytes, ready for a request body.
pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}
