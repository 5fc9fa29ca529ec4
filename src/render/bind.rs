use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::{Result, SqlsetError};
use crate::mapping::BindingDescriptor;
use crate::value::Value;

fn hex_digest<D: Digest>(input: &[u8]) -> String {
    hex::encode(D::digest(input))
}

/// Hashes `input` with the named algorithm, returning lowercase hex.
pub(crate) fn digest(algorithm: &str, input: &[u8]) -> Result<String> {
    let normalized: String = algorithm
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect::<String>()
        .to_ascii_uppercase();
    match normalized.as_str() {
        "SHA224" => Ok(hex_digest::<Sha224>(input)),
        "SHA256" => Ok(hex_digest::<Sha256>(input)),
        "SHA384" => Ok(hex_digest::<Sha384>(input)),
        "SHA512" => Ok(hex_digest::<Sha512>(input)),
        _ => Err(SqlsetError::transform(format!(
            "unsupported digest algorithm '{algorithm}'"
        ))),
    }
}

/// Applies the descriptor's parameter-side transforms to a resolved value.
///
/// Nulls pass through untouched.
pub(crate) fn prepare(descriptor: &BindingDescriptor, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(value);
    }
    let value = match descriptor.transforms().digest.as_deref() {
        Some(algorithm) => {
            let hashed = match &value {
                Value::Bytes(bytes) => digest(algorithm, bytes)?,
                other => digest(algorithm, other.to_text().as_bytes())?,
            };
            Value::String(hashed)
        }
        None => value,
    };
    match value {
        Value::String(text) if descriptor.size() > 0 => {
            let limit = descriptor.size() as usize;
            match text.char_indices().nth(limit) {
                Some((cut, _)) => Ok(Value::String(text[..cut].to_owned())),
                None => Ok(Value::String(text)),
            }
        }
        other => Ok(other),
    }
}
