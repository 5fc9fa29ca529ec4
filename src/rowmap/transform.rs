//! Column value transforms applied while materialising rows.
//!
//! Order for one column: textual types decrypt (when a cipher is set) or
//! convert encodings; boolean types use the 1/0 convention; everything else
//! goes through generic coercion.

use aes::cipher::{block_padding::Pkcs7, BlockCipher, BlockDecryptMut, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use encoding_rs::{Encoding, UTF_8};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::error::{Result, SqlsetError};
use crate::mapping::{BindingDescriptor, ValueTransforms, ValueType};
use crate::value::Value;

/// Transforms a raw column value according to the descriptor.
pub(crate) fn apply(descriptor: &BindingDescriptor, raw: Value) -> Result<Value> {
    if raw.is_null() {
        return Ok(raw);
    }
    let Some(ty) = descriptor.effective_type() else {
        return Ok(raw);
    };
    let transforms = descriptor.transforms();
    if ty.is_textual() {
        if let Some(cipher) = transforms.cipher.as_deref() {
            return decrypt(cipher, transforms, &raw).map(Value::String);
        }
        if let Some(encoding) = transforms.encoding.as_deref() {
            return convert_encoding(encoding, &raw).map(Value::String);
        }
    }
    if ty.is_boolean() {
        return Ok(Value::Bool(int_or_zero(&raw) == 1));
    }
    coerce(&ty, raw, transforms.pattern.as_deref())
}

fn int_or_zero(raw: &Value) -> i64 {
    match raw {
        Value::Int(v) => *v,
        Value::Bool(b) => i64::from(*b),
        Value::Float(f) if f.is_finite() => *f as i64,
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn raw_bytes(raw: &Value) -> Vec<u8> {
    match raw {
        Value::Bytes(bytes) => bytes.clone(),
        other => other.to_text().into_bytes(),
    }
}

/// Decrypts an AES/ECB/PKCS#7 column. The raw value is hex or base64 text
/// per `encoding`, otherwise its bytes are used as-is.
pub(crate) fn decrypt(cipher: &str, transforms: &ValueTransforms, raw: &Value) -> Result<String> {
    let mut parts = cipher.split('/').map(|p| p.trim().to_ascii_uppercase());
    let algorithm = parts.next().unwrap_or_default();
    let mode = parts.next().unwrap_or_else(|| "ECB".to_owned());
    let padding = parts.next().unwrap_or_else(|| "PKCS5PADDING".to_owned());
    if algorithm != "AES" || mode != "ECB" || !matches!(padding.as_str(), "PKCS5PADDING" | "PKCS7PADDING") {
        return Err(SqlsetError::transform(format!("unsupported cipher '{cipher}'")));
    }
    if let Some(key_alg) = transforms.cipher_key_alg.as_deref() {
        if !key_alg.trim().eq_ignore_ascii_case("AES") {
            return Err(SqlsetError::transform(format!(
                "cipher key algorithm '{key_alg}' does not match AES"
            )));
        }
    }
    let key_hex = transforms
        .cipher_key
        .as_deref()
        .ok_or_else(|| SqlsetError::transform("cipher configured without cipherKey"))?;
    let key = hex::decode(key_hex.trim())
        .map_err(|err| SqlsetError::transform(format!("cipher key is not hex: {err}")))?;

    let data = match transforms.encoding.as_deref().map(str::trim) {
        Some(enc) if enc.eq_ignore_ascii_case("HEX") => hex::decode(raw.to_text().trim())
            .map_err(|err| SqlsetError::transform(format!("invalid hex payload: {err}")))?,
        Some(enc) if enc.eq_ignore_ascii_case("BASE64") => STANDARD
            .decode(raw.to_text().trim())
            .map_err(|err| SqlsetError::transform(format!("invalid base64 payload: {err}")))?,
        _ => raw_bytes(raw),
    };

    let plain = match key.len() {
        16 => decrypt_with::<Aes128>(&key, &data)?,
        24 => decrypt_with::<Aes192>(&key, &data)?,
        32 => decrypt_with::<Aes256>(&key, &data)?,
        n => {
            return Err(SqlsetError::transform(format!(
                "AES key must be 16, 24 or 32 bytes, got {n}"
            )))
        }
    };
    String::from_utf8(plain)
        .map_err(|err| SqlsetError::transform(format!("decrypted value is not UTF-8: {err}")))
}

fn decrypt_with<C>(key: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockDecryptMut + KeyInit,
{
    ecb::Decryptor::<C>::new_from_slice(key)
        .map_err(|err| SqlsetError::transform(format!("invalid AES key: {err}")))?
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| SqlsetError::transform("AES decryption failed: bad padding"))
}

fn encoding_for(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| SqlsetError::transform(format!("unknown character encoding '{label}'")))
}

/// Re-decodes text. `FROM>TO` encodes with FROM and decodes as TO; a single
/// label decodes the UTF-8 bytes as that label.
pub(crate) fn convert_encoding(spec: &str, raw: &Value) -> Result<String> {
    let (from, to) = match spec.split_once('>') {
        Some((from, to)) => (encoding_for(from)?, encoding_for(to)?),
        None => (UTF_8, encoding_for(spec)?),
    };
    let bytes = match raw {
        Value::Bytes(bytes) => bytes.clone(),
        other => {
            let text = other.to_text();
            let (encoded, _, _) = from.encode(&text);
            encoded.into_owned()
        }
    };
    let (decoded, _, _) = to.decode(&bytes);
    Ok(decoded.into_owned())
}

fn coerce_int(ty: &ValueType, raw: &Value) -> Result<Value> {
    let wide = match raw {
        Value::Int(v) => *v,
        Value::Bool(b) => i64::from(*b),
        Value::Float(f) if f.is_finite() => f.trunc() as i64,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => v,
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(|| SqlsetError::transform(format!("'{s}' is not a number")))?,
            }
        }
        other => {
            return Err(SqlsetError::transform(format!(
                "cannot convert {} to {ty}",
                other.type_name()
            )))
        }
    };
    match ty.integral_range() {
        Some((min, max)) if wide < min || wide > max => Err(SqlsetError::transform(format!(
            "{wide} is out of range for {ty}"
        ))),
        _ => Ok(Value::Int(wide)),
    }
}

fn coerce_float(ty: &ValueType, raw: &Value) -> Result<Value> {
    match raw {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(v) => Ok(Value::Float(*v as f64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| SqlsetError::transform(format!("'{s}' is not a number"))),
        other => Err(SqlsetError::transform(format!(
            "cannot convert {} to {ty}",
            other.type_name()
        ))),
    }
}

fn coerce_bool(raw: &Value) -> Result<Value> {
    match raw {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::Int(v) => Ok(Value::Bool(*v != 0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "y" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "n" | "no" | "0" | "" => Ok(Value::Bool(false)),
            _ => Err(SqlsetError::transform(format!("'{s}' is not a boolean"))),
        },
        other => Err(SqlsetError::transform(format!(
            "cannot convert {} to Boolean",
            other.type_name()
        ))),
    }
}

fn nanos(dt: OffsetDateTime) -> Value {
    Value::DateTime(dt.unix_timestamp_nanos())
}

/// Parses a date/time string. With a pattern (time crate format description
/// syntax) the value is parsed as a date-time or a date at midnight, in UTC.
/// Without one RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` are tried.
pub(crate) fn parse_datetime(text: &str, pattern: Option<&str>) -> Result<Value> {
    let text = text.trim();
    if let Some(pattern) = pattern {
        let format = time::format_description::parse(pattern)
            .map_err(|err| SqlsetError::transform(format!("invalid date pattern '{pattern}': {err}")))?;
        if let Ok(dt) = PrimitiveDateTime::parse(text, &format) {
            return Ok(nanos(dt.assume_utc()));
        }
        return Date::parse(text, &format)
            .map(|d| nanos(d.midnight().assume_utc()))
            .map_err(|err| SqlsetError::transform(format!("'{text}' does not match '{pattern}': {err}")));
    }
    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(nanos(dt));
    }
    let datetime = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(text, &datetime) {
        return Ok(nanos(dt.assume_utc()));
    }
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map(|d| nanos(d.midnight().assume_utc()))
        .map_err(|_| SqlsetError::transform(format!("'{text}' is not a recognised date")))
}

/// Generic coercion to the declared language type.
pub(crate) fn coerce(ty: &ValueType, raw: Value, pattern: Option<&str>) -> Result<Value> {
    match ty {
        ValueType::String | ValueType::Locale => Ok(Value::String(raw.to_text())),
        ValueType::Byte | ValueType::Short | ValueType::Int | ValueType::Long => coerce_int(ty, &raw),
        ValueType::Float | ValueType::Double | ValueType::Decimal => coerce_float(ty, &raw),
        ValueType::Boolean => coerce_bool(&raw),
        ValueType::Date => match raw {
            Value::DateTime(_) => Ok(raw),
            // epoch milliseconds
            Value::Int(ms) => Ok(Value::DateTime(i128::from(ms) * 1_000_000)),
            Value::String(ref s) => parse_datetime(s, pattern),
            other => Err(SqlsetError::transform(format!(
                "cannot convert {} to Date",
                other.type_name()
            ))),
        },
        ValueType::Bytes => match raw {
            Value::Bytes(_) => Ok(raw),
            Value::String(s) => Ok(Value::Bytes(s.into_bytes())),
            other => Err(SqlsetError::transform(format!(
                "cannot convert {} to Bytes",
                other.type_name()
            ))),
        },
        ValueType::Object
        | ValueType::Map
        | ValueType::List
        | ValueType::Collection
        | ValueType::Iterator
        | ValueType::ResultSet
        | ValueType::Array(_) => Ok(raw),
    }
}
