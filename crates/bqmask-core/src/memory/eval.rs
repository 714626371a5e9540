//! Local evaluation of masking transforms.
//!
//! Mirrors the warehouse functions closely enough to check masking
//! properties. The fingerprint is the first 8 bytes of SHA-256, not FarmHash,
//! so values differ from what the warehouse would produce.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bqmask_model::{ColumnType, FingerprintOutput, TransformExpression};
use sha2::{Digest, Sha256};

use super::value::Value;

/// 64-bit fingerprint of `text`.
pub fn fingerprint(text: &str) -> i64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

/// Applies `transform` to one value. NULL stays NULL, as in SQL.
///
/// # Errors
///
/// Returns the warehouse-style error message when the value type has no
/// matching function signature.
pub fn evaluate(transform: TransformExpression, value: &Value) -> Result<Value, String> {
    if matches!(value, Value::Null) {
        return Ok(Value::Null);
    }
    match transform {
        TransformExpression::Identity => Ok(value.clone()),
        TransformExpression::Fingerprint(output) => {
            let hashed = fingerprint(&cast_to_string(value)?);
            Ok(match output {
                FingerprintOutput::Int64 => Value::Integer(hashed),
                FingerprintOutput::Numeric => Value::Numeric(hashed.to_string()),
                FingerprintOutput::Float64 => Value::Float(hashed as f64),
            })
        }
        TransformExpression::Sha256Base64 => {
            sha256(value).map(|digest| Value::String(STANDARD.encode(digest)))
        }
        TransformExpression::Sha256Bytes => sha256(value).map(Value::Bytes),
    }
}

/// Column type produced by `transform` on a column of `input` type.
pub fn output_type(transform: TransformExpression, input: &ColumnType) -> ColumnType {
    match transform {
        TransformExpression::Fingerprint(FingerprintOutput::Int64) => ColumnType::Integer,
        TransformExpression::Fingerprint(FingerprintOutput::Numeric) => ColumnType::Numeric,
        TransformExpression::Fingerprint(FingerprintOutput::Float64) => ColumnType::Float,
        TransformExpression::Sha256Base64 => ColumnType::String,
        TransformExpression::Sha256Bytes => ColumnType::Bytes,
        TransformExpression::Identity => input.clone(),
    }
}

fn cast_to_string(value: &Value) -> Result<String, String> {
    match value {
        Value::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map_err(|_| "Invalid UTF-8 in CAST(BYTES AS STRING)".to_string()),
        other => Ok(other.to_string()),
    }
}

fn sha256(value: &Value) -> Result<Vec<u8>, String> {
    match value {
        Value::String(text) => Ok(Sha256::digest(text.as_bytes()).to_vec()),
        Value::Bytes(bytes) => Ok(Sha256::digest(bytes).to_vec()),
        other => Err(format!(
            "No matching signature for function SHA256 for argument types: {}",
            other.type_name()
        )),
    }
}
