//! Structured masking expressions.
//!
//! A transform says *what* happens to a column; turning it into query text is
//! left to whoever talks to the warehouse.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output type of a fingerprint transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintOutput {
    Int64,
    Numeric,
    Float64,
}

/// A deterministic masking transform applied to one source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "output")]
pub enum TransformExpression {
    /// 64-bit fingerprint of the value's string form, cast to the output type.
    Fingerprint(FingerprintOutput),
    /// SHA-256 of the value, base64 encoded.
    Sha256Base64,
    /// SHA-256 of the value, left as bytes.
    Sha256Bytes,
    /// The column is copied unmasked.
    Identity,
}

impl TransformExpression {
    pub fn is_masking(self) -> bool {
        !matches!(self, Self::Identity)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Fingerprint(FingerprintOutput::Int64) => "fingerprint",
            Self::Fingerprint(FingerprintOutput::Numeric) => "fingerprint as numeric",
            Self::Fingerprint(FingerprintOutput::Float64) => "fingerprint as float64",
            Self::Sha256Base64 => "sha256 base64",
            Self::Sha256Bytes => "sha256",
            Self::Identity => "passthrough",
        }
    }
}

impl fmt::Display for TransformExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One projected output column: `transform(column) AS column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectExpression {
    pub column: String,
    pub transform: TransformExpression,
}

impl SelectExpression {
    pub fn new(column: impl Into<String>, transform: TransformExpression) -> Self {
        Self {
            column: column.into(),
            transform,
        }
    }
}
