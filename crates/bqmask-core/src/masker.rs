//! Column type → masking transform.

use bqmask_model::{ColumnSchema, ColumnType, FingerprintOutput, TransformExpression};
use tracing::warn;

/// Chooses the transform for a column from its declared type.
///
/// Total over [`ColumnType`]: numeric types get a fingerprint so equal inputs
/// stay equal (joins on masked keys still work), strings and bytes get a
/// SHA-256 digest, and anything else is passed through unmasked. A passthrough
/// is logged because it leaves the column readable in the target.
pub fn mask(column: &ColumnSchema) -> TransformExpression {
    match &column.column_type {
        ColumnType::Integer => TransformExpression::Fingerprint(FingerprintOutput::Int64),
        ColumnType::Numeric => TransformExpression::Fingerprint(FingerprintOutput::Numeric),
        ColumnType::Float => TransformExpression::Fingerprint(FingerprintOutput::Float64),
        ColumnType::String => TransformExpression::Sha256Base64,
        ColumnType::Bytes => TransformExpression::Sha256Bytes,
        ColumnType::Other(type_name) => {
            warn!(
                column = %column.name,
                column_type = %type_name,
                "no masking function for column type, passing column through unmasked"
            );
            TransformExpression::Identity
        }
    }
}
