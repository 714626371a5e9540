//! Per-table masking specs.

use bqmask_model::{
    DatasetRef, MaskingSpec, OverwritePolicy, SelectExpression, TableId, TableSchema,
};
use tracing::debug;

use crate::error::TableError;
use crate::masker::mask;
use crate::warehouse::Warehouse;

/// Builds the masking spec for a table whose schema is already known.
///
/// Every column is masked in schema order under its own name; the destination
/// keeps the table name inside `destination`.
pub fn build_spec(
    schema: &TableSchema,
    destination: &DatasetRef,
    overwrite: OverwritePolicy,
) -> MaskingSpec {
    let select = schema
        .columns()
        .iter()
        .map(|column| SelectExpression::new(column.name.clone(), mask(column)))
        .collect();
    MaskingSpec {
        select,
        source: schema.id.clone(),
        destination: schema.id.in_dataset(destination),
        overwrite,
        location: schema.location.clone(),
    }
}

/// Fetches table schemas and turns them into masking specs.
pub struct TableMaskJobBuilder<'a, W: ?Sized> {
    warehouse: &'a W,
}

impl<'a, W: Warehouse + ?Sized> TableMaskJobBuilder<'a, W> {
    pub fn new(warehouse: &'a W) -> Self {
        Self { warehouse }
    }

    /// Fetches the schema of `table` and builds its masking spec.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::SchemaFetch`] when the warehouse cannot provide the schema.
    pub async fn build(
        &self,
        table: &TableId,
        destination: &DatasetRef,
        overwrite: OverwritePolicy,
    ) -> Result<MaskingSpec, TableError> {
        let schema = self
            .warehouse
            .get_schema(table)
            .await
            .map_err(|source| TableError::SchemaFetch {
                table: table.clone(),
                source,
            })?;
        let spec = build_spec(&schema, destination, overwrite);
        debug!(
            table = %table,
            destination = %spec.destination,
            column_count = spec.select.len(),
            passthrough_count = spec.passthrough_count(),
            "built masking spec"
        );
        Ok(spec)
    }
}
