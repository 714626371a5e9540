use serde::{Deserialize, Serialize};

use crate::ids::TableId;
use crate::policy::OverwritePolicy;
use crate::transform::SelectExpression;

/// Everything needed to materialize one masked table.
///
/// Built once per table and handed by value to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingSpec {
    /// Projection in source column order.
    pub select: Vec<SelectExpression>,
    pub source: TableId,
    pub destination: TableId,
    pub overwrite: OverwritePolicy,
    /// Location the job must run in; the source table's location.
    pub location: Option<String>,
}

impl MaskingSpec {
    /// Number of columns copied without masking.
    pub fn passthrough_count(&self) -> usize {
        self.select
            .iter()
            .filter(|expression| !expression.transform.is_masking())
            .count()
    }
}
