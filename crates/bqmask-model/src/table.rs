use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::ColumnSchema;
use crate::error::{ModelError, Result};
use crate::ids::TableId;

/// Kind of object listed in a dataset. Only [`TableKind::Table`] is masked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    Table,
    View,
    MaterializedView,
    External,
    Snapshot,
    Other(String),
}

impl TableKind {
    pub fn from_type_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TABLE" => Self::Table,
            "VIEW" => Self::View,
            "MATERIALIZED_VIEW" => Self::MaterializedView,
            "EXTERNAL" => Self::External,
            "SNAPSHOT" => Self::Snapshot,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::MaterializedView => "MATERIALIZED_VIEW",
            Self::External => "EXTERNAL",
            Self::Snapshot => "SNAPSHOT",
            Self::Other(name) => name,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry returned when listing a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub id: TableId,
    pub kind: TableKind,
}

/// Full schema of a table: ordered columns plus where the table lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: TableId,
    pub kind: TableKind,
    /// Processing location reported by the warehouse (e.g. `EU`).
    pub location: Option<String>,
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Builds a schema, rejecting duplicate column names.
    pub fn new(
        id: TableId,
        kind: TableKind,
        location: Option<String>,
        columns: Vec<ColumnSchema>,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ModelError::DuplicateColumn {
                    table: id.to_string(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            id,
            kind,
            location,
            columns,
        })
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    #[test]
    fn test_duplicate_columns_are_rejected() {
        let id = TableId::parse("prod.sales.orders").unwrap();
        let columns = vec![
            ColumnSchema::new("id", ColumnType::Integer),
            ColumnSchema::new("id", ColumnType::String),
        ];
        let error = TableSchema::new(id, TableKind::Table, None, columns).unwrap_err();
        assert_eq!(
            error,
            ModelError::DuplicateColumn {
                table: "prod.sales.orders".to_string(),
                column: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_kind_names() {
        assert!(TableKind::from_type_name("table").is_table());
        assert_eq!(TableKind::from_type_name("VIEW"), TableKind::View);
        assert_eq!(
            TableKind::from_type_name("MODEL"),
            TableKind::Other("MODEL".to_string())
        );
    }
}
