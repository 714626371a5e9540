use std::fmt;

use serde::{Deserialize, Serialize};

/// Column type as reported by the warehouse, collapsed to the categories
/// that masking distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Integer,
    Numeric,
    Float,
    String,
    Bytes,
    /// Any other reported type, kept verbatim (e.g. `DATE`, `RECORD`, `BIGNUMERIC`).
    Other(String),
}

impl ColumnType {
    /// Maps a warehouse type name to a column type. Never fails: unrecognized
    /// names become [`ColumnType::Other`].
    pub fn from_type_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "INTEGER" | "INT64" => Self::Integer,
            "NUMERIC" => Self::Numeric,
            "FLOAT" | "FLOAT64" => Self::Float,
            "STRING" => Self::String,
            "BYTES" => Self::Bytes,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Integer => "INTEGER",
            Self::Numeric => "NUMERIC",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_and_legacy_names_map_to_the_same_type() {
        assert_eq!(ColumnType::from_type_name("INT64"), ColumnType::Integer);
        assert_eq!(ColumnType::from_type_name("integer"), ColumnType::Integer);
        assert_eq!(ColumnType::from_type_name("FLOAT64"), ColumnType::Float);
        assert_eq!(ColumnType::from_type_name("Float"), ColumnType::Float);
    }

    #[test]
    fn test_unknown_names_are_kept() {
        assert_eq!(
            ColumnType::from_type_name("timestamp"),
            ColumnType::Other("TIMESTAMP".to_string())
        );
        assert_eq!(ColumnType::from_type_name("BIGNUMERIC").as_str(), "BIGNUMERIC");
    }
}
