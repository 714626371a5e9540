use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid {kind} identifier: `{value}`")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("duplicate column `{column}` in table {table}")]
    DuplicateColumn { table: String, column: String },
    #[error("unknown overwrite policy `{0}` (expected truncate, fail-if-exists or append)")]
    UnknownOverwritePolicy(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
