//! Warehouse identifiers: projects, datasets and tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

fn validated(kind: &'static str, value: impl Into<String>) -> Result<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(ModelError::InvalidIdentifier { kind, value });
    }
    Ok(trimmed.to_string())
}

/// A warehouse project (the billing and ownership boundary).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        validated("project", value).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(value: ProjectId) -> Self {
        value.0
    }
}

impl FromStr for ProjectId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// A dataset inside a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    pub project: ProjectId,
    pub dataset: String,
}

impl DatasetRef {
    pub fn new(project: ProjectId, dataset: impl Into<String>) -> Result<Self> {
        let dataset = validated("dataset", dataset)?;
        if dataset.contains(['.', ':']) {
            return Err(ModelError::InvalidIdentifier {
                kind: "dataset",
                value: dataset,
            });
        }
        Ok(Self { project, dataset })
    }

    /// The same dataset name under another project.
    pub fn with_project(&self, project: ProjectId) -> Self {
        Self {
            project,
            dataset: self.dataset.clone(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.dataset)
    }
}

/// A fully-qualified table identifier, rendered as `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId {
    pub project: ProjectId,
    pub dataset: String,
    pub table: String,
}

impl TableId {
    pub fn new(dataset: &DatasetRef, table: impl Into<String>) -> Result<Self> {
        let table = validated("table", table)?;
        Ok(Self {
            project: dataset.project.clone(),
            dataset: dataset.dataset.clone(),
            table,
        })
    }

    /// Parses `project.dataset.table` as well as the legacy
    /// `project:dataset.table` form. Domain-scoped projects such as
    /// `example.com:analytics` are kept intact.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || ModelError::InvalidIdentifier {
            kind: "table",
            value: value.to_string(),
        };
        let (rest, table) = value.trim().rsplit_once('.').ok_or_else(invalid)?;
        let (project, dataset) = rest.rsplit_once(['.', ':']).ok_or_else(invalid)?;
        let dataset = DatasetRef::new(ProjectId::new(project)?, dataset)?;
        Self::new(&dataset, table)
    }

    pub fn dataset_ref(&self) -> DatasetRef {
        DatasetRef {
            project: self.project.clone(),
            dataset: self.dataset.clone(),
        }
    }

    /// The table with the same leaf name inside `dataset`.
    pub fn in_dataset(&self, dataset: &DatasetRef) -> Self {
        Self {
            project: dataset.project.clone(),
            dataset: dataset.dataset.clone(),
            table: self.table.clone(),
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

impl FromStr for TableId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str) -> ProjectId {
        ProjectId::new(name).unwrap()
    }

    #[test]
    fn test_project_rejects_blank_and_whitespace() {
        assert!(ProjectId::new("  ").is_err());
        assert!(ProjectId::new("my project").is_err());
        assert_eq!(ProjectId::new(" prod ").unwrap().as_str(), "prod");
    }

    #[test]
    fn test_dataset_is_a_bare_name_in_its_project() {
        let dataset = DatasetRef::new(project("source"), " sales ").unwrap();
        assert_eq!(dataset.to_string(), "source.sales");

        for qualified in ["other.sales", "other:sales"] {
            let error = DatasetRef::new(project("source"), qualified).unwrap_err();
            assert!(matches!(error, ModelError::InvalidIdentifier { kind: "dataset", .. }));
        }
    }

    #[test]
    fn test_table_parse_legacy_colon_form() {
        let id = TableId::parse("prod:sales.orders").unwrap();
        assert_eq!(id.to_string(), "prod.sales.orders");
    }

    #[test]
    fn test_table_parse_keeps_domain_scoped_project() {
        let id = TableId::parse("example.com:analytics:sales.orders").unwrap();
        assert_eq!(id.project.as_str(), "example.com:analytics");
        assert_eq!(id.dataset, "sales");
        assert_eq!(id.table, "orders");

        let dotted = TableId::parse("example.com:analytics.sales.orders").unwrap();
        assert_eq!(dotted, id);
    }

    #[test]
    fn test_table_parse_rejects_partial_ids() {
        assert!(TableId::parse("orders").is_err());
        assert!(TableId::parse("sales.orders").is_err());
        assert!(TableId::parse("prod.sales.").is_err());
    }

    #[test]
    fn test_in_dataset_keeps_leaf_name() {
        let source = TableId::parse("prod.sales.orders").unwrap();
        let target = DatasetRef::new(project("masked"), "sales").unwrap();
        assert_eq!(source.in_dataset(&target).to_string(), "masked.sales.orders");
    }
}
