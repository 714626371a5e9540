use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// What happens to a destination table that already exists. Applied
/// uniformly to every destination table of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Replace the destination contents.
    #[default]
    Truncate,
    /// Fail the job if the destination already exists.
    FailIfExists,
    /// Append masked rows to the destination.
    Append,
}

impl OverwritePolicy {
    /// The warehouse write disposition for this policy.
    pub const fn write_disposition(self) -> &'static str {
        match self {
            Self::Truncate => "WRITE_TRUNCATE",
            Self::FailIfExists => "WRITE_EMPTY",
            Self::Append => "WRITE_APPEND",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Truncate => "truncate",
            Self::FailIfExists => "fail-if-exists",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverwritePolicy {
    type Err = ModelError;

    /// Accepts the short names as well as the warehouse write dispositions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "TRUNCATE" | "WRITE_TRUNCATE" => Ok(Self::Truncate),
            "FAIL_IF_EXISTS" | "WRITE_EMPTY" => Ok(Self::FailIfExists),
            "APPEND" | "WRITE_APPEND" => Ok(Self::Append),
            _ => Err(ModelError::UnknownOverwritePolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_short_and_disposition_names() {
        assert_eq!("truncate".parse(), Ok(OverwritePolicy::Truncate));
        assert_eq!("WRITE_EMPTY".parse(), Ok(OverwritePolicy::FailIfExists));
        assert_eq!("fail-if-exists".parse(), Ok(OverwritePolicy::FailIfExists));
        assert_eq!("write_append".parse(), Ok(OverwritePolicy::Append));
        assert!("overwrite".parse::<OverwritePolicy>().is_err());
    }

    #[test]
    fn test_dispositions() {
        assert_eq!(OverwritePolicy::Truncate.write_disposition(), "WRITE_TRUNCATE");
        assert_eq!(OverwritePolicy::FailIfExists.write_disposition(), "WRITE_EMPTY");
        assert_eq!(OverwritePolicy::Append.write_disposition(), "WRITE_APPEND");
    }
}
