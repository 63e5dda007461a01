//! Sorting types for file listings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Field a file listing is ordered by.
///
/// A closed set, so the column name can be interpolated into SQL safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSortField {
    /// Alphabetical by display name.
    #[default]
    DisplayName,
    /// Oldest first.
    CreatedAt,
    /// Smallest first.
    SizeBytes,
}

impl FileSortField {
    /// Column name in the `files` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::DisplayName => "display_name",
            Self::CreatedAt => "created_at",
            Self::SizeBytes => "size_bytes",
        }
    }
}

impl fmt::Display for FileSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for FileSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "display_name" | "filename" | "name" => Ok(Self::DisplayName),
            "created_at" => Ok(Self::CreatedAt),
            "size_bytes" | "size" => Ok(Self::SizeBytes),
            other => Err(AppError::validation(format!("Unknown sort field '{other}'"))),
        }
    }
}
