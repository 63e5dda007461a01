//! Already-resolved access decisions passed into services.
//!
//! Policy lives outside FileDock: the identity layer decides what a caller
//! may do and hands the result in as a [`Capabilities`] value.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// What the caller is allowed to do with stored files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// May list every file, or another user's files.
    pub list: bool,
    /// May rename and delete files.
    pub manage: bool,
}

impl Capabilities {
    /// No capabilities.
    pub const NONE: Self = Self {
        list: false,
        manage: false,
    };

    /// Every capability.
    pub const ALL: Self = Self {
        list: true,
        manage: true,
    };
}

impl FromStr for Capabilities {
    type Err = AppError;

    /// Parse a comma-separated list such as `"list,manage"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut caps = Self::NONE;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "list" => caps.list = true,
                "manage" => caps.manage = true,
                other => {
                    return Err(AppError::validation(format!("Unknown capability '{other}'")));
                }
            }
        }
        Ok(caps)
    }
}

/// How a listing may be interacted with by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only.
    Display,
    /// Rename and delete allowed.
    Manage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capabilities() {
        let caps: Capabilities = "list, manage".parse().expect("parse");
        assert_eq!(caps, Capabilities::ALL);
        let caps: Capabilities = "".parse().expect("parse");
        assert_eq!(caps, Capabilities::NONE);
        assert!("admin".parse::<Capabilities>().is_err());
    }
}
