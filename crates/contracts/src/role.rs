//! Audited job roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ContractError;

/// Job role a résumé is written for and a ranking is requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Software engineer
    Swe,
    /// HR generalist
    Hr,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Swe, Role::Hr];

    /// Short key used in file names and scenario ids
    pub fn key(self) -> &'static str {
        match self {
            Role::Swe => "swe",
            Role::Hr => "hr",
        }
    }

    /// Human-readable job title
    pub fn title(self) -> &'static str {
        match self {
            Role::Swe => "Software Engineer",
            Role::Hr => "HR Generalist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Role {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "swe" | "software-engineer" => Ok(Role::Swe),
            "hr" | "hr-generalist" => Ok(Role::Hr),
            other => Err(ContractError::Other(format!(
                "unknown role '{other}' (expected 'swe' or 'hr')"
            ))),
        }
    }
}
