//! User roles and navigation sections

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user acts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// System administrator
    Admin,
    /// Customer (developer) organization
    Customer,
    /// General contractor
    GeneralContractor,
    /// Design organization
    Designer,
    /// Technical expert / reviewer
    Expert,
    /// Read-only observer
    Observer,
}

impl Role {
    /// Every role
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Customer,
        Role::GeneralContractor,
        Role::Designer,
        Role::Expert,
        Role::Observer,
    ];

    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
            Role::GeneralContractor => "general-contractor",
            Role::Designer => "designer",
            Role::Expert => "expert",
            Role::Observer => "observer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownRole(s.to_string()))
    }
}

/// Top-level navigation section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavItem {
    /// Construction objects (projects)
    Objects,
    /// Organizations
    Organizations,
    /// Contracts
    Contracts,
    /// Documents
    Documents,
    /// Approval inbox
    Approvals,
    /// Tasks
    Tasks,
    /// Project team
    Team,
    /// Process editor
    Processes,
    /// Process monitoring
    Monitoring,
    /// Settings
    Settings,
}
