//! Role capabilities and navigation menus
//!
//! Advisory only: callers use it to decide what to offer a user. The engine
//! never consults it.

use pir_model::{NavItem, Role};
use serde::Serialize;

/// Coarse actions a role may be offered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySet {
    /// Upload new documents
    pub can_upload: bool,
    /// Respond on approval steps
    pub can_approve: bool,
    /// Create construction objects
    pub can_create_object: bool,
    /// Create tasks
    pub can_create_task: bool,
}

impl CapabilitySet {
    const ALL: Self = Self {
        can_upload: true,
        can_approve: true,
        can_create_object: true,
        can_create_task: true,
    };

    const NONE: Self = Self {
        can_upload: false,
        can_approve: false,
        can_create_object: false,
        can_create_task: false,
    };
}

/// Role -> capabilities and menu
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityResolver;

impl CapabilityResolver {
    /// Create resolver
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Capabilities of `role`
    #[must_use]
    pub fn capabilities(&self, role: Role) -> CapabilitySet {
        match role {
            Role::Admin => CapabilitySet::ALL,
            Role::Customer => CapabilitySet {
                can_upload: false,
                ..CapabilitySet::ALL
            },
            Role::GeneralContractor => CapabilitySet {
                can_create_object: false,
                ..CapabilitySet::ALL
            },
            Role::Designer => CapabilitySet {
                can_upload: true,
                ..CapabilitySet::NONE
            },
            Role::Expert => CapabilitySet {
                can_approve: true,
                ..CapabilitySet::NONE
            },
            Role::Observer => CapabilitySet::NONE,
        }
    }

    /// Navigation menu of `role`, in display order
    #[must_use]
    pub fn navigation(&self, role: Role) -> &'static [NavItem] {
        use NavItem::{
            Approvals, Contracts, Documents, Monitoring, Objects, Organizations, Processes,
            Settings, Tasks, Team,
        };

        match role {
            Role::Admin => &[
                Objects,
                Organizations,
                Contracts,
                Documents,
                Approvals,
                Tasks,
                Team,
                Processes,
                Monitoring,
                Settings,
            ],
            Role::Customer => &[
                Objects,
                Organizations,
                Contracts,
                Documents,
                Approvals,
                Tasks,
                Team,
                Processes,
                Monitoring,
            ],
            Role::GeneralContractor => {
                &[Objects, Contracts, Documents, Approvals, Tasks, Team]
            }
            Role::Designer => &[Objects, Documents, Approvals, Tasks],
            Role::Expert => &[Objects, Documents, Approvals],
            Role::Observer => &[Objects, Documents],
        }
    }

    /// Whether `item` appears in the menu of `role`
    #[must_use]
    pub fn can_see(&self, role: Role, item: NavItem) -> bool {
        self.navigation(role).contains(&item)
    }
}
