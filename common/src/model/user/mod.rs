//! User, role, and capability models
//!
//! Identity resolution happens outside this core: callers hand every mutating
//! operation a resolved [`Actor`] and the engine trusts it completely. What
//! the engine does own is the capability table -- which role may perform
//! which action -- so the permission rules live in one place instead of
//! being duplicated at every call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Closed set of user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator with full dashboard access
    SuperAdmin,
    /// Fulfillment agent who accepts and works orders
    Agent,
    /// Buyer with no dashboard capabilities
    Customer,
}

/// Operations gated by the capability table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AssignOrder,
    AcceptOrder,
    UpdateOrderStatus,
    ArchiveOrder,
    ViewAllOrders,
    ViewAdminDashboard,
    ViewAgentDashboard,
    UpdateSettings,
    ViewSettings,
}

impl Role {
    /// Wire/database encoding of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Agent => "agent",
            Role::Customer => "customer",
        }
    }

    /// Capability table: which role may perform which action.
    ///
    /// Self-acceptance is agent-only; admins place agents through explicit
    /// assignment.
    pub fn permits(&self, action: Action) -> bool {
        use Action::*;

        match self {
            Role::SuperAdmin => !matches!(action, AcceptOrder | ViewAgentDashboard),
            Role::Agent => matches!(action, AcceptOrder | UpdateOrderStatus | ViewAgentDashboard),
            Role::Customer => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "agent" => Ok(Role::Agent),
            "customer" => Ok(Role::Customer),
            other => Err(Error::ValidationError(format!("Unknown role: {}", other))),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID (opaque text, issued by the auth collaborator)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: Role,
    /// Banned users are excluded from agent counts and assignment pools
    pub banned: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            banned: false,
            created_at: Utc::now(),
        }
    }
}

/// A resolved `(user, role)` pair attached to every mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Acting user ID
    pub user_id: String,
    /// Resolved role
    pub role: Role,
}

impl Actor {
    /// Create an actor with an explicit role
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Convenience constructor for a super admin actor
    pub fn super_admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::SuperAdmin)
    }

    /// Convenience constructor for an agent actor
    pub fn agent(user_id: impl Into<String>) -> Self {
        Self::new(user_id, Role::Agent)
    }

    /// Check the capability table, failing with an authorization error
    pub fn require(&self, action: Action) -> Result<()> {
        if self.role.permits(action) {
            Ok(())
        } else {
            Err(Error::AuthorizationError(format!(
                "Role {} may not perform {:?}",
                self.role, action
            )))
        }
    }
}
