//! Caller identity
//!
//! The ledger receives an already-authenticated principal from an external
//! auth collaborator; it performs no authentication itself, only
//! authorization checks on privileged operations.

use crate::types::error::LedgerError;
use serde::{Deserialize, Serialize};

/// Role of an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Back-office staff; may approve, reject, adjust, and purge imports
    Admin,
    /// Investor-facing user; may only move their own money
    Member,
}

/// An authenticated caller identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    /// User id as issued by the auth collaborator
    pub user: String,
    /// Authorization role
    pub role: Role,
}

impl Principal {
    /// Create an admin principal
    pub fn admin(user: &str) -> Self {
        Principal {
            user: user.to_string(),
            role: Role::Admin,
        }
    }

    /// Create a member principal
    pub fn member(user: &str) -> Self {
        Principal {
            user: user.to_string(),
            role: Role::Member,
        }
    }

    /// Fail with `Unauthorized` unless this principal is an admin
    pub fn require_admin(&self, operation: &str) -> Result<(), LedgerError> {
        if self.role != Role::Admin {
            return Err(LedgerError::unauthorized(&self.user, operation));
        }
        Ok(())
    }
}
