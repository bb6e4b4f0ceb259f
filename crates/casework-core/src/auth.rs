//! Authentication collaborator boundary.
//!
//! The engine trusts whatever implements [`Authenticator`] for identity; it
//! performs no credential policy of its own. [`StaticDirectory`] is the
//! config-fed implementation used by the CLI and tests; deployments front a
//! real identity provider behind the same trait.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::model::role::Role;
use crate::session::Identity;

/// Identity provider contract: map credentials to an identity or fail.
pub trait Authenticator: Send + Sync {
    /// # Errors
    ///
    /// `AuthFailed` when the credentials are not recognized.
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, WorkflowError>;
}

/// One configured user entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub team: String,
    pub role: Role,
    #[serde(default)]
    pub all_roles_access: bool,
}

/// Static user directory loaded from config.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: Vec<UserEntry>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new(users: Vec<UserEntry>) -> Self {
        Self { users }
    }
}

impl Authenticator for StaticDirectory {
    fn authenticate(&self, username: &str, password: &str) -> Result<Identity, WorkflowError> {
        let entry = self
            .users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .ok_or_else(|| WorkflowError::AuthFailed {
                username: username.to_string(),
            })?;

        Ok(Identity {
            username: entry.username.clone(),
            display_name: entry.display_name.clone(),
            team: entry.team.clone(),
            role: entry.role,
            all_roles_access: entry.all_roles_access || entry.role == Role::Admin,
        })
    }
}
