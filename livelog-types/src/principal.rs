//! The user a client acts as, as returned by the core's user info endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::InstanceUuid;

/// Authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user id.
    pub uid: String,
    /// Login name.
    pub username: String,
    /// The owner may do anything.
    #[serde(default)]
    pub is_owner: bool,
    /// Admins may do anything except manage the owner.
    #[serde(default)]
    pub is_admin: bool,
    /// Per-instance grants.
    #[serde(default)]
    pub permissions: UserPermission,
}

impl Principal {
    /// A user with no grants.
    pub fn new(uid: &str, username: &str) -> Self {
        Self {
            uid: uid.to_string(),
            username: username.to_string(),
            is_owner: false,
            is_admin: false,
            permissions: UserPermission::default(),
        }
    }

    /// Builder: mark as owner.
    pub fn owner(mut self) -> Self {
        self.is_owner = true;
        self
    }

    /// Builder: mark as admin.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Builder: grant console access to an instance.
    pub fn with_console_access(mut self, instance: impl Into<InstanceUuid>) -> Self {
        self.permissions
            .can_access_instance_console
            .insert(instance.into());
        self
    }

    /// Builder: grant view access to an instance.
    pub fn with_view_access(mut self, instance: impl Into<InstanceUuid>) -> Self {
        self.permissions.can_view_instance.insert(instance.into());
        self
    }
}

/// Per-instance permission sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserPermission {
    /// Instances the user can see.
    pub can_view_instance: HashSet<InstanceUuid>,
    /// Instances the user can start.
    pub can_start_instance: HashSet<InstanceUuid>,
    /// Instances the user can stop.
    pub can_stop_instance: HashSet<InstanceUuid>,
    /// Instances whose console the user can read and write.
    pub can_access_instance_console: HashSet<InstanceUuid>,
    /// Instances whose files the user can read.
    pub can_read_instance_file: HashSet<InstanceUuid>,
    /// Instances whose files the user can write.
    pub can_write_instance_file: HashSet<InstanceUuid>,
    /// Whether the user can create instances.
    pub can_create_instance: bool,
    /// Whether the user can delete instances.
    pub can_delete_instance: bool,
    /// Whether the user can change other users' permissions.
    pub can_manage_permission: bool,
}
