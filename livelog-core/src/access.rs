//! Access gate for console subscriptions.
//!
//! The gate is consulted before any network action. A refusal is not an
//! error: it becomes the `no-permission` status.

use livelog_types::{InstanceUuid, Principal};

/// Capabilities a principal can hold over an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the instance console.
    ViewConsole,
    /// See that the instance exists.
    ViewInstance,
}

/// Authorization decision, supplied by the embedding application.
pub trait Authorizer: Send + Sync {
    /// Whether `principal` holds `capability` over `target`.
    fn is_authorized(
        &self,
        principal: &Principal,
        capability: Capability,
        target: &InstanceUuid,
    ) -> bool;
}

/// Decides from the permission sets carried by the principal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionAuthorizer;

impl Authorizer for PermissionAuthorizer {
    fn is_authorized(
        &self,
        principal: &Principal,
        capability: Capability,
        target: &InstanceUuid,
    ) -> bool {
        if principal.is_owner {
            return true;
        }
        let permissions = &principal.permissions;
        match capability {
            Capability::ViewConsole => {
                principal.is_admin || permissions.can_access_instance_console.contains(target)
            }
            Capability::ViewInstance => {
                principal.is_admin || permissions.can_view_instance.contains(target)
            }
        }
    }
}

/// Whether the console of `target` may be subscribed to.
///
/// An unset principal and an empty target are never permitted.
pub fn can_access(
    authorizer: &dyn Authorizer,
    principal: Option<&Principal>,
    target: &InstanceUuid,
) -> bool {
    match principal {
        Some(principal) if !target.is_empty() => {
            authorizer.is_authorized(principal, Capability::ViewConsole, target)
        }
        _ => false,
    }
}
