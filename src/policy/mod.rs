//! Permission checks for the resource-provider NUMA topology API.
//!
//! Each operation is gated by a named permission in the
//! `resource_providers:numa_topologies` namespace. The caller's role arrives
//! as an explicit parameter on every operation (no ambient request state);
//! denial surfaces as a typed `PolicyViolation` that the REST boundary maps
//! to 403.

// ─── Permissions ─────────────────────────────────────────────────────────────

/// Named permissions guarding the topology operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Create,
    Show,
    Update,
    Delete,
}

impl Permission {
    /// Fully-qualified permission name as used in policy files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Create => "resource_providers:numa_topologies:create",
            Permission::Show => "resource_providers:numa_topologies:show",
            Permission::Update => "resource_providers:numa_topologies:update",
            Permission::Delete => "resource_providers:numa_topologies:delete",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Roles a caller can present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Full access to every topology operation.
    Admin,
    /// Read-only access.
    Reader,
    /// Unrecognised role string — no access.
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "admin",
            Role::Reader => "reader",
            Role::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl Role {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            "reader" => Role::Reader,
            _ => Role::Unknown,
        }
    }
}

// ─── Role → allowed permissions table ────────────────────────────────────────

/// Static table mapping each role to its permitted operations.
///
/// `Admin` is represented as `None` (all permissions allowed).
pub const ROLE_ALLOWED_PERMISSIONS: &[(Role, Option<&[Permission]>)] = &[
    (Role::Admin, None),
    (Role::Reader, Some(&[Permission::Show])),
    (Role::Unknown, Some(&[])),
];

// ─── Violation ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum PolicyViolation {
    #[error("role {role} is not authorised for {permission}")]
    Forbidden { role: String, permission: String },
}

// ─── AuthContext ─────────────────────────────────────────────────────────────

/// The caller identity handed to each operation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub role: Role,
}

impl AuthContext {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    /// Check whether this caller may perform `permission`.
    pub fn can(&self, permission: Permission) -> Result<(), PolicyViolation> {
        check_authorized(&self.role, permission)
    }
}

/// Check whether `role` is authorised for `permission`.
pub fn check_authorized(role: &Role, permission: Permission) -> Result<(), PolicyViolation> {
    for (entry_role, allowed) in ROLE_ALLOWED_PERMISSIONS {
        if entry_role != role {
            continue;
        }

        return match allowed {
            None => Ok(()), // Admin: everything allowed.
            Some(permissions) => {
                if permissions.contains(&permission) {
                    Ok(())
                } else {
                    Err(PolicyViolation::Forbidden {
                        role: role.to_string(),
                        permission: permission.as_str().to_string(),
                    })
                }
            }
        };
    }

    // Role not in table; treat as no access.
    Err(PolicyViolation::Forbidden {
        role: role.to_string(),
        permission: permission.as_str().to_string(),
    })
}

// ─── Tests ────────────────────────────────────────────────────────────────────
