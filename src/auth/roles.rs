//! Role-based access checks

use std::collections::HashSet;

use crate::auth::models::{Role, User};
use crate::error::{Error, Result};

/// The set of roles allowed to perform one protected operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGate {
    allowed: HashSet<Role>,
}

impl RoleGate {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn admin_only() -> Self {
        Self::new([Role::Admin])
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }

    /// Fails with `Forbidden` unless the principal's role is allowed
    pub fn check(&self, principal: &User) -> Result<()> {
        if self.allows(principal.role) {
            return Ok(());
        }

        tracing::debug!(
            "Denied {} with role {}; allowed: {:?}",
            principal.email,
            principal.role,
            self.allowed
        );
        Err(Error::Forbidden(
            "Operation forbidden, you don't have access".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> User {
        User {
            id: 1,
            email: "a@x.com".into(),
            password: String::new(),
            first_name: None,
            last_name: None,
            confirmed: true,
            avatar: None,
            role,
        }
    }

    #[test]
    fn test_admin_gate() {
        let gate = RoleGate::admin_only();
        assert!(gate.check(&principal(Role::Admin)).is_ok());
        assert!(matches!(
            gate.check(&principal(Role::User)),
            Err(Error::Forbidden(_))
        ));
    }

    #[test]
    fn test_multi_role_gate() {
        let gate = RoleGate::new([Role::Admin, Role::User]);
        assert!(gate.check(&principal(Role::Admin)).is_ok());
        assert!(gate.check(&principal(Role::User)).is_ok());
    }

    #[test]
    fn test_empty_gate_denies_everyone() {
        let gate = RoleGate::new([]);
        assert!(!gate.allows(Role::Admin));
        assert!(!gate.allows(Role::User));
    }
}
