use serde::Serialize;

use crate::{Role, TokenClaims};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn from_claims(claims: TokenClaims, admin_group: &str) -> Self {
        let roles = Role::from_groups(&claims.groups, admin_group);
        Self {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
            roles,
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(&Role::ADMIN)
    }
}
