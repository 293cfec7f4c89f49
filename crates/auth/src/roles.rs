use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier.
///
/// The identity provider speaks in groups; the service only distinguishes
/// `admin` from everyone else, so roles stay opaque strings here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const USER: Role = Role(Cow::Borrowed("user"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Map identity-provider groups to roles. Everyone is a `user`; members of
    /// `admin_group` are also `admin`.
    pub fn from_groups(groups: &[String], admin_group: &str) -> Vec<Role> {
        let mut roles = vec![Role::USER];
        if groups.iter().any(|g| g == admin_group) {
            roles.push(Role::ADMIN);
        }
        roles
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
