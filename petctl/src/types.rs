//! Common type definitions and permission names.
//!
//! This module defines:
//! - Type aliases for entity IDs ([`UserId`], [`PetId`])
//! - The closed set of [`Permission`]s that routes can be guarded by
//!
//! # Permission names
//!
//! Permissions are plain enum variants everywhere inside the crate. The only place a string turns
//! into a permission is [`Permission::from_str`](std::str::FromStr), which accepts the wire names
//! (`CREATE_PET`, `GET_USERS`, ...) and rejects anything else with [`UnknownPermission`].
//!
//! ```
//! use petctl::types::Permission;
//!
//! let permission: Permission = "GET_PETS".parse().unwrap();
//! assert_eq!(permission, Permission::GetPets);
//! assert!("FEED_PETS".parse::<Permission>().is_err());
//! ```
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type PetId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Named capabilities that can be required by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    CreatePet,
    UpdatePet,
    DeletePet,
    GetPets,
    CreateUser,
    GetUsers,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::CreatePet,
        Permission::UpdatePet,
        Permission::DeletePet,
        Permission::GetPets,
        Permission::CreateUser,
        Permission::GetUsers,
    ];

    /// The wire name of this permission, e.g. `CREATE_PET`.
    pub fn name(&self) -> &'static str {
        match self {
            Permission::CreatePet => "CREATE_PET",
            Permission::UpdatePet => "UPDATE_PET",
            Permission::DeletePet => "DELETE_PET",
            Permission::GetPets => "GET_PETS",
            Permission::CreateUser => "CREATE_USER",
            Permission::GetUsers => "GET_USERS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A permission name that does not correspond to any [`Permission`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_names_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.name().parse::<Permission>().unwrap(), permission);
            assert_eq!(permission.to_string(), permission.name());
        }
    }

    #[test]
    fn test_unknown_permission_name() {
        let err = "ADOPT_PET".parse::<Permission>().unwrap_err();
        assert_eq!(err, UnknownPermission("ADOPT_PET".to_string()));

        // Names are case sensitive
        assert!("get_pets".parse::<Permission>().is_err());
        assert!("".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_serde_uses_wire_names() {
        let json = serde_json::to_string(&Permission::CreateUser).unwrap();
        assert_eq!(json, "\"CREATE_USER\"");

        let parsed: Permission = serde_json::from_str("\"DELETE_PET\"").unwrap();
        assert_eq!(parsed, Permission::DeletePet);
    }

    #[test]
    fn test_abbrev_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
