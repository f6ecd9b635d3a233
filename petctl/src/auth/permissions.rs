//! Role-based permission checks.
//!
//! The [`PermissionTable`] maps each [`Permission`] to the set of [`Role`]s allowed to exercise
//! it. It is built once at startup from the static pet and user definitions below and never
//! mutated afterwards; [`crate::AppState`] shares it behind an `Arc`.
//!
//! [`PermissionTable::authorize`] is the single decision point. It is pure, and checks in a fixed
//! order:
//!
//! 1. the permission must be in the table, otherwise [`Denial::UnknownPermission`] (a server
//!    misconfiguration, not a client error)
//! 2. an identity must be present, otherwise [`Denial::Unauthenticated`]
//! 3. the identity's role must be in the allowed set, otherwise [`Denial::Forbidden`]
//!
//! Roles are checked by membership only. `SuperAdmin` is not implicitly "above" `Admin`; it is
//! simply listed wherever it is allowed.
//!
//! Handlers ask for a permission with the [`RequiresPermission`] extractor:
//!
//! ```ignore
//! use petctl::auth::permissions::{permission, RequiresPermission};
//!
//! async fn list_users(caller: RequiresPermission<permission::GetUsers>) -> String {
//!     format!("hello {}", caller.email)
//! }
//! ```
//!
//! Routes can also be guarded by permission *name* through [`crate::auth::middleware::PermissionGuard`].

use std::{
    collections::{HashMap, HashSet},
    marker::PhantomData,
    ops::Deref,
};

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::users::Role,
    auth::session::Identity,
    errors::Error,
    types::{Permission, abbrev_uuid},
};

/// Permissions over pet records.
pub const PET_PERMISSIONS: &[(Permission, &[Role])] = &[
    (Permission::CreatePet, &[Role::Admin, Role::SuperAdmin]),
    (Permission::UpdatePet, &[Role::Admin, Role::SuperAdmin]),
    (Permission::DeletePet, &[Role::Admin, Role::SuperAdmin]),
    (Permission::GetPets, &[Role::User, Role::Admin, Role::SuperAdmin]),
];

/// Permissions over user accounts.
pub const USER_PERMISSIONS: &[(Permission, &[Role])] = &[
    (Permission::CreateUser, &[Role::SuperAdmin]),
    (Permission::GetUsers, &[Role::SuperAdmin]),
];

/// Why an authorization check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    UnknownPermission(Permission),
    Unauthenticated,
    Forbidden,
}

/// Outcome of [`PermissionTable::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(denial) => Err(denial.into()),
        }
    }
}

impl From<Denial> for Error {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::UnknownPermission(permission) => Error::UnknownPermission {
                name: permission.to_string(),
            },
            Denial::Unauthenticated => Error::MissingCredential,
            Denial::Forbidden => Error::Forbidden { message: None },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    entries: HashMap<Permission, HashSet<Role>>,
}

impl PermissionTable {
    /// The table every server runs with: pet and user permissions merged.
    pub fn builtin() -> Self {
        Self::from_definitions(PET_PERMISSIONS.iter().chain(USER_PERMISSIONS))
    }

    /// Build a table from `(permission, roles)` pairs. Repeated permissions take the union.
    pub fn from_definitions<'a>(definitions: impl IntoIterator<Item = &'a (Permission, &'a [Role])>) -> Self {
        let mut entries: HashMap<Permission, HashSet<Role>> = HashMap::new();
        for (permission, roles) in definitions {
            entries.entry(*permission).or_default().extend(roles.iter().copied());
        }
        Self { entries }
    }

    pub fn has(&self, permission: Permission) -> bool {
        self.entries.contains_key(&permission)
    }

    pub fn allowed_roles(&self, permission: Permission) -> Option<&HashSet<Role>> {
        self.entries.get(&permission)
    }

    /// Decide whether `identity` may exercise `permission`.
    pub fn authorize(&self, identity: Option<&Identity>, permission: Permission) -> Decision {
        let Some(allowed) = self.entries.get(&permission) else {
            return Decision::Denied(Denial::UnknownPermission(permission));
        };
        let Some(identity) = identity else {
            return Decision::Denied(Denial::Unauthenticated);
        };
        if allowed.contains(&identity.role) {
            Decision::Allowed
        } else {
            Decision::Denied(Denial::Forbidden)
        }
    }
}

/// Type-level permission markers for [`RequiresPermission`].
pub mod permission {
    use crate::types::Permission;

    pub trait PermissionMarker: Send + Sync + 'static {
        const PERMISSION: Permission;
    }

    macro_rules! markers {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl PermissionMarker for $name {
                    const PERMISSION: Permission = Permission::$name;
                }
            )*
        };
    }

    markers!(CreatePet, UpdatePet, DeletePet, GetPets, CreateUser, GetUsers);
}

/// Extractor that authenticates the caller and checks they hold permission `P`.
///
/// Dereferences to the caller's [`Identity`].
pub struct RequiresPermission<P> {
    pub identity: Identity,
    _permission: PhantomData<P>,
}

impl<P> Deref for RequiresPermission<P> {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.identity
    }
}

impl<P: permission::PermissionMarker> FromRequestParts<AppState> for RequiresPermission<P> {
    type Rejection = Error;

    #[instrument(skip_all, fields(permission = %P::PERMISSION))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Unknown permissions are reported before any credential is looked at
        if !state.permissions.has(P::PERMISSION) {
            return Err(Denial::UnknownPermission(P::PERMISSION).into());
        }

        let identity = Identity::from_request_parts(parts, state).await?;
        state.permissions.authorize(Some(&identity), P::PERMISSION).into_result()?;
        debug!(user_id = %abbrev_uuid(&identity.user_id), "Permission granted");

        Ok(Self {
            identity,
            _permission: PhantomData,
        })
    }
}
