//! Authentication and authorization.
//!
//! Callers authenticate with a signed bearer token obtained from `POST /login`:
//!
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! The token carries the caller's [`session::Identity`] (`userId`, `email`, `role`) and an expiry.
//! Nothing else about the caller is looked up per request.
//!
//! # Pieces
//!
//! - [`session`]: the [`session::TokenCodec`] that signs and verifies tokens
//! - [`password`]: Argon2id hashing, run off the async runtime
//! - [`authenticator`]: credential login and bearer-header verification
//! - [`permissions`]: the role table, [`permissions::PermissionTable::authorize`] and the
//!   [`permissions::RequiresPermission`] extractor
//! - [`current_user`]: the [`session::Identity`] extractor
//! - [`middleware`]: route layers, including the [`middleware::PermissionGuard`] factory
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use petctl::auth::permissions::{RequiresPermission, permission};
//!
//! async fn delete_pet(
//!     State(state): State<AppState>,
//!     caller: RequiresPermission<permission::DeletePet>,
//! ) -> Result<Json<PetEnvelope>, Error> {
//!     // caller.role is Admin or SuperAdmin here
//! }
//! ```
//!
//! A missing or invalid token is a 401, a role without the permission is a 403, and a permission
//! absent from the table is a 500.

pub mod authenticator;
pub mod current_user;
pub mod middleware;
pub mod password;
pub mod permissions;
pub mod session;
