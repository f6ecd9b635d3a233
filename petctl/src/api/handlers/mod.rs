//! HTTP request handlers, one module per resource.
//!
//! - [`auth`]: login and self-service registration
//! - [`pets`]: pet CRUD and per-owner listings
//! - [`users`]: user administration and the caller's own profile
//!
//! Permission checks happen before any handler body runs, either through the
//! [`crate::auth::permissions::RequiresPermission`] extractor or a
//! [`crate::auth::middleware::PermissionGuard`] route layer. Handlers return
//! [`crate::errors::Error`], which renders as `{ "message": ... }` with a matching status code.

pub mod auth;
pub mod pets;
pub mod users;
