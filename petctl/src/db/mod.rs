//! Data persistence and access.
//!
//! Request handlers never talk to a database directly. They hold the two store traits defined
//! here, [`UserStore`] and [`PetStore`], behind `Arc<dyn ...>` in [`crate::AppState`], so the
//! same handlers run against PostgreSQL in production and against [`in_memory::InMemoryStore`]
//! in tests or with `database.type: memory`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │ UserStore / PetStore
//!        ↓
//! ┌─────────────┐       ┌──────────────┐
//! │PostgresStore│       │InMemoryStore │
//! └──────┬──────┘       └──────────────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries over a PgConnection)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Store record structures
//! - [`errors`]: Store error types
//! - [`postgres`]: [`UserStore`]/[`PetStore`] over a `PgPool`
//! - [`in_memory`]: [`UserStore`]/[`PetStore`] over process memory
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/` directory.
//! The [`crate::migrator`] function provides access to the migrator.

pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
pub mod postgres;

use std::collections::HashMap;

use crate::{
    db::{
        errors::Result,
        models::{
            pets::{PetCreateDBRequest, PetDBResponse, PetFilter, PetUpdateDBRequest},
            users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
        },
    },
    types::{PetId, UserId},
};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Persistence for user records, including credentials.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDBResponse>>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    /// Look up several users at once, keyed by ID. Unknown IDs are absent from the map.
    async fn find_many(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserDBResponse>>;

    /// Fails with [`errors::DbError::UniqueViolation`] if the email is taken.
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse>;

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>>;

    async fn count(&self) -> Result<i64>;
}

/// Persistence for pet records.
#[async_trait::async_trait]
pub trait PetStore: Send + Sync {
    /// Fails with [`errors::DbError::ForeignKeyViolation`] if the owner does not exist.
    async fn create(&self, request: &PetCreateDBRequest) -> Result<PetDBResponse>;

    async fn get(&self, id: PetId) -> Result<Option<PetDBResponse>>;

    /// Pets matching the filter, oldest first, windowed by `skip`/`limit`.
    async fn list(&self, filter: &PetFilter) -> Result<Vec<PetDBResponse>>;

    /// Number of pets matching the filter, ignoring `skip`/`limit`.
    async fn count(&self, filter: &PetFilter) -> Result<i64>;

    async fn update(&self, id: PetId, request: &PetUpdateDBRequest) -> Result<PetDBResponse>;

    /// Returns whether a pet was deleted.
    async fn delete(&self, id: PetId) -> Result<bool>;
}
