//! Repository implementations for PostgreSQL access.
//!
//! Each repository wraps a SQLx connection or transaction and implements the [`Repository`]
//! trait for one table:
//!
//! - [`Users`]: user accounts and credential lookup
//! - [`Pets`]: pet records
//!
//! ```ignore
//! use petctl::db::handlers::{Users, Repository};
//!
//! let mut tx = pool.begin().await?;
//! let mut repo = Users::new(&mut tx);
//! let user = repo.get_user_by_email("user@example.com").await?;
//! tx.commit().await?;
//! ```
//!
//! Handlers do not use repositories directly; they go through [`crate::db::PostgresStore`].

pub mod pets;
pub mod repository;
pub mod users;

pub use pets::Pets;
pub use repository::Repository;
pub use users::Users;
