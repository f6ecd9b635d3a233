//! API request and response data models.
//!
//! These are the shapes that cross the HTTP boundary. They are kept separate from the store
//! records in [`crate::db::models`] so that, for example, password hashes can never be
//! serialized into a response by accident.
//!
//! - [`auth`]: login and registration payloads
//! - [`users`]: roles, user projections and admin requests
//! - [`pets`]: pet payloads, list filters and response envelopes
//! - [`pagination`]: shared paging parameters

pub mod auth;
pub mod pagination;
pub mod pets;
pub mod users;
