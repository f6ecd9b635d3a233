//! Store record models.
//!
//! These structs describe what the stores accept and return. They are distinct from the API
//! models in [`crate::api::models`] so that storage and wire representations can evolve
//! independently; in particular, [`users::UserDBResponse`] carries the password hash, which no API
//! model ever does.
//!
//! - [`users`]: user accounts
//! - [`pets`]: pet records and list filters

pub mod pets;
pub mod users;
