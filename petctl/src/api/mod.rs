//! REST API: handlers, wire models and extractors.
//!
//! | Method | Path               | Permission   |
//! |--------|--------------------|--------------|
//! | POST   | `/login`           | none         |
//! | POST   | `/register`        | none         |
//! | GET    | `/me`              | any token    |
//! | GET    | `/users`           | `GET_USERS`  |
//! | POST   | `/users`           | `CREATE_USER`|
//! | GET    | `/users/{id}`      | `GET_USERS`  |
//! | GET    | `/pet`             | `GET_PETS`   |
//! | POST   | `/pet`             | `CREATE_PET` |
//! | GET    | `/pet/{id}`        | `GET_PETS`   |
//! | PUT    | `/pet/{id}`        | `UPDATE_PET` |
//! | DELETE | `/pet/{id}`        | `DELETE_PET` |
//! | GET    | `/pet/owner/{id}`  | `GET_PETS`   |

pub mod extract;
pub mod handlers;
pub mod models;
