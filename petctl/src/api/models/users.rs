//! API request/response models for users.

use super::pagination::Pagination;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform role. Every user has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

/// The public face of a user: no role, no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&UserDBResponse> for UserSummary {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name.clone(),
            email: db.email.clone(),
        }
    }
}

impl From<UserDBResponse> for UserSummary {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
        }
    }
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Defaults to `auth.default_user_role`
    pub role: Option<Role>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            role: db.role,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub message: String,
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn db_user() -> UserDBResponse {
        let now = Utc::now();
        UserDBResponse {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_never_carries_credentials() {
        let json = serde_json::to_value(UserSummary::from(db_user())).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(json.get("password").is_none());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_user_response_hides_hash() {
        let json = serde_json::to_value(UserResponse::from(db_user())).unwrap();
        assert_eq!(json["role"], "Admin");
        assert!(json.get("createdAt").is_some());
        assert!(!json.to_string().contains("argon2"));
    }
}
