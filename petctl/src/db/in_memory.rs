//! In-memory implementation of the user and pet stores.
//!
//! Records live in `HashMap`s behind `parking_lot` locks. It's suitable for tests and for
//! single-process demo deployments (`database.type: memory`); everything is lost on restart.
//!
//! The store enforces the same constraints as the PostgreSQL schema: unique user emails and pet
//! owners that must exist. Violations surface as the same [`DbError`] variants the PostgreSQL
//! store produces, so handlers cannot tell the two apart.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::{
    db::{
        PetStore, UserStore,
        errors::{DbError, Result},
        models::{
            pets::{PetCreateDBRequest, PetDBResponse, PetFilter, PetUpdateDBRequest},
            users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
        },
    },
    types::{PetId, UserId},
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserDBResponse>,
    pets: HashMap<PetId, PetDBResponse>,
}

/// Both stores over one set of tables, so pet owners can be checked against users.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Stable ordering matching the PostgreSQL repositories: oldest first, then by ID.
fn window<T: Clone>(mut rows: Vec<T>, key: impl Fn(&T) -> (chrono::DateTime<Utc>, Uuid), skip: i64, limit: i64) -> Vec<T> {
    rows.sort_by_key(key);
    rows.into_iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let tables = self.tables.read();
        Ok(tables.users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserDBResponse>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).map(|user| (*id, user.clone())))
            .collect())
    }

    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|user| user.email == request.email) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users_email_key".to_string()),
                table: Some("users".to_string()),
                message: format!("duplicate email {}", request.email),
            });
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            role: request.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let users: Vec<_> = self.tables.read().users.values().cloned().collect();
        Ok(window(users, |u| (u.created_at, u.id), filter.skip, filter.limit))
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.tables.read().users.len() as i64)
    }
}

#[async_trait::async_trait]
impl PetStore for InMemoryStore {
    async fn create(&self, request: &PetCreateDBRequest) -> Result<PetDBResponse> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&request.owner_id) {
            return Err(DbError::ForeignKeyViolation {
                constraint: Some("pets_owner_id_fkey".to_string()),
                table: Some("pets".to_string()),
                message: format!("owner {} does not exist", request.owner_id),
            });
        }

        let now = Utc::now();
        let pet = PetDBResponse {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            age: request.age,
            pet_type: request.pet_type.clone(),
            breed: request.breed.clone(),
            color: request.color.clone(),
            image_url: request.image_url.clone(),
            owner_id: request.owner_id,
            created_at: now,
            updated_at: now,
        };
        tables.pets.insert(pet.id, pet.clone());
        Ok(pet)
    }

    async fn get(&self, id: PetId) -> Result<Option<PetDBResponse>> {
        Ok(self.tables.read().pets.get(&id).cloned())
    }

    async fn list(&self, filter: &PetFilter) -> Result<Vec<PetDBResponse>> {
        let pets: Vec<_> = self
            .tables
            .read()
            .pets
            .values()
            .filter(|pet| filter.matches(pet))
            .cloned()
            .collect();
        Ok(window(pets, |p| (p.created_at, p.id), filter.skip, filter.limit))
    }

    async fn count(&self, filter: &PetFilter) -> Result<i64> {
        Ok(self.tables.read().pets.values().filter(|pet| filter.matches(pet)).count() as i64)
    }

    async fn update(&self, id: PetId, request: &PetUpdateDBRequest) -> Result<PetDBResponse> {
        let mut tables = self.tables.write();
        let pet = tables.pets.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            pet.name = name.clone();
        }
        if let Some(age) = request.age {
            pet.age = age;
        }
        if let Some(pet_type) = &request.pet_type {
            pet.pet_type = pet_type.clone();
        }
        if let Some(breed) = &request.breed {
            pet.breed = Some(breed.clone());
        }
        if let Some(color) = &request.color {
            pet.color = Some(color.clone());
        }
        if let Some(image_url) = &request.image_url {
            pet.image_url = Some(image_url.clone());
        }
        pet.updated_at = Utc::now();
        Ok(pet.clone())
    }

    async fn delete(&self, id: PetId) -> Result<bool> {
        Ok(self.tables.write().pets.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;

    fn user_request(email: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        }
    }

    fn pet_request(owner_id: UserId, name: &str, pet_type: &str, age: i32) -> PetCreateDBRequest {
        PetCreateDBRequest {
            name: name.to_string(),
            age,
            pet_type: pet_type.to_string(),
            breed: None,
            color: None,
            image_url: None,
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = InMemoryStore::new();
        UserStore::create(&store, &user_request("a@b.com")).await.unwrap();

        let err = UserStore::create(&store, &user_request("a@b.com")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert_eq!(UserStore::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pet_requires_existing_owner() {
        let store = InMemoryStore::new();
        let err = PetStore::create(&store, &pet_request(Uuid::new_v4(), "Rex", "dog", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_pet_filter_and_window() {
        let store = InMemoryStore::new();
        let owner = UserStore::create(&store, &user_request("owner@b.com")).await.unwrap();
        let other = UserStore::create(&store, &user_request("other@b.com")).await.unwrap();

        PetStore::create(&store, &pet_request(owner.id, "Rex", "dog", 3)).await.unwrap();
        PetStore::create(&store, &pet_request(owner.id, "T-Rex", "dog", 5)).await.unwrap();
        PetStore::create(&store, &pet_request(owner.id, "Tom", "cat", 3)).await.unwrap();
        PetStore::create(&store, &pet_request(other.id, "rexy", "cat", 1)).await.unwrap();

        let filter = PetFilter {
            name: Some("REX".to_string()),
            ..PetFilter::new(0, 10)
        };
        assert_eq!(PetStore::count(&store, &filter).await.unwrap(), 3);

        let filter = PetFilter {
            name: Some("rex".to_string()),
            pet_type: Some("dog".to_string()),
            ..PetFilter::new(0, 10)
        };
        assert_eq!(PetStore::list(&store, &filter).await.unwrap().len(), 2);

        let filter = PetFilter {
            owner_id: Some(other.id),
            ..PetFilter::new(0, 10)
        };
        let pets = PetStore::list(&store, &filter).await.unwrap();
        assert_eq!(pets.len(), 1);
        assert_eq!(pets[0].name, "rexy");

        let all = PetFilter::new(0, 10);
        assert_eq!(PetStore::list(&store, &PetFilter::new(3, 10)).await.unwrap().len(), 1);
        assert_eq!(PetStore::list(&store, &PetFilter::new(0, 2)).await.unwrap().len(), 2);
        assert_eq!(PetStore::count(&store, &all).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_partial_pet_update() {
        let store = InMemoryStore::new();
        let owner = UserStore::create(&store, &user_request("owner@b.com")).await.unwrap();
        let pet = PetStore::create(&store, &pet_request(owner.id, "Rex", "dog", 3)).await.unwrap();

        let updated = PetStore::update(
            &store,
            pet.id,
            &PetUpdateDBRequest {
                age: Some(4),
                color: Some("brown".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Rex");
        assert_eq!(updated.age, 4);
        assert_eq!(updated.color.as_deref(), Some("brown"));

        let err = PetStore::update(&store, Uuid::new_v4(), &PetUpdateDBRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));

        assert!(PetStore::delete(&store, pet.id).await.unwrap());
        assert!(!PetStore::delete(&store, pet.id).await.unwrap());
    }
}
