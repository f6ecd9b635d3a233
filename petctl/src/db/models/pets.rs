//! Store models for pets.

use crate::types::{PetId, UserId};
use chrono::{DateTime, Utc};

/// Store request for creating a new pet
#[derive(Debug, Clone)]
pub struct PetCreateDBRequest {
    pub name: String,
    pub age: i32,
    pub pet_type: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: UserId,
}

/// Store request for updating a pet. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PetUpdateDBRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

/// Store response for a pet
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PetDBResponse {
    pub id: PetId,
    pub name: String,
    pub age: i32,
    pub pet_type: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Filter for listing pets
#[derive(Debug, Clone, Default)]
pub struct PetFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring match on the pet's name
    pub name: Option<String>,
    pub age: Option<i32>,
    pub pet_type: Option<String>,
    pub owner_id: Option<UserId>,
}

impl PetFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }

    /// Whether a pet satisfies the non-pagination parts of this filter.
    pub fn matches(&self, pet: &PetDBResponse) -> bool {
        if let Some(name) = &self.name
            && !pet.name.to_lowercase().contains(&name.to_lowercase())
        {
            return false;
        }
        if let Some(age) = self.age
            && pet.age != age
        {
            return false;
        }
        if let Some(pet_type) = &self.pet_type
            && &pet.pet_type != pet_type
        {
            return false;
        }
        if let Some(owner_id) = self.owner_id
            && pet.owner_id != owner_id
        {
            return false;
        }
        true
    }
}
