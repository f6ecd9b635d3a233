//! API request/response models for pets.

use super::pagination::{PageInfo, PagePagination};
use super::users::UserSummary;
use crate::db::models::pets::{PetCreateDBRequest, PetDBResponse, PetUpdateDBRequest};
use crate::errors::Error;
use crate::types::{PetId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetCreate {
    pub name: String,
    pub age: i32,
    #[serde(rename = "type")]
    pub pet_type: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    /// Defaults to the caller
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    #[serde(rename = "type")]
    pub pet_type: Option<String>,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
}

fn check_name(name: &str) -> Result<(), Error> {
    if name.trim().chars().count() < 2 {
        return Err(Error::BadRequest {
            message: "name must be at least 2 characters".to_string(),
        });
    }
    Ok(())
}

fn check_age(age: i32) -> Result<(), Error> {
    if age < 0 {
        return Err(Error::BadRequest {
            message: "age must not be negative".to_string(),
        });
    }
    Ok(())
}

fn check_not_blank(field: &str, value: Option<&str>) -> Result<(), Error> {
    if let Some(value) = value
        && value.trim().is_empty()
    {
        return Err(Error::BadRequest {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}

impl PetCreate {
    pub fn validate(&self) -> Result<(), Error> {
        check_name(&self.name)?;
        check_age(self.age)?;
        check_not_blank("type", Some(&self.pet_type))?;
        check_not_blank("breed", self.breed.as_deref())?;
        check_not_blank("color", self.color.as_deref())?;
        check_not_blank("imageUrl", self.image_url.as_deref())
    }

    pub fn into_db_request(self, owner_id: UserId) -> PetCreateDBRequest {
        PetCreateDBRequest {
            name: self.name,
            age: self.age,
            pet_type: self.pet_type,
            breed: self.breed,
            color: self.color,
            image_url: self.image_url,
            owner_id,
        }
    }
}

impl PetUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(age) = self.age {
            check_age(age)?;
        }
        check_not_blank("type", self.pet_type.as_deref())?;
        check_not_blank("breed", self.breed.as_deref())?;
        check_not_blank("color", self.color.as_deref())?;
        check_not_blank("imageUrl", self.image_url.as_deref())
    }
}

impl From<PetUpdate> for PetUpdateDBRequest {
    fn from(update: PetUpdate) -> Self {
        Self {
            name: update.name,
            age: update.age,
            pet_type: update.pet_type,
            breed: update.breed,
            color: update.color,
            image_url: update.image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetResponse {
    pub id: PetId,
    pub name: String,
    pub age: i32,
    #[serde(rename = "type")]
    pub pet_type: String,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only included where the owner was looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserSummary>,
}

impl From<PetDBResponse> for PetResponse {
    fn from(db: PetDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            age: db.age,
            pet_type: db.pet_type,
            breed: db.breed,
            color: db.color,
            image_url: db.image_url,
            owner_id: db.owner_id,
            created_at: db.created_at,
            updated_at: db.updated_at,
            owner: None,
        }
    }
}

impl PetResponse {
    pub fn with_owner(mut self, owner: UserSummary) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Query parameters for listing pets
#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPetsQuery {
    #[serde(flatten)]
    pub pagination: PagePagination,

    /// Case-insensitive substring match on the pet's name
    pub name: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub age: Option<i32>,

    #[serde(rename = "type")]
    pub pet_type: Option<String>,

    #[serde(alias = "owner_id")]
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetEnvelope {
    pub message: String,
    pub pet: PetResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetListResponse {
    pub message: String,
    pub pets: Vec<PetResponse>,
    pub pagination: PageInfo,
}

/// An owner together with every pet they own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerWithPets {
    #[serde(flatten)]
    pub owner: UserSummary,
    pub pets: Vec<PetResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerEnvelope {
    pub message: String,
    pub owner: OwnerWithPets,
}
