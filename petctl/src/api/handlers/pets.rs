use std::collections::HashMap;

use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, info};

use crate::{
    AppState,
    api::{
        extract::{JsonBody, PathParam, QueryParams},
        models::{
            pagination::PageInfo,
            pets::{ListPetsQuery, OwnerEnvelope, OwnerWithPets, PetCreate, PetEnvelope, PetListResponse, PetResponse, PetUpdate},
            users::{Role, UserSummary},
        },
    },
    auth::permissions::{RequiresPermission, permission},
    db::{
        errors::DbError,
        models::{
            pets::{PetDBResponse, PetFilter, PetUpdateDBRequest},
            users::UserDBResponse,
        },
    },
    errors::Error,
    types::{PetId, UserId, abbrev_uuid},
};

const PET_NOT_FOUND: &str = "Pet not found";

fn pet_not_found() -> Error {
    Error::NotFound {
        message: PET_NOT_FOUND.to_string(),
    }
}

/// Attach each pet's owner summary. Pets whose owner has vanished are returned without one.
fn with_owners(pets: Vec<PetDBResponse>, owners: &HashMap<UserId, UserDBResponse>) -> Vec<PetResponse> {
    pets.into_iter()
        .map(|pet| {
            let owner = owners.get(&pet.owner_id).map(UserSummary::from);
            let response = PetResponse::from(pet);
            match owner {
                Some(owner) => response.with_owner(owner),
                None => response,
            }
        })
        .collect()
}

async fn load_with_owner(state: &AppState, pet: PetDBResponse) -> Result<PetResponse, Error> {
    let owner = state.users.find_by_id(pet.owner_id).await?;
    let response = PetResponse::from(pet);
    Ok(match owner {
        Some(owner) => response.with_owner(owner.into()),
        None => response,
    })
}

/// List pets, page by page, with optional filters
#[tracing::instrument(skip_all)]
pub async fn list_pets(
    State(state): State<AppState>,
    _: RequiresPermission<permission::GetPets>,
    QueryParams(query): QueryParams<ListPetsQuery>,
) -> Result<Json<PetListResponse>, Error> {
    let page = query.pagination.page();
    let limit = query.pagination.limit();
    let filter = PetFilter {
        skip: query.pagination.skip(),
        limit,
        name: query.name.filter(|name| !name.is_empty()),
        age: query.age,
        pet_type: query.pet_type.filter(|pet_type| !pet_type.is_empty()),
        owner_id: query.owner_id,
    };

    let total = state.pets.count(&filter).await?;
    let pets = state.pets.list(&filter).await?;
    if pets.is_empty() {
        return Err(Error::NotFound {
            message: "No pets found.".to_string(),
        });
    }

    let mut owner_ids: Vec<UserId> = pets.iter().map(|pet| pet.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();
    let owners = state.users.find_many(&owner_ids).await?;
    debug!(total, page, returned = pets.len(), "Listed pets");

    Ok(Json(PetListResponse {
        message: "Pets fetched successfully!".to_string(),
        pets: with_owners(pets, &owners),
        pagination: PageInfo::new(total, page, limit),
    }))
}

/// Add a pet. The owner defaults to the caller.
#[tracing::instrument(skip_all)]
pub async fn create_pet(
    State(state): State<AppState>,
    caller: RequiresPermission<permission::CreatePet>,
    JsonBody(request): JsonBody<PetCreate>,
) -> Result<(StatusCode, Json<PetEnvelope>), Error> {
    request.validate()?;

    let owner_id = request.owner_id.unwrap_or(caller.user_id);
    let owner = state.users.find_by_id(owner_id).await?.ok_or_else(|| Error::BadRequest {
        message: "Owner does not exist".to_string(),
    })?;

    let pet = match state.pets.create(&request.into_db_request(owner_id)).await {
        Ok(pet) => pet,
        // Owner deleted between the lookup and the insert
        Err(DbError::ForeignKeyViolation { .. }) => {
            return Err(Error::BadRequest {
                message: "Owner does not exist".to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    info!(pet_id = %abbrev_uuid(&pet.id), owner_id = %abbrev_uuid(&owner_id), "Pet added");

    Ok((
        StatusCode::CREATED,
        Json(PetEnvelope {
            message: "Pet added successfully!".to_string(),
            pet: PetResponse::from(pet).with_owner(owner.into()),
        }),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn get_pet(
    State(state): State<AppState>,
    _: RequiresPermission<permission::GetPets>,
    PathParam(pet_id): PathParam<PetId>,
) -> Result<Json<PetEnvelope>, Error> {
    let pet = state.pets.get(pet_id).await?.ok_or_else(pet_not_found)?;

    Ok(Json(PetEnvelope {
        message: "Pet fetched successfully!".to_string(),
        pet: load_with_owner(&state, pet).await?,
    }))
}

/// An owner and all of their pets.
///
/// Mounted behind a [`crate::auth::middleware::PermissionGuard`] for `GET_PETS`, so the handler
/// itself takes no permission extractor.
#[tracing::instrument(skip_all)]
pub async fn get_owner_pets(State(state): State<AppState>, PathParam(owner_id): PathParam<UserId>) -> Result<Json<OwnerEnvelope>, Error> {
    let owner = state.users.find_by_id(owner_id).await?.ok_or_else(|| Error::NotFound {
        message: "Owner not found".to_string(),
    })?;

    let mut filter = PetFilter {
        owner_id: Some(owner_id),
        ..Default::default()
    };
    filter.limit = state.pets.count(&filter).await?;
    let pets = state.pets.list(&filter).await?;

    Ok(Json(OwnerEnvelope {
        message: "Owner fetched successfully!".to_string(),
        owner: OwnerWithPets {
            owner: owner.into(),
            pets: pets.into_iter().map(PetResponse::from).collect(),
        },
    }))
}

/// Partially update a pet. Only its owner, or a SuperAdmin, may do so.
#[tracing::instrument(skip_all)]
pub async fn update_pet(
    State(state): State<AppState>,
    caller: RequiresPermission<permission::UpdatePet>,
    PathParam(pet_id): PathParam<PetId>,
    JsonBody(request): JsonBody<PetUpdate>,
) -> Result<Json<PetEnvelope>, Error> {
    request.validate()?;

    let existing = state.pets.get(pet_id).await?.ok_or_else(pet_not_found)?;
    if existing.owner_id != caller.user_id && caller.role != Role::SuperAdmin {
        return Err(Error::Forbidden {
            message: Some("You are not the owner of this pet".to_string()),
        });
    }

    let pet = match state.pets.update(pet_id, &PetUpdateDBRequest::from(request)).await {
        Ok(pet) => pet,
        Err(DbError::NotFound) => return Err(pet_not_found()),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(PetEnvelope {
        message: "Pet updated successfully!".to_string(),
        pet: load_with_owner(&state, pet).await?,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn delete_pet(
    State(state): State<AppState>,
    caller: RequiresPermission<permission::DeletePet>,
    PathParam(pet_id): PathParam<PetId>,
) -> Result<Json<PetEnvelope>, Error> {
    let pet = state.pets.get(pet_id).await?.ok_or_else(pet_not_found)?;
    if !state.pets.delete(pet_id).await? {
        return Err(pet_not_found());
    }
    info!(pet_id = %abbrev_uuid(&pet_id), by = %abbrev_uuid(&caller.user_id), "Pet deleted");

    Ok(Json(PetEnvelope {
        message: "Pet deleted successfully".to_string(),
        pet: pet.into(),
    }))
}
