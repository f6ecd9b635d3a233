//! Database repository for pets.

use std::collections::HashMap;

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::pets::{PetCreateDBRequest, PetDBResponse, PetFilter, PetUpdateDBRequest},
};
use crate::types::{PetId, abbrev_uuid};
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const PET_COLUMNS: &str = "id, name, age, pet_type, breed, color, image_url, owner_id, created_at, updated_at";

pub struct Pets<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Pets<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Delete a pet by ID, returning whether a row was removed
    #[instrument(skip(self), fields(pet_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: PetId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM pets WHERE id = $1").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Append the non-pagination parts of a pet filter as `AND` clauses.
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &PetFilter) {
    if let Some(ref name) = filter.name {
        query.push(" AND STRPOS(LOWER(name), LOWER(");
        query.push_bind(name.clone());
        query.push(")) > 0");
    }
    if let Some(age) = filter.age {
        query.push(" AND age = ");
        query.push_bind(age);
    }
    if let Some(ref pet_type) = filter.pet_type {
        query.push(" AND pet_type = ");
        query.push_bind(pet_type.clone());
    }
    if let Some(owner_id) = filter.owner_id {
        query.push(" AND owner_id = ");
        query.push_bind(owner_id);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Pets<'c> {
    type CreateRequest = PetCreateDBRequest;
    type UpdateRequest = PetUpdateDBRequest;
    type Response = PetDBResponse;
    type Id = PetId;
    type Filter = PetFilter;

    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&request.owner_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let pet = sqlx::query_as::<_, PetDBResponse>(&format!(
            r#"
            INSERT INTO pets (id, name, age, pet_type, breed, color, image_url, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.age)
        .bind(&request.pet_type)
        .bind(request.breed.as_deref())
        .bind(request.color.as_deref())
        .bind(request.image_url.as_deref())
        .bind(request.owner_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(pet)
    }

    #[instrument(skip(self), fields(pet_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let pet = sqlx::query_as::<_, PetDBResponse>(&format!("SELECT {PET_COLUMNS} FROM pets WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(pet)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let pets = sqlx::query_as::<_, PetDBResponse>(&format!("SELECT {PET_COLUMNS} FROM pets WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(pets.into_iter().map(|pet| (pet.id, pet)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(format!("SELECT {PET_COLUMNS} FROM pets WHERE 1=1"));
        push_filter(&mut query, filter);

        query.push(" ORDER BY created_at, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let pets = query.build_query_as::<PetDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(pets)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM pets WHERE 1=1");
        push_filter(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self, request), fields(pet_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let pet = sqlx::query_as::<_, PetDBResponse>(&format!(
            r#"
            UPDATE pets SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                pet_type = COALESCE($4, pet_type),
                breed = COALESCE($5, breed),
                color = COALESCE($6, color),
                image_url = COALESCE($7, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.name.as_deref())
        .bind(request.age)
        .bind(request.pet_type.as_deref())
        .bind(request.breed.as_deref())
        .bind(request.color.as_deref())
        .bind(request.image_url.as_deref())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(pet)
    }
}
