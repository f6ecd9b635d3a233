//! [`UserStore`] and [`PetStore`] backed by a PostgreSQL pool.
//!
//! Each call checks out a connection and hands it to the matching repository in
//! [`crate::db::handlers`].

use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    db::{
        PetStore, UserStore,
        errors::Result,
        handlers::{Pets, Repository, Users},
        models::{
            pets::{PetCreateDBRequest, PetDBResponse, PetFilter, PetUpdateDBRequest},
            users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
        },
    },
    types::{PetId, UserId},
};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_user_by_email(email).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_by_id(id).await
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<HashMap<UserId, UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).get_bulk(ids.to_vec()).await
    }

    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).create(request).await
    }

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).update(id, request).await
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).list(filter).await
    }

    async fn count(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Users::new(&mut conn).count(&UserFilter::new(0, 0)).await
    }
}

#[async_trait::async_trait]
impl PetStore for PostgresStore {
    async fn create(&self, request: &PetCreateDBRequest) -> Result<PetDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).create(request).await
    }

    async fn get(&self, id: PetId) -> Result<Option<PetDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).get_by_id(id).await
    }

    async fn list(&self, filter: &PetFilter) -> Result<Vec<PetDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).list(filter).await
    }

    async fn count(&self, filter: &PetFilter) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).count(filter).await
    }

    async fn update(&self, id: PetId, request: &PetUpdateDBRequest) -> Result<PetDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).update(id, request).await
    }

    async fn delete(&self, id: PetId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        Pets::new(&mut conn).delete(id).await
    }
}
