//! Transactional record store behind the services.
//!
//! [`PgStore`] runs every write inside its own transaction; a transaction
//! that is dropped before `commit` rolls back, so an early `?` never leaves
//! partial rows behind.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::Date;

use crate::auth::{self, repo_types::User, services::UserIdentity};
use crate::entries::{
    self,
    repo_types::{FoodEntry, NewFoodEntry},
};
use crate::products::{
    self,
    repo_types::{NewProduct, Product},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,
    #[error("row no longer exists")]
    Missing,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Like `From<sqlx::Error>`, but recognises unique violations.
    pub fn from_insert(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(e),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the barcode is already stored.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// Only returns the entry when it belongs to `user_id`.
    async fn find_entry(&self, id: i64, user_id: &str) -> Result<Option<FoodEntry>, StoreError>;

    async fn list_entries(
        &self,
        user_id: &str,
        date: Option<Date>,
    ) -> Result<Vec<FoodEntry>, StoreError>;

    async fn insert_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry, StoreError>;

    async fn delete_entry(&self, entry: &FoodEntry) -> Result<(), StoreError>;

    async fn sync_user(&self, identity: &UserIdentity) -> Result<(User, bool), StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_product_by_barcode(&self, barcode: &str) -> Result<Option<Product>, StoreError> {
        products::repo::find_by_barcode(&self.db, barcode).await
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.db.begin().await?;
        let product = products::repo::insert_tx(&mut tx, &product).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn find_entry(&self, id: i64, user_id: &str) -> Result<Option<FoodEntry>, StoreError> {
        entries::repo::find_owned(&self.db, id, user_id).await
    }

    async fn list_entries(
        &self,
        user_id: &str,
        date: Option<Date>,
    ) -> Result<Vec<FoodEntry>, StoreError> {
        entries::repo::list_by_user(&self.db, user_id, date).await
    }

    async fn insert_entry(&self, entry: NewFoodEntry) -> Result<FoodEntry, StoreError> {
        let mut tx = self.db.begin().await?;
        let entry = entries::repo::insert_tx(&mut tx, &entry).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn delete_entry(&self, entry: &FoodEntry) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        entries::repo::delete_tx(&mut tx, entry.id, &entry.user_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn sync_user(&self, identity: &UserIdentity) -> Result<(User, bool), StoreError> {
        let mut tx = self.db.begin().await?;
        let synced = auth::repo::sync_tx(&mut tx, identity).await?;
        tx.commit().await?;
        Ok(synced)
    }
}
