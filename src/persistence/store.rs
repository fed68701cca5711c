//! Durable record store for places fetched from vendors

use crate::error::ValidationError;
use crate::place::{AttributeValue, Place, PlaceSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// A place as it was written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlace {
    /// Store-assigned record id, distinct from the place id
    pub id: String,
    pub place: Place,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PlaceStore: Send + Sync {
    /// Write a new record and return its id
    async fn save_place(&self, place: &Place) -> Result<String, StoreError>;
    async fn get_place(&self, id: &str) -> Result<Option<StoredPlace>, StoreError>;
}

pub struct SqlitePlaceStore {
    pool: SqlitePool,
}

impl SqlitePlaceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect, creating the database file and schema when missing
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database; lives as long as its single connection
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS places (
                id TEXT PRIMARY KEY,
                place_id TEXT NOT NULL,
                source TEXT NOT NULL,
                name TEXT NOT NULL,
                address TEXT NOT NULL DEFAULT '',
                latitude REAL,
                longitude REAL,
                additional_data TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_places_source_place_id ON places (source, place_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query("SELECT COUNT(*) AS count FROM places")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;
        Ok(count)
    }

    fn row_to_stored(row: &SqliteRow) -> Result<StoredPlace, StoreError> {
        let id: String = row.try_get("id")?;
        let corrupt = |reason: String| StoreError::Corrupt {
            id: id.clone(),
            reason,
        };

        let source: PlaceSource = row
            .try_get::<String, _>("source")?
            .parse()
            .map_err(|e: ValidationError| corrupt(e.to_string()))?;
        let additional_data: BTreeMap<String, AttributeValue> =
            serde_json::from_str(&row.try_get::<String, _>("additional_data")?)?;
        let created_at = DateTime::parse_from_rfc3339(&row.try_get::<String, _>("created_at")?)
            .map_err(|e| corrupt(e.to_string()))?
            .with_timezone(&Utc);

        let mut place = Place::new(
            row.try_get::<String, _>("place_id")?,
            row.try_get::<String, _>("name")?,
            source,
        )
        .map_err(|e| corrupt(e.to_string()))?
        .with_address(row.try_get::<String, _>("address")?);
        place.latitude = row.try_get("latitude")?;
        place.longitude = row.try_get("longitude")?;
        place.additional_data = additional_data;

        Ok(StoredPlace {
            id,
            place,
            created_at,
        })
    }
}

#[async_trait]
impl PlaceStore for SqlitePlaceStore {
    async fn save_place(&self, place: &Place) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let additional_data = serde_json::to_string(&place.additional_data)?;

        sqlx::query(
            r#"
            INSERT INTO places (id, place_id, source, name, address, latitude, longitude, additional_data, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&place.place_id)
        .bind(place.source.as_str())
        .bind(&place.name)
        .bind(&place.address)
        .bind(place.latitude)
        .bind(place.longitude)
        .bind(additional_data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get_place(&self, id: &str) -> Result<Option<StoredPlace>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, place_id, source, name, address, latitude, longitude, additional_data, created_at
            FROM places
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_stored).transpose()
    }
}
