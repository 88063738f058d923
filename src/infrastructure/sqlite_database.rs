use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;

use crate::core::{Document, EntityKind, ObjectId, ID_FIELD};
use crate::ent_schema::SchemaRegistry;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::infrastructure::id_generator::{IdGenerator, MAX_NODES};
use crate::models::Entity;
use crate::schemas::create_schema_registry;

/// SQLite-backed entity store. Every kind shares one `objects` table holding JSON
/// documents; unique fields are claimed in `unique_keys` inside the insert transaction.
pub struct EntityStore {
    pool: SqlitePool,
    schemas: SchemaRegistry,
    id_generator: IdGenerator,
}

impl EntityStore {
    /// Open the pool. In-memory URLs get exactly one long-lived connection so all
    /// callers share the same database.
    pub async fn connect(database_url: &str, max_connections: u32, node_id: u16) -> AppResult<Self> {
        if node_id >= MAX_NODES {
            return Err(AppError::ConfigurationError(format!(
                "Node ID must be less than {}, got {}",
                MAX_NODES, node_id
            )));
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            // get_filename consumes the options, so inspect a copy
            let filename = options.clone().get_filename().to_path_buf();
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::ConfigurationError(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            pool_options = pool_options.max_connections(max_connections.max(1));
        }

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", database_url, e))
        })?;

        Ok(Self {
            pool,
            schemas: create_schema_registry(),
            id_generator: IdGenerator::new(node_id),
        })
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        let store = Self::connect("sqlite::memory:", 1, 0).await?;
        store.init().await?;
        Ok(store)
    }

    /// Create tables and indexes. Safe to run on every start.
    pub async fn init(&self) -> AppResult<()> {
        self.schemas.validate().map_err(|errors| {
            AppError::ConfigurationError(format!("Invalid schemas: {}", errors.join("; ")))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                id INTEGER PRIMARY KEY,
                object_type TEXT NOT NULL,
                data TEXT NOT NULL,
                created INTEGER NOT NULL,
                updated INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create objects table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS unique_keys (
                object_type TEXT NOT NULL,
                field TEXT NOT NULL,
                value TEXT NOT NULL,
                object_id INTEGER NOT NULL,
                PRIMARY KEY (object_type, field, value)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create unique_keys table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_objects_type ON objects(object_type, id)")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to create objects type index: {}", e))
            })?;

        Ok(())
    }

    /// Close the pool; further calls fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn count(&self, kind: EntityKind) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM objects WHERE object_type = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count {}: {}", kind, e)))?;
        Ok(row.get(0))
    }

    /// Typed point read
    pub async fn get_as<T: Entity>(&self, id: ObjectId) -> AppResult<Option<T>> {
        match self.get(T::KIND, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(Value::Object(doc))?)),
            None => Ok(None),
        }
    }

    /// Typed scan of a whole kind
    pub async fn find_all_as<T: Entity>(&self) -> AppResult<Vec<T>> {
        self.find_all(T::KIND)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(Value::Object(doc)).map_err(AppError::from))
            .collect()
    }

    fn row_to_document(row: &SqliteRow) -> AppResult<Document> {
        let id = ObjectId::new(row.get("id"));
        let data: String = row.get("data");
        let fields: Document = serde_json::from_str(&data).map_err(|e| {
            AppError::SerializationError(format!("Corrupt document {}: {}", id, e))
        })?;

        let mut doc = Document::with_capacity(fields.len() + 1);
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
        doc.extend(fields);
        Ok(doc)
    }
}

#[async_trait]
impl DatabaseInterface for EntityStore {
    fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    async fn create(&self, kind: EntityKind, fields: &Document) -> AppResult<Document> {
        let schema = self.schemas.get(kind)?;
        let prepared = schema.prepare(fields, Utc::now())?;
        let id = self.id_generator.next_id();
        let now = Utc::now().timestamp_millis();
        let data = serde_json::to_string(&prepared.document)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        for (field, value) in &prepared.unique_keys {
            let claimed = sqlx::query(
                "INSERT INTO unique_keys (object_type, field, value, object_id) VALUES (?, ?, ?, ?)",
            )
            .bind(kind.as_str())
            .bind(field)
            .bind(value)
            .bind(id.value())
            .execute(&mut *tx)
            .await;

            if let Err(e) = claimed {
                let duplicate = e
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if duplicate {
                    return Err(AppError::Validation(format!(
                        "E11000 duplicate key error: {} index: {}_1 dup key: {{ {}: {:?} }}",
                        kind, field, field, value
                    )));
                }
                return Err(AppError::DatabaseError(format!(
                    "Failed to claim unique {}.{}: {}",
                    kind, field, e
                )));
            }
        }

        sqlx::query(
            "INSERT INTO objects (id, object_type, data, created, updated) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.value())
        .bind(kind.as_str())
        .bind(&data)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create {} {}: {}", kind, id, e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(kind = %kind, id = %id, "created document");

        let mut doc = Document::with_capacity(prepared.document.len() + 1);
        doc.insert(ID_FIELD.to_string(), Value::String(id.to_hex()));
        doc.extend(prepared.document);
        Ok(doc)
    }

    async fn find_all(&self, kind: EntityKind) -> AppResult<Vec<Document>> {
        let rows = sqlx::query("SELECT id, data FROM objects WHERE object_type = ? ORDER BY id")
            .bind(kind.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list {}: {}", kind, e)))?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn get_many(&self, kind: EntityKind, ids: &[ObjectId]) -> AppResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, data FROM objects WHERE object_type = ");
        qb.push_bind(kind.as_str());
        qb.push(" AND id IN (");
        let mut separated = qb.separated(",");
        for id in ids {
            separated.push_bind(id.value());
        }
        qb.push(") ORDER BY id");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get {} objects: {}", kind, e)))?;

        rows.iter().map(Self::row_to_document).collect()
    }
}
