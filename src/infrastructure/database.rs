// Database Interface - the document operations the query layer is written against

use async_trait::async_trait;

use crate::core::{Document, EntityKind, ObjectId};
use crate::ent_schema::SchemaRegistry;
use crate::error::AppResult;

/// Read/insert surface of the entity store. The query and report layers only see this
/// trait, so they never touch SQL directly.
#[async_trait]
pub trait DatabaseInterface: Send + Sync {
    /// Schemas of every stored kind
    fn schemas(&self) -> &SchemaRegistry;

    /// Cast, validate and insert a new document. Returns it with `_id` and timestamps.
    async fn create(&self, kind: EntityKind, fields: &Document) -> AppResult<Document>;

    /// Every document of a kind, in insertion order
    async fn find_all(&self, kind: EntityKind) -> AppResult<Vec<Document>>;

    /// Documents of `kind` whose `_id` is in `ids`. Missing ids are skipped.
    async fn get_many(&self, kind: EntityKind, ids: &[ObjectId]) -> AppResult<Vec<Document>>;

    async fn get(&self, kind: EntityKind, id: ObjectId) -> AppResult<Option<Document>> {
        Ok(self.get_many(kind, &[id]).await?.into_iter().next())
    }
}
