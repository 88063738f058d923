use serde_json::json;

use crate::{
    core::{Document, EntityKind},
    error::AppResult,
    infrastructure::database::DatabaseInterface,
};

/// Hard-coded targets of the seeded review. Nothing guarantees they exist.
pub const SEED_MOVIE_ID: &str = "6650fc1ed1f081d2";
pub const SEED_USER_ID: &str = "6650fbcfd1f081d2";

/// Inserts one fixed review for local development.
pub async fn seed_review(db: &dyn DatabaseInterface) -> AppResult<Document> {
    let fields = json!({
        "rating": 5,
        "comment": "Seeded review",
        "movieId": SEED_MOVIE_ID,
        "userId": SEED_USER_ID,
    });
    let fields = fields.as_object().cloned().unwrap_or_default();

    tracing::info!("seeding review for movie {}", SEED_MOVIE_ID);
    db.create(EntityKind::Review, &fields).await
}
