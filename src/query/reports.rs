// Rating reports built from review pipelines

use serde_json::{json, Value};

use crate::core::{Document, EntityKind};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DatabaseInterface;
use crate::models::MovieRating;
use crate::query::pipeline::{Accumulator, Pipeline, Predicate, Projection, SortOrder};

pub const TOP_GENRE: &str = "Sci-Fi";
pub const TOP_RATING_FLOOR: i64 = 3;
pub const TOP_LIMIT: usize = 3;

fn rating_projection() -> Vec<Projection> {
    vec![
        Projection::Include("title".to_string()),
        Projection::Include("genre".to_string()),
        Projection::Include("avgRating".to_string()),
        Projection::Include("reviewCount".to_string()),
    ]
}

/// Reviews grouped per movie, joined to the movie, best average first.
/// Groups whose movie no longer exists are dropped.
pub fn average_rating_pipeline() -> Pipeline {
    Pipeline::on(EntityKind::Review)
        .group(
            "movieId",
            vec![
                ("avgRating", Accumulator::Avg("rating".to_string())),
                ("reviewCount", Accumulator::Count),
            ],
        )
        .lookup(EntityKind::Movie, "_id", "movieData")
        .unwind("movieData")
        .project(
            vec![
                Projection::Rename {
                    field: "title".to_string(),
                    from: "movieData.title".to_string(),
                },
                Projection::Rename {
                    field: "genre".to_string(),
                    from: "movieData.genre".to_string(),
                },
                Projection::Include("avgRating".to_string()),
                Projection::Include("reviewCount".to_string()),
            ],
            true,
        )
        .sort("avgRating", SortOrder::Descending)
}

/// Reviews of `genre` movies rated at least `floor`, averaged per movie, best `limit` first.
pub fn top_rated_pipeline(genre: &str, floor: i64, limit: usize) -> Pipeline {
    Pipeline::on(EntityKind::Review)
        .lookup(EntityKind::Movie, "movieId", "movieData")
        .unwind("movieData")
        .matching(vec![
            Predicate::Eq("movieData.genre".to_string(), json!(genre)),
            Predicate::Gte("rating".to_string(), floor as f64),
        ])
        .group(
            "movieData._id",
            vec![
                ("title", Accumulator::First("movieData.title".to_string())),
                ("genre", Accumulator::First("movieData.genre".to_string())),
                ("avgRating", Accumulator::Avg("rating".to_string())),
                ("reviewCount", Accumulator::Count),
            ],
        )
        .sort("avgRating", SortOrder::Descending)
        .limit(limit)
        .project(rating_projection(), true)
}

pub async fn average_rating_per_movie(db: &dyn DatabaseInterface) -> AppResult<Vec<MovieRating>> {
    let rows = average_rating_pipeline().run(db).await?;
    into_ratings(rows)
}

pub async fn top_rated_in_genre(
    db: &dyn DatabaseInterface,
    genre: &str,
    floor: i64,
    limit: usize,
) -> AppResult<Vec<MovieRating>> {
    let rows = top_rated_pipeline(genre, floor, limit).run(db).await?;
    into_ratings(rows)
}

fn into_ratings(rows: Vec<Document>) -> AppResult<Vec<MovieRating>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(AppError::from))
        .collect()
}
