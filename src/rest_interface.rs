// REST Interface - HTTP surface over the entity store and rating reports

use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};

use crate::{
    app_state::AppState,
    core::{Document, EntityKind, CREATED_AT},
    data_seeder,
    error::{AppError, AppResult},
    infrastructure::database::DatabaseInterface,
    models::MovieRating,
    query::{
        reports::{self, TOP_GENRE, TOP_LIMIT, TOP_RATING_FLOOR},
        FindQuery, Selection, SortOrder,
    },
};

/// JSON body extractor whose rejections go through `AppError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

type Created = (StatusCode, Json<Value>);

fn documents(docs: Vec<Document>) -> Json<Value> {
    Json(Value::Array(docs.into_iter().map(Value::Object).collect()))
}

async fn create(state: &AppState, kind: EntityKind, body: Document) -> AppResult<Created> {
    let doc = state.store.create(kind, &body).await?;
    Ok((StatusCode::CREATED, Json(Value::Object(doc))))
}

// Users

pub async fn create_user_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Document>,
) -> AppResult<Created> {
    create(&state, EntityKind::User, body).await
}

pub async fn list_users_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(documents(state.store.find_all(EntityKind::User).await?))
}

// Movies

pub async fn create_movie_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Document>,
) -> AppResult<Created> {
    create(&state, EntityKind::Movie, body).await
}

pub async fn list_movies_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    Ok(documents(state.store.find_all(EntityKind::Movie).await?))
}

pub async fn movie_ratings_handler(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<MovieRating>>> {
    let rows = reports::average_rating_per_movie(state.store.as_ref()).await?;
    tracing::debug!(rows = rows.len(), "average rating report");
    Ok(Json(rows))
}

pub async fn top_sci_fi_handler(State(state): State<AppState>) -> AppResult<Json<Vec<MovieRating>>> {
    let rows = reports::top_rated_in_genre(
        state.store.as_ref(),
        TOP_GENRE,
        TOP_RATING_FLOOR,
        TOP_LIMIT,
    )
    .await?;
    tracing::debug!(rows = rows.len(), genre = TOP_GENRE, "top rated report");
    Ok(Json(rows))
}

// Reviews

pub async fn create_review_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Document>,
) -> AppResult<Created> {
    create(&state, EntityKind::Review, body).await
}

/// Reviews with the author reduced to `{name}` and the movie to `{title}`
pub async fn list_reviews_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let docs = FindQuery::new(EntityKind::Review)
        .populate_select("userId", "name -_id".parse::<Selection>()?)
        .populate_select("movieId", "title -_id".parse::<Selection>()?)
        .exec(state.store.as_ref())
        .await?;
    Ok(documents(docs))
}

pub async fn seed_review_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let doc = data_seeder::seed_review(state.store.as_ref()).await?;
    Ok(Json(Value::Object(doc)))
}

// Posts

pub async fn create_post_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Document>,
) -> AppResult<Created> {
    create(&state, EntityKind::Post, body).await
}

pub async fn list_posts_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let docs = FindQuery::new(EntityKind::Post)
        .populate("user")
        .exec(state.store.as_ref())
        .await?;
    Ok(documents(docs))
}

/// Only what a feed shows: post title/content and author name/email, no ids
pub async fn clean_posts_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let docs = FindQuery::new(EntityKind::Post)
        .populate_select("user", "name email -_id".parse::<Selection>()?)
        .select("title content user -_id".parse::<Selection>()?)
        .exec(state.store.as_ref())
        .await?;
    Ok(documents(docs))
}

pub async fn latest_posts_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let docs = FindQuery::new(EntityKind::Post)
        .populate("user")
        .sort(CREATED_AT, SortOrder::Descending)
        .limit(state.config.features.latest_posts_limit)
        .exec(state.store.as_ref())
        .await?;
    Ok(documents(docs))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_handler))
        // Users
        .route("/users", get(list_users_handler).post(create_user_handler))
        // Movies and rating reports
        .route("/movies", get(list_movies_handler).post(create_movie_handler))
        .route("/movies/ratings", get(movie_ratings_handler))
        .route("/movies/top-sci-fi", get(top_sci_fi_handler))
        // Reviews
        .route("/reviews", get(list_reviews_handler).post(create_review_handler))
        // Posts
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/clean", get(clean_posts_handler))
        .route("/posts/latest", get(latest_posts_handler));

    if state.config.features.enable_seed_routes {
        tracing::warn!("development seed route /seed-review is enabled");
        router = router.route("/seed-review", get(seed_review_handler));
    }

    router.with_state(state)
}
