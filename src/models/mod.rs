// Typed views of stored documents and report rows

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::{EntityKind, ObjectId};

/// A model that can be read back from documents of one kind
pub trait Entity: DeserializeOwned + Send {
    const KIND: EntityKind;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub genre: Option<String>,
    pub release_year: Option<i64>,
    pub director: Option<String>,
}

impl Entity for Movie {
    const KIND: EntityKind = EntityKind::Movie;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: Option<String>,
    pub content: Option<String>,
    pub user: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const KIND: EntityKind = EntityKind::Post;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub rating: i64,
    pub comment: Option<String>,
    pub movie_id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Review {
    const KIND: EntityKind = EntityKind::Review;
}

/// One row of the per-movie rating reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRating {
    pub title: String,
    pub genre: Option<String>,
    pub avg_rating: f64,
    pub review_count: i64,
}
