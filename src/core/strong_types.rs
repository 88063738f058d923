// Strong Types - identifiers, entity kinds and references shared by every layer

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Document identifier. Stored as a 64-bit snowflake, rendered as 16 lower-case hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(i64);

impl ObjectId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn value(self) -> i64 {
        self.0
    }

    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0 as u64)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0 as u64)
    }
}

impl FromStr for ObjectId {
    type Err = AppError;

    /// Accepts exactly 16 hex digits. Decimal numbers and other shapes are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AppError::Validation(format!(
                "Cast to ObjectId failed for value \"{}\"",
                s
            )));
        }
        u64::from_str_radix(s, 16)
            .map(|raw| Self(raw as i64))
            .map_err(|e| AppError::Validation(format!("Cast to ObjectId failed: {}", e)))
    }
}

impl From<ObjectId> for i64 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// The four stored record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Movie,
    Post,
    Review,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::User,
        EntityKind::Movie,
        EntityKind::Post,
        EntityKind::Review,
    ];

    /// Value of the `object_type` column
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Movie => "movie",
            EntityKind::Post => "post",
            EntityKind::Review => "review",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::DatabaseError(format!("Unknown object type: {}", s)))
    }
}

/// RFC 3339 with millisecond precision and a `Z` suffix; lexical order is chronological order.
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
