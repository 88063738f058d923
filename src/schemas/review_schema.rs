// Review entity schema

use crate::core::EntityKind;
use crate::ent_schema::{EntSchema, FieldDefinition, FieldType, FieldValidator, Timestamps};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

/// A rating of one movie by one user. Both references are weak.
pub struct ReviewSchema;

impl EntSchema for ReviewSchema {
    fn kind() -> EntityKind {
        EntityKind::Review
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("rating", FieldType::Int)
                .validate(FieldValidator::Range(MIN_RATING, MAX_RATING)),
            FieldDefinition::new("comment", FieldType::String).optional(),
            FieldDefinition::reference("movieId", EntityKind::Movie),
            FieldDefinition::reference("userId", EntityKind::User),
        ]
    }

    fn timestamps() -> Timestamps {
        Timestamps::CreatedOnly
    }
}
