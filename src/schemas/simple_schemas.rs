// Schemas with no references or constraints beyond a required field

use crate::core::EntityKind;
use crate::ent_schema::{EntSchema, FieldDefinition, FieldType};

pub struct MovieSchema;

impl EntSchema for MovieSchema {
    fn kind() -> EntityKind {
        EntityKind::Movie
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("title", FieldType::String),
            FieldDefinition::new("genre", FieldType::String).optional(),
            FieldDefinition::new("releaseYear", FieldType::Int).optional(),
            FieldDefinition::new("director", FieldType::String).optional(),
        ]
    }
}
