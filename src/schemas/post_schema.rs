// Post entity schema

use crate::core::EntityKind;
use crate::ent_schema::{EntSchema, FieldDefinition, FieldType, Timestamps};

pub struct PostSchema;

impl EntSchema for PostSchema {
    fn kind() -> EntityKind {
        EntityKind::Post
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("title", FieldType::String).optional(),
            FieldDefinition::new("content", FieldType::String).optional(),
            // Author
            FieldDefinition::reference("user", EntityKind::User),
        ]
    }

    fn timestamps() -> Timestamps {
        Timestamps::CreatedAndUpdated
    }
}
