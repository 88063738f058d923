// User entity schema

use crate::core::EntityKind;
use crate::ent_schema::{EntSchema, FieldDefinition, FieldType};

/// Users are referenced by posts and reviews; `email` is unique across all users.
pub struct UserSchema;

impl EntSchema for UserSchema {
    fn kind() -> EntityKind {
        EntityKind::User
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("name", FieldType::String),
            FieldDefinition::new("email", FieldType::String).unique(),
        ]
    }
}
