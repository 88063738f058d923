// Schema definitions module - centralized schema registry

pub mod post_schema;
pub mod review_schema;
pub mod simple_schemas;
pub mod user_schema;

use crate::ent_schema::SchemaRegistry;

pub use post_schema::PostSchema;
pub use review_schema::ReviewSchema;
pub use simple_schemas::MovieSchema;
pub use user_schema::UserSchema;

/// Initialize and register all schemas
pub fn create_schema_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    registry.register::<UserSchema>();
    registry.register::<MovieSchema>();
    registry.register::<PostSchema>();
    registry.register::<ReviewSchema>();

    registry
}

/// Validate all registered schemas
pub fn validate_schemas() -> Result<(), Vec<String>> {
    let registry = create_schema_registry();
    registry.validate()
}
