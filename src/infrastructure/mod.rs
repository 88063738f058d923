// Storage infrastructure

pub mod database; // Database interface
pub mod id_generator; // ID generation system
pub mod sqlite_database; // SQLite entity store

pub use database::DatabaseInterface;
pub use id_generator::IdGenerator;
pub use sqlite_database::EntityStore;
