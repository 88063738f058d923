// Review Board - users, movies, posts and reviews over a document store,
// with reference expansion and rating reports

// Core types and primitives
pub mod core;

// Schema framework and the per-entity schemas
pub mod ent_schema;
pub mod schemas;

// Storage infrastructure
pub mod infrastructure;

// Typed models and report rows
pub mod models;

// Finds, field selection and aggregation pipelines
pub mod query;

// HTTP surface
pub mod rest_interface;

// Common utilities
pub mod app_state;
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
