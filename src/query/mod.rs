// Query/report layer - direct finds with expansion, and aggregation pipelines

pub mod find;
pub mod pipeline;
pub mod reports;
pub mod selection;

pub use find::{find_with_reference_expansion, FindQuery};
pub use pipeline::{Accumulator, Pipeline, Predicate, Projection, SortOrder, Stage};
pub use reports::{average_rating_per_movie, top_rated_in_genre};
pub use selection::Selection;
