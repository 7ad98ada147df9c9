//! Engine crate – the starter showcase query engine.
//!
//! Selects the starters to display from an immutable catalog: free-text
//! search, category and dependency facets, two sort modes, progressive
//! paging, and the facet counts that drive filter controls. Nothing here
//! renders anything; the CLI and daemon sit on top of the command registry.

pub mod catalog;
pub mod commands;
pub mod context;
pub mod query;
pub mod record;
pub mod scenario;
pub mod source;
pub mod state;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use catalog::Catalog;
pub use commands::CommandRegistry;
pub use context::{AppContext, EngineConfig};
pub use query::{run_query, EmptyStateReason, Facet, FacetCounts, ShowcaseView};
pub use record::{Dependency, StarterRecord};
pub use state::{QueryState, SortMode};
pub use types::{CommandResult, ErrorCode, ErrorInfo, Status};
