//! Application context – holds the loaded catalog and engine config.

use crate::catalog::{Catalog, CatalogError};
use crate::state::{QueryState, SortMode, DEFAULT_PAGE_INCREMENT, DEFAULT_PAGE_SIZE};
use crate::traits::CatalogSource;
use serde::{Deserialize, Serialize};

/// Paging and sort defaults applied to fresh query states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_page_size: usize,
    pub page_increment: usize,
    pub default_sort: SortMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_page_size: DEFAULT_PAGE_SIZE,
            page_increment: DEFAULT_PAGE_INCREMENT,
            default_sort: SortMode::default(),
        }
    }
}

/// Central context passed to all engine commands.
///
/// The catalog is loaded once and never mutated, so a context can be
/// shared across threads behind an `Arc`.
pub struct AppContext {
    catalog: Catalog,
    pub config: EngineConfig,
}

impl AppContext {
    pub fn new(catalog: Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn load(source: &dyn CatalogSource, config: EngineConfig) -> Result<Self, CatalogError> {
        Ok(Self::new(Catalog::load(source)?, config))
    }

    /// A context with no records, for commands that never touch the catalog.
    pub fn empty() -> Self {
        Self::new(Catalog::default(), EngineConfig::default())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The state a first page view starts from.
    pub fn initial_state(&self) -> QueryState {
        QueryState::new(self.config.default_sort, self.config.initial_page_size)
    }
}
