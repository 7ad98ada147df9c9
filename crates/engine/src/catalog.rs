//! Catalog – the immutable record set a session queries against.

use crate::query::{count_facet_values, run_query, Facet, QueryError, ShowcaseView};
use crate::record::StarterRecord;
use crate::state::QueryState;
use crate::traits::{CapError, CatalogSource};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate record id: {0}")]
    DuplicateId(String),

    #[error("cannot load catalog from {origin}: {source}")]
    Source {
        origin: String,
        #[source]
        source: CapError,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub records: usize,
    pub categories: usize,
    pub dependencies: usize,
    pub untagged: usize,
    pub without_dependencies: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<StarterRecord>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting records that reuse an id.
    pub fn new(records: Vec<StarterRecord>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, r) in records.iter().enumerate() {
            if by_id.insert(r.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(r.id.clone()));
            }
        }
        Ok(Self { records, by_id })
    }

    pub fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let records = source.load().map_err(|source_err| CatalogError::Source {
            origin: source.describe(),
            source: source_err,
        })?;
        let catalog = Self::new(records)?;
        tracing::debug!(origin = %source.describe(), records = catalog.len(), "catalog ready");
        Ok(catalog)
    }

    pub fn records(&self) -> &[StarterRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&StarterRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    pub fn query(&self, state: &QueryState) -> Result<ShowcaseView<'_>, QueryError> {
        run_query(&self.records, state)
    }

    pub fn stats(&self) -> CatalogStats {
        let all: Vec<&StarterRecord> = self.records.iter().collect();
        CatalogStats {
            records: self.records.len(),
            categories: count_facet_values(&all, Facet::Category).len(),
            dependencies: count_facet_values(&all, Facet::Dependency).len(),
            untagged: self.records.iter().filter(|r| r.tags.is_none()).count(),
            without_dependencies: self
                .records
                .iter()
                .filter(|r| r.dependencies.is_none())
                .count(),
        }
    }
}
