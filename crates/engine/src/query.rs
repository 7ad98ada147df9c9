//! Query engine – search, facet filtering, facet counts, sorting, paging.
//!
//! Every function here is pure: it borrows the records it is given and
//! returns a new selection. [`run_query`] strings them together in the
//! fixed order the showcase relies on:
//!
//! 1. free-text search over the full record set
//! 2. category filter
//! 3. dependency filter
//! 4. / 5. facet counts over the result of (3)
//! 6. sort
//! 7. paginate
//! 8. empty-state reason when (3) is empty

use crate::record::{Dependency, StarterRecord};
use crate::state::{QueryState, SortMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// A filterable dimension over the record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Category tags.
    Category,
    /// Dependency names (the version half of each pair is ignored).
    Dependency,
}

impl Facet {
    /// Values this record carries for the facet, or `None` when the
    /// underlying field is absent.
    pub fn extract(self, record: &StarterRecord) -> Option<BTreeSet<&str>> {
        match self {
            Facet::Category => record
                .tags
                .as_ref()
                .map(|tags| tags.iter().map(String::as_str).collect()),
            Facet::Dependency => record
                .dependencies
                .as_ref()
                .map(|deps| deps.iter().map(Dependency::name).collect()),
        }
    }
}

impl FromStr for Facet {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" | "categories" | "c" => Ok(Facet::Category),
            "dependency" | "dependencies" | "d" => Ok(Facet::Dependency),
            other => Err(QueryError::InvalidArgument(format!(
                "unknown facet: {} (available: category, dependency)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetOrder {
    /// Highest count first, ties broken by name.
    #[default]
    Count,
    Name,
}

impl FromStr for FacetOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(FacetOrder::Count),
            "name" => Ok(FacetOrder::Name),
            other => Err(QueryError::InvalidArgument(format!(
                "unknown facet order: {} (available: count, name)",
                other
            ))),
        }
    }
}

/// Facet value → number of records carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetCounts(BTreeMap<String, usize>);

impl FacetCounts {
    pub fn get(&self, value: &str) -> usize {
        self.0.get(value).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn sorted(&self, order: FacetOrder) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, usize)> = self.iter().collect();
        if order == FacetOrder::Count {
            // Entries arrive name-ordered, so a stable sort keeps name as the tiebreak.
            entries.sort_by(|a, b| b.1.cmp(&a.1));
        }
        entries
    }
}

impl<const N: usize> From<[(&str, usize); N]> for FacetCounts {
    fn from(entries: [(&str, usize); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Case-insensitive substring match against each record's search text.
///
/// Not a ranked search: matching records keep their input order. An empty
/// term matches everything.
pub fn search<'a>(records: &[&'a StarterRecord], term: &str) -> Vec<&'a StarterRecord> {
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .copied()
        .filter(|r| r.search_text().to_lowercase().contains(&needle))
        .collect()
}

/// Keep records whose facet values are a superset of `selected`.
///
/// A record lacking the facet's field fails whenever `selected` is
/// non-empty.
pub fn filter_by_facet<'a>(
    records: &[&'a StarterRecord],
    selected: &BTreeSet<String>,
    facet: Facet,
) -> Vec<&'a StarterRecord> {
    if selected.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .copied()
        .filter(|r| match facet.extract(r) {
            Some(values) => selected.iter().all(|s| values.contains(s.as_str())),
            None => false,
        })
        .collect()
}

/// Count how many records carry each facet value.
pub fn count_facet_values(records: &[&StarterRecord], facet: Facet) -> FacetCounts {
    let mut counts = BTreeMap::new();
    for values in records.iter().filter_map(|r| facet.extract(r)) {
        for value in values {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    FacetCounts(counts)
}

/// Stable, descending sort by the key `mode` selects.
pub fn sort(records: &mut [&StarterRecord], mode: SortMode) {
    match mode {
        SortMode::MostStars => records.sort_by(|a, b| b.stars.cmp(&a.stars)),
        SortMode::MostRecent => records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
    }
}

pub fn paginate<'r, 'a>(records: &'r [&'a StarterRecord], page_size: usize) -> &'r [&'a StarterRecord] {
    &records[..page_size.min(records.len())]
}

/// Whether a "load more" action would reveal anything.
pub fn has_more(page_size: usize, matched: usize) -> bool {
    page_size < matched
}

// ---------------------------------------------------------------------------
// Empty state
// ---------------------------------------------------------------------------

/// Why zero records matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EmptyStateReason {
    Search(String),
    Dependency(String),
    Matching,
}

impl EmptyStateReason {
    /// Search term first, then a lone dependency filter, then the generic label.
    pub fn for_state(state: &QueryState) -> Self {
        if !state.search_term.is_empty() {
            return EmptyStateReason::Search(state.search_term.clone());
        }
        if state.dependency_filters.len() == 1 {
            if let Some(dep) = state.dependency_filters.iter().next() {
                return EmptyStateReason::Dependency(dep.clone());
            }
        }
        EmptyStateReason::Matching
    }

    pub fn label(&self) -> &str {
        match self {
            EmptyStateReason::Search(term) => term,
            EmptyStateReason::Dependency(dep) => dep,
            EmptyStateReason::Matching => "matching",
        }
    }

    pub fn message(&self) -> String {
        format!("No {} starters found!", self.label())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything a presentation layer needs to render one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowcaseView<'a> {
    pub records: Vec<&'a StarterRecord>,
    /// Size of the full record set.
    pub total: usize,
    /// Records left after search and both facet filters.
    pub matched: usize,
    pub has_more: bool,
    pub categories: FacetCounts,
    pub dependencies: FacetCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyStateReason>,
}

pub fn run_query<'a>(
    records: &'a [StarterRecord],
    state: &QueryState,
) -> Result<ShowcaseView<'a>, QueryError> {
    state.validate()?;

    let all: Vec<&StarterRecord> = records.iter().collect();
    let searched = search(&all, &state.search_term);
    let by_category = filter_by_facet(&searched, &state.category_filters, Facet::Category);
    let mut matched = filter_by_facet(&by_category, &state.dependency_filters, Facet::Dependency);

    let categories = count_facet_values(&matched, Facet::Category);
    let dependencies = count_facet_values(&matched, Facet::Dependency);

    sort(&mut matched, state.sort_mode);
    let visible = paginate(&matched, state.page_size).to_vec();

    let empty_state = if matched.is_empty() {
        Some(EmptyStateReason::for_state(state))
    } else {
        None
    };

    tracing::debug!(
        total = records.len(),
        searched = searched.len(),
        by_category = by_category.len(),
        matched = matched.len(),
        visible = visible.len(),
        sort = %state.sort_mode,
        "showcase query"
    );

    Ok(ShowcaseView {
        records: visible,
        total: records.len(),
        matched: matched.len(),
        has_more: has_more(state.page_size, matched.len()),
        categories,
        dependencies,
        empty_state,
    })
}
