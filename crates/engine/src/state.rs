//! Query state – the immutable snapshot every query runs against.
//!
//! The engine never mutates a `QueryState`. Toggling a filter, typing a
//! search term or revealing more rows all build a new value, which the
//! caller then feeds back into [`crate::query::run_query`].

use crate::query::QueryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use url::form_urlencoded;

/// Rows shown before the first "load more".
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Rows added by each "load more".
pub const DEFAULT_PAGE_INCREMENT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    #[serde(rename = "recent", alias = "most_recent")]
    MostRecent,
    #[serde(rename = "stars", alias = "most_stars")]
    MostStars,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::MostRecent => "recent",
            SortMode::MostStars => "stars",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortMode::MostRecent => "Most recent",
            SortMode::MostStars => "Most stars",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortMode::MostRecent => SortMode::MostStars,
            SortMode::MostStars => SortMode::MostRecent,
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" | "most_recent" => Ok(SortMode::MostRecent),
            "stars" | "most_stars" => Ok(SortMode::MostStars),
            other => Err(QueryError::InvalidArgument(format!(
                "unknown sort mode: {} (available: recent, stars)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryState {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub category_filters: BTreeSet<String>,
    #[serde(default)]
    pub dependency_filters: BTreeSet<String>,
    #[serde(default)]
    pub sort_mode: SortMode,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(SortMode::default(), DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    pub fn new(sort_mode: SortMode, page_size: usize) -> Self {
        Self {
            search_term: String::new(),
            category_filters: BTreeSet::new(),
            dependency_filters: BTreeSet::new(),
            sort_mode,
            page_size,
        }
    }

    /// Reject states the pipeline has no meaning for.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page_size == 0 {
            return Err(QueryError::InvalidArgument(
                "page_size must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    /// True when the search box or either facet narrows the result.
    pub fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty()
            || !self.category_filters.is_empty()
            || !self.dependency_filters.is_empty()
    }

    pub fn with_search(&self, term: impl Into<String>) -> Self {
        Self {
            search_term: term.into(),
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort_mode: SortMode) -> Self {
        Self {
            sort_mode,
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: usize) -> Self {
        Self {
            page_size,
            ..self.clone()
        }
    }

    pub fn toggle_category(&self, value: &str) -> Self {
        let mut next = self.clone();
        toggle(&mut next.category_filters, value);
        next
    }

    pub fn toggle_dependency(&self, value: &str) -> Self {
        let mut next = self.clone();
        toggle(&mut next.dependency_filters, value);
        next
    }

    pub fn toggle_sort(&self) -> Self {
        self.with_sort(self.sort_mode.toggled())
    }

    /// Clears search and both facets; sort mode and page size survive.
    pub fn reset_filters(&self) -> Self {
        Self::new(self.sort_mode, self.page_size)
    }

    pub fn load_more(&self, increment: usize) -> Self {
        self.with_page_size(self.page_size.saturating_add(increment))
    }

    /// Parse the showcase URL state: `s`, repeated `c` and `d`, and `sort`.
    ///
    /// Keys not listed are ignored. Sort mode and page size fall back to
    /// `defaults` when the query does not carry them.
    pub fn from_url_query(query: &str, defaults: &QueryState) -> Result<Self, QueryError> {
        let query = query.trim_start_matches('?');
        let mut state = defaults.reset_filters();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "s" => state.search_term = value.into_owned(),
                "c" if !value.is_empty() => {
                    state.category_filters.insert(value.into_owned());
                }
                "d" if !value.is_empty() => {
                    state.dependency_filters.insert(value.into_owned());
                }
                "sort" => state.sort_mode = value.parse()?,
                _ => {}
            }
        }

        Ok(state)
    }

    /// Inverse of [`QueryState::from_url_query`]. Page size is view state and
    /// is not encoded.
    pub fn to_url_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if !self.search_term.is_empty() {
            out.append_pair("s", &self.search_term);
        }
        for c in &self.category_filters {
            out.append_pair("c", c);
        }
        for d in &self.dependency_filters {
            out.append_pair("d", d);
        }
        out.append_pair("sort", self.sort_mode.as_str());
        out.finish()
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
