//! Command registry and built-in showcase commands.
//!
//! Commands are registered by name and invoked with JSON input/output.

use crate::context::AppContext;
use crate::query::{Facet, FacetCounts, FacetOrder, QueryError, ShowcaseView};
use crate::state::QueryState;
use crate::types::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

/// Signature for all engine commands.
pub type CommandHandler = fn(Value, &AppContext) -> Result<Value, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CommandError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            CommandError::NotFound(_) => ErrorCode::NotFound,
            CommandError::Io(_) => ErrorCode::IoError,
            CommandError::Other(_) => ErrorCode::InternalError,
        }
    }
}

impl From<QueryError> for CommandError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidArgument(m) => CommandError::InvalidArgument(m),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub struct CommandRegistry {
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        // Register built-in commands
        reg.register("ping", cmd_ping);
        reg.register("query", cmd_query);
        reg.register("facets", cmd_facets);
        reg.register("get", cmd_get);
        reg.register("stats", cmd_stats);
        reg
    }

    pub fn register(&mut self, name: &str, handler: CommandHandler) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Execute a command by name and return a full CommandResult.
    pub fn execute(&self, name: &str, args: Value, ctx: &AppContext) -> CommandResult {
        let run_id = new_run_id();
        let start = Instant::now();

        let handler = match self.handlers.get(name) {
            Some(h) => h,
            None => {
                return result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    ErrorCode::InvalidArgument,
                    format!("unknown command: {}", name),
                );
            }
        };

        match handler(args, ctx) {
            Ok(data) => {
                let mut r = result_ok("call", name, &run_id, start.elapsed().as_millis() as u64);
                r.data = Some(data);
                r
            }
            Err(e) => {
                tracing::debug!(command = name, error = %e, "command failed");
                result_err(
                    "call",
                    name,
                    &run_id,
                    start.elapsed().as_millis() as u64,
                    e.error_code(),
                    e.to_string(),
                )
            }
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, CommandError> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| CommandError::InvalidArgument(e.to_string()))
}

/// Query arguments shared by `query` and `facets`.
///
/// `url` seeds the state from the showcase URL encoding; the remaining
/// fields are applied on top of it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryArgs {
    url: Option<String>,
    search: Option<String>,
    categories: Vec<String>,
    dependencies: Vec<String>,
    sort: Option<String>,
    page_size: Option<usize>,
}

impl QueryArgs {
    fn into_state(self, ctx: &AppContext) -> Result<QueryState, CommandError> {
        let mut state = match &self.url {
            Some(query) => QueryState::from_url_query(query, &ctx.initial_state())?,
            None => ctx.initial_state(),
        };
        if let Some(term) = self.search {
            state.search_term = term;
        }
        state
            .category_filters
            .extend(self.categories.into_iter().filter(|c| !c.is_empty()));
        state
            .dependency_filters
            .extend(self.dependencies.into_iter().filter(|d| !d.is_empty()));
        if let Some(sort) = self.sort {
            state.sort_mode = sort.parse()?;
        }
        if let Some(n) = self.page_size {
            state.page_size = n;
        }
        state.validate()?;
        Ok(state)
    }
}

// ===========================================================================
// Built-in commands
// ===========================================================================

/// `ping` – returns { "pong": true }. Proves wiring works.
fn cmd_ping(_args: Value, _ctx: &AppContext) -> Result<Value, CommandError> {
    Ok(serde_json::json!({ "pong": true }))
}

#[derive(Serialize)]
struct QueryResponse<'a> {
    state: &'a QueryState,
    url: String,
    has_active_filters: bool,
    #[serde(flatten)]
    view: ShowcaseView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    empty_message: Option<String>,
}

/// `query` – run the full showcase pipeline.
///
/// Args: `{ "search": "blog", "categories": [...], "dependencies": [...],
/// "sort": "recent" | "stars", "page_size": 9 }` or `{ "url": "s=blog&c=..." }`
/// Returns: the visible records, counts, facet counts and empty-state info.
fn cmd_query(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let state = parse_args::<QueryArgs>(args)?.into_state(ctx)?;
    let view = ctx.catalog().query(&state)?;

    let next_page_size = view
        .has_more
        .then(|| state.load_more(ctx.config.page_increment).page_size);
    let empty_label = view.empty_state.as_ref().map(|r| r.label().to_string());
    let empty_message = view.empty_state.as_ref().map(|r| r.message());

    let response = QueryResponse {
        state: &state,
        url: state.to_url_query(),
        has_active_filters: state.has_active_filters(),
        view,
        next_page_size,
        empty_label,
        empty_message,
    };
    serde_json::to_value(&response).map_err(|e| CommandError::Other(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FacetArgs {
    #[serde(flatten)]
    query: QueryArgs,
    facet: Option<String>,
    order: Option<String>,
}

#[derive(Serialize)]
struct FacetOption<'a> {
    value: &'a str,
    count: usize,
    selected: bool,
}

fn facet_options<'a>(
    counts: &'a FacetCounts,
    selected: &BTreeSet<String>,
    order: FacetOrder,
) -> Vec<FacetOption<'a>> {
    counts
        .sorted(order)
        .into_iter()
        .map(|(value, count)| FacetOption {
            value,
            count,
            selected: selected.contains(value),
        })
        .collect()
}

/// `facets` – filter-option lists with live counts.
///
/// Takes the same args as `query`, plus `facet` ("category" | "dependency",
/// default both) and `order` ("count" | "name", default "count").
fn cmd_facets(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let args = parse_args::<FacetArgs>(args)?;
    let only = args.facet.as_deref().map(str::parse::<Facet>).transpose()?;
    let order = args
        .order
        .as_deref()
        .map(str::parse::<FacetOrder>)
        .transpose()?
        .unwrap_or_default();

    let state = args.query.into_state(ctx)?;
    let view = ctx.catalog().query(&state)?;

    let mut out = serde_json::Map::new();
    if only.is_none() || only == Some(Facet::Category) {
        let options = facet_options(&view.categories, &state.category_filters, order);
        out.insert(
            "categories".into(),
            serde_json::to_value(options).map_err(|e| CommandError::Other(e.to_string()))?,
        );
    }
    if only.is_none() || only == Some(Facet::Dependency) {
        let options = facet_options(&view.dependencies, &state.dependency_filters, order);
        out.insert(
            "dependencies".into(),
            serde_json::to_value(options).map_err(|e| CommandError::Other(e.to_string()))?,
        );
    }
    Ok(Value::Object(out))
}

#[derive(Deserialize)]
struct GetArgs {
    id: String,
}

/// `get` – a single record by id.
///
/// Args: `{ "id": "gatsby-starter-blog" }`
fn cmd_get(args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    let GetArgs { id } = parse_args(args)?;
    let record = ctx
        .catalog()
        .get(&id)
        .ok_or_else(|| CommandError::NotFound(format!("no starter with id '{}'", id)))?;
    serde_json::to_value(record).map_err(|e| CommandError::Other(e.to_string()))
}

/// `stats` – catalog size and facet cardinalities.
fn cmd_stats(_args: Value, ctx: &AppContext) -> Result<Value, CommandError> {
    serde_json::to_value(ctx.catalog().stats()).map_err(|e| CommandError::Other(e.to_string()))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::context::EngineConfig;
    use crate::record::StarterRecord;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> AppContext {
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap();
        let records = vec![
            StarterRecord::new("blog", day(1))
                .with_stars(50)
                .with_tags(["blog"])
                .with_dependencies([("gatsby", "^2.0.0")]),
            StarterRecord::new("portfolio", day(2))
                .with_stars(10)
                .with_tags(["portfolio", "blog"])
                .with_dependencies([("gatsby", "^2.0.0"), ("gatsby-plugin-sharp", "^2.0.0")]),
            StarterRecord::new("docs", day(3)).with_stars(80),
        ];
        let config = EngineConfig {
            initial_page_size: 2,
            ..EngineConfig::default()
        };
        AppContext::new(Catalog::new(records).unwrap(), config)
    }

    fn ids(data: &Value) -> Vec<String> {
        data["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_ping_command() {
        let ctx = AppContext::empty();
        let reg = CommandRegistry::new();
        let result = reg.execute("ping", json!({}), &ctx);
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.data.unwrap()["pong"], true);
    }

    #[test]
    fn test_unknown_command() {
        let ctx = AppContext::empty();
        let reg = CommandRegistry::new();
        let result = reg.execute("nonexistent", json!({}), &ctx);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_query_defaults_from_config() {
        let reg = CommandRegistry::new();
        let result = reg.execute("query", Value::Null, &ctx());
        assert_eq!(result.status, Status::Pass);
        let data = result.data.unwrap();
        assert_eq!(ids(&data), vec!["docs", "portfolio"]);
        assert_eq!(data["matched"], 3);
        assert_eq!(data["has_more"], true);
        assert_eq!(data["next_page_size"], 17);
        assert_eq!(data["has_active_filters"], false);
    }

    #[test]
    fn test_query_with_filters_and_sort() {
        let reg = CommandRegistry::new();
        let result = reg.execute(
            "query",
            json!({ "categories": ["blog"], "sort": "stars" }),
            &ctx(),
        );
        let data = result.data.unwrap();
        assert_eq!(ids(&data), vec!["blog", "portfolio"]);
        assert_eq!(data["categories"]["blog"], 2);
        assert_eq!(data["categories"]["portfolio"], 1);
        assert!(data.get("next_page_size").is_none());
    }

    #[test]
    fn test_query_from_url() {
        let reg = CommandRegistry::new();
        let result = reg.execute(
            "query",
            json!({ "url": "?d=gatsby-plugin-sharp&sort=stars" }),
            &ctx(),
        );
        let data = result.data.unwrap();
        assert_eq!(ids(&data), vec!["portfolio"]);
        assert_eq!(data["url"], "d=gatsby-plugin-sharp&sort=stars");
    }

    #[test]
    fn test_query_empty_state() {
        let reg = CommandRegistry::new();
        let result = reg.execute(
            "query",
            json!({ "search": "nothing-like-this", "dependencies": ["gatsby"] }),
            &ctx(),
        );
        let data = result.data.unwrap();
        assert_eq!(data["matched"], 0);
        assert_eq!(data["empty_label"], "nothing-like-this");
        assert_eq!(data["empty_message"], "No nothing-like-this starters found!");
        assert_eq!(data["empty_state"]["kind"], "search");
    }

    #[test]
    fn test_query_invalid_sort() {
        let reg = CommandRegistry::new();
        let result = reg.execute("query", json!({ "sort": "hottest" }), &ctx());
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_query_zero_page_size() {
        let reg = CommandRegistry::new();
        let result = reg.execute("query", json!({ "page_size": 0 }), &ctx());
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_facets_ordered_with_selection() {
        let reg = CommandRegistry::new();
        let result = reg.execute(
            "facets",
            json!({ "facet": "category", "categories": ["blog"] }),
            &ctx(),
        );
        let data = result.data.unwrap();
        assert!(data.get("dependencies").is_none());
        let cats = data["categories"].as_array().unwrap();
        assert_eq!(cats[0]["value"], "blog");
        assert_eq!(cats[0]["count"], 2);
        assert_eq!(cats[0]["selected"], true);
        assert_eq!(cats[1]["value"], "portfolio");
        assert_eq!(cats[1]["selected"], false);
    }

    #[test]
    fn test_facets_unknown_order() {
        let reg = CommandRegistry::new();
        let result = reg.execute("facets", json!({ "order": "random" }), &ctx());
        assert_eq!(result.error.unwrap().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_get_record() {
        let reg = CommandRegistry::new();
        let ok = reg.execute("get", json!({ "id": "docs" }), &ctx());
        assert_eq!(ok.data.unwrap()["stars"], 80);

        let missing = reg.execute("get", json!({ "id": "nope" }), &ctx());
        assert_eq!(missing.error.unwrap().code, ErrorCode::NotFound);

        let bad = reg.execute("get", json!({}), &ctx());
        assert_eq!(bad.error.unwrap().code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_stats() {
        let reg = CommandRegistry::new();
        let data = reg.execute("stats", json!({}), &ctx()).data.unwrap();
        assert_eq!(data["records"], 3);
        assert_eq!(data["categories"], 2);
        assert_eq!(data["untagged"], 1);
    }

    #[test]
    fn test_list_commands() {
        let reg = CommandRegistry::new();
        assert_eq!(reg.list(), vec!["facets", "get", "ping", "query", "stats"]);
    }
}
