//! `starterctl` – command-line front end for the starter showcase engine.
//!
//! Loads a catalog once, then answers queries as one-shot subcommands, as
//! scripted scenarios, or as a long-running daemon over a Unix socket.

mod config;
mod logging;
mod serve;

use clap::{Parser, Subcommand};
use engine::catalog::CatalogError;
use engine::source::FileCatalog;
use engine::types::*;
use engine::{AppContext, CommandRegistry, CommandResult};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

// ===========================================================================
// CLI definition
// ===========================================================================

#[derive(Parser)]
#[command(
    name = "starterctl",
    version,
    about = "Query the starter showcase catalog"
)]
struct Cli {
    /// Catalog file (.json, .yaml, .yml). Overrides the config file.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Extra config file layered over starterctl.yaml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter, sort and page the catalog.
    Query {
        /// Free-text search term (case-insensitive substring).
        #[arg(short, long)]
        search: Option<String>,
        /// Required category; repeat to require several.
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Required dependency name; repeat to require several.
        #[arg(short, long = "dependency")]
        dependencies: Vec<String>,
        /// Sort mode: recent | stars
        #[arg(long)]
        sort: Option<String>,
        /// Number of records to show.
        #[arg(long)]
        page_size: Option<usize>,
        /// Showcase URL state, e.g. "s=blog&c=portfolio&sort=stars".
        #[arg(long)]
        url: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List facet values with live counts.
    Facets {
        /// Facet: category | dependency (default: both)
        #[arg(long)]
        facet: Option<String>,
        /// Ordering: count | name
        #[arg(long, default_value = "count")]
        order: String,
        /// Showcase URL state narrowing the counted set.
        #[arg(long)]
        url: Option<String>,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Invoke an engine command by name with JSON args.
    Call {
        /// Command name (e.g. "query", "facets", "get", "stats").
        cmd: String,
        /// JSON args to pass to the command.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run a scripted scenario from a YAML file.
    RunScenario {
        /// Path to the scenario YAML file.
        file: PathBuf,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start daemon mode over a Unix socket.
    Serve {
        /// Path for the Unix domain socket (default from config).
        #[arg(long)]
        socket: Option<PathBuf>,
    },
}

// ===========================================================================
// Main
// ===========================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: cannot load configuration: {}", e);
            std::process::exit(2);
        }
    };
    logging::init_logging(&cfg.logging);

    let ctx = match cli.catalog.as_ref().or(cfg.catalog.as_ref()) {
        Some(path) => load_context(path, &cfg),
        None => {
            tracing::warn!("no catalog configured; queries will see an empty record set");
            AppContext::new(engine::Catalog::default(), cfg.engine.clone())
        }
    };
    let registry = CommandRegistry::new();

    match cli.command {
        Commands::Query {
            search,
            categories,
            dependencies,
            sort,
            page_size,
            url,
            json,
        } => {
            let args = json!({
                "search": search,
                "categories": categories,
                "dependencies": dependencies,
                "sort": sort,
                "page_size": page_size,
                "url": url,
            });
            let result = registry.execute("query", args, &ctx);
            if json {
                output_result(&result, true);
            } else {
                print_query(&result);
                exit_for(&result);
            }
        }
        Commands::Facets {
            facet,
            order,
            url,
            json,
        } => {
            let args = json!({ "facet": facet, "order": order, "url": url });
            let result = registry.execute("facets", args, &ctx);
            if json {
                output_result(&result, true);
            } else {
                print_facets(&result);
                exit_for(&result);
            }
        }
        Commands::Call { cmd, args, json } => cmd_call(&cmd, &args, json, &ctx, &registry),
        Commands::RunScenario { file, json } => cmd_run_scenario(&file, json, &ctx, &registry),
        Commands::Serve { socket } => {
            let socket = socket.unwrap_or_else(|| cfg.socket.clone());
            serve::run_daemon(socket, ctx, registry).await
        }
    }
}

fn load_context(path: &Path, cfg: &config::CliConfig) -> AppContext {
    match AppContext::load(&FileCatalog::new(path), cfg.engine.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            let code = match &e {
                CatalogError::DuplicateId(_) => ErrorCode::InvalidArgument,
                CatalogError::Source { .. } => ErrorCode::IoError,
            };
            let r = result_err(
                "load",
                &path.display().to_string(),
                &new_run_id(),
                0,
                code,
                e.to_string(),
            );
            output_result(&r, false);
            std::process::exit(2);
        }
    }
}

// ===========================================================================
// Subcommand implementations
// ===========================================================================

fn cmd_call(cmd: &str, args_str: &str, json: bool, ctx: &AppContext, registry: &CommandRegistry) {
    let args: Value = match serde_json::from_str(args_str) {
        Ok(v) => v,
        Err(e) => {
            let r = result_err(
                "call",
                cmd,
                &new_run_id(),
                0,
                ErrorCode::InvalidArgument,
                format!("invalid JSON args: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let result = registry.execute(cmd, args, ctx);
    output_result(&result, json);
}

fn cmd_run_scenario(file: &Path, json: bool, ctx: &AppContext, registry: &CommandRegistry) {
    let yaml = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::IoError,
                format!("cannot read scenario file: {}", e),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario = match engine::scenario::load_scenario(&yaml) {
        Ok(s) => s,
        Err(e) => {
            let r = result_err(
                "run-scenario",
                &file.display().to_string(),
                &new_run_id(),
                0,
                ErrorCode::InvalidArgument,
                e.to_string(),
            );
            output_result(&r, json);
            return;
        }
    };

    let scenario_result = engine::scenario::run_scenario(&scenario, ctx, registry);

    if json {
        let j = serde_json::to_string_pretty(&scenario_result).unwrap_or_default();
        println!("{}", j);
    } else {
        println!(
            "Scenario: {}",
            scenario_result.name.as_deref().unwrap_or("<unnamed>")
        );
        println!("Overall: {:?}", scenario_result.overall_status);
        for (i, sr) in scenario_result.step_results.iter().enumerate() {
            println!(
                "  Step {}: {} -> {:?} ({}ms)",
                i, sr.target, sr.status, sr.timing_ms.total
            );
        }
        for failure in &scenario_result.failures {
            println!("  FAIL {}", failure);
        }
    }

    if scenario_result.overall_status != Status::Pass {
        std::process::exit(1);
    }
}

// ===========================================================================
// Output helpers
// ===========================================================================

fn output_result(result: &CommandResult, json: bool) {
    if json {
        let j = serde_json::to_string_pretty(result).unwrap_or_default();
        println!("{}", j);
    } else {
        print_human(result);
    }
    exit_for(result);
}

/// Exit with non-zero status on error/fail.
fn exit_for(result: &CommandResult) {
    match result.status {
        Status::Pass => {}
        Status::Fail => std::process::exit(1),
        Status::Error => std::process::exit(2),
    }
}

fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Pass => "PASS",
        Status::Fail => "FAIL",
        Status::Error => "ERROR",
    }
}

fn print_human(r: &CommandResult) {
    println!("[{}] {} {}", status_icon(r.status), r.command, r.target);
    println!("  run_id: {}", r.run_id);
    println!("  timing: {}ms", r.timing_ms.total);

    if let Some(ref err) = r.error {
        println!("  error:  {} – {}", err.code, err.message);
    }

    if let Some(ref data) = r.data {
        if let Ok(s) = serde_json::to_string_pretty(data) {
            for line in s.lines() {
                println!("  {}", line);
            }
        }
    }
}

fn print_query(r: &CommandResult) {
    let data = match (&r.error, &r.data) {
        (None, Some(data)) => data,
        _ => return print_human(r),
    };

    if let Some(message) = data["empty_message"].as_str() {
        println!("{}", message);
        return;
    }

    let sort = data["state"]["sort_mode"].as_str().unwrap_or("recent");
    println!(
        "{} of {} starters (sorted by {})",
        data["matched"], data["total"], sort
    );
    for (i, rec) in data["records"].as_array().into_iter().flatten().enumerate() {
        let title = rec["name"].as_str().or(rec["id"].as_str()).unwrap_or("?");
        let updated = rec["updated_at"]
            .as_str()
            .and_then(|s| s.get(..10))
            .unwrap_or("");
        println!(
            "  {:>3}. {:<40} ★ {:<6} updated {}",
            i + 1,
            title,
            rec["stars"].as_u64().unwrap_or(0),
            updated
        );
    }
    if let Some(next) = data["next_page_size"].as_u64() {
        println!("  … more available (use --page-size {})", next);
    }
}

fn print_facets(r: &CommandResult) {
    let data = match (&r.error, &r.data) {
        (None, Some(data)) => data,
        _ => return print_human(r),
    };

    for (key, heading) in [("categories", "Categories"), ("dependencies", "Dependencies")] {
        let Some(options) = data[key].as_array() else {
            continue;
        };
        println!("{}:", heading);
        for opt in options {
            let mark = if opt["selected"].as_bool().unwrap_or(false) {
                "x"
            } else {
                " "
            };
            println!(
                "  [{}] {} ({})",
                mark,
                opt["value"].as_str().unwrap_or(""),
                opt["count"]
            );
        }
    }
}
