//! Scenario runner – execute scripted query flows from YAML files.

use crate::commands::CommandRegistry;
use crate::context::AppContext;
use crate::types::*;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to parse scenario YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load a scenario from a YAML string.
pub fn load_scenario(yaml: &str) -> Result<Scenario, ScenarioError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Execute a scenario and return the overall result.
pub fn run_scenario(
    scenario: &Scenario,
    ctx: &AppContext,
    registry: &CommandRegistry,
) -> ScenarioResult {
    let mut step_results = Vec::new();
    let mut failures = Vec::new();

    for (i, step) in scenario.steps.iter().enumerate() {
        let r = registry.execute(&step.call, step.args.clone(), ctx);
        for problem in check_step(step, &r) {
            tracing::warn!(step = i, call = %step.call, %problem, "scenario expectation failed");
            failures.push(format!("step {} ({}): {}", i, step.call, problem));
        }
        step_results.push(r);
    }

    let overall_status = if failures.is_empty() {
        Status::Pass
    } else {
        Status::Fail
    };

    ScenarioResult {
        name: scenario.name.clone(),
        overall_status,
        step_results,
        failures,
    }
}

fn check_step(step: &ScenarioStep, r: &CommandResult) -> Vec<String> {
    let mut problems = Vec::new();
    if r.status != step.expect_status {
        problems.push(format!(
            "expected status {:?}, got {:?}",
            step.expect_status, r.status
        ));
    }

    let data = r.data.as_ref();
    if let Some(expected) = &step.expect_ids {
        let actual: Vec<String> = data
            .and_then(|d| d.get("records"))
            .and_then(|v| v.as_array())
            .map(|records| {
                records
                    .iter()
                    .filter_map(|rec| rec.get("id").and_then(|id| id.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if &actual != expected {
            problems.push(format!("expected ids {:?}, got {:?}", expected, actual));
        }
    }
    if let Some(expected) = step.expect_matched {
        let actual = data.and_then(|d| d.get("matched")).and_then(|v| v.as_u64());
        if actual != Some(expected as u64) {
            problems.push(format!("expected {} matched, got {:?}", expected, actual));
        }
    }
    if let Some(expected) = &step.expect_empty_reason {
        let actual = data
            .and_then(|d| d.get("empty_label"))
            .and_then(|v| v.as_str());
        if actual != Some(expected.as_str()) {
            problems.push(format!(
                "expected empty reason {:?}, got {:?}",
                expected, actual
            ));
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::context::EngineConfig;
    use crate::record::StarterRecord;
    use chrono::{TimeZone, Utc};

    fn ctx() -> AppContext {
        let day = |d| Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap();
        let records = vec![
            StarterRecord::new("blog", day(1))
                .with_searchable_text("Minimal Blog")
                .with_stars(5)
                .with_tags(["blog"]),
            StarterRecord::new("shop", day(2))
                .with_searchable_text("Shopify Store")
                .with_stars(9)
                .with_tags(["ecommerce"])
                .with_dependencies([("gatsby-source-shopify", "^1.0.0")]),
        ];
        AppContext::new(Catalog::new(records).unwrap(), EngineConfig::default())
    }

    #[test]
    fn test_parse_scenario() {
        let yaml = r#"
name: basic test
steps:
  - call: "ping"
    args: {}
    expect_status: "pass"
  - call: "query"
    args:
      search: blog
    expect_ids: [blog]
"#;
        let s = load_scenario(yaml).expect("should parse");
        assert_eq!(s.name, Some("basic test".into()));
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.steps[1].expect_status, Status::Pass);
    }

    #[test]
    fn test_run_scenario_pass() {
        let yaml = r#"
steps:
  - call: "query"
    args:
      sort: stars
    expect_ids: [shop, blog]
    expect_matched: 2
  - call: "query"
    args:
      dependencies: [gatsby-source-contentful]
    expect_matched: 0
    expect_empty_reason: gatsby-source-contentful
  - call: "query"
    args:
      sort: sideways
    expect_status: error
"#;
        let scenario = load_scenario(yaml).unwrap();
        let result = run_scenario(&scenario, &ctx(), &CommandRegistry::new());
        assert_eq!(result.overall_status, Status::Pass, "{:?}", result.failures);
        assert_eq!(result.step_results.len(), 3);
    }

    #[test]
    fn test_run_scenario_reports_mismatch() {
        let yaml = r#"
name: wrong order
steps:
  - call: "query"
    args:
      sort: recent
    expect_ids: [blog, shop]
"#;
        let scenario = load_scenario(yaml).unwrap();
        let result = run_scenario(&scenario, &ctx(), &CommandRegistry::new());
        assert_eq!(result.overall_status, Status::Fail);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].contains("expected ids"));
    }

    #[test]
    fn test_demo_scenario_against_demo_catalog() {
        let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let source = crate::source::FileCatalog::new(root.join("starters.yaml"));
        let ctx = AppContext::load(&source, EngineConfig::default()).unwrap();
        let scenario = load_scenario(include_str!("../../../demos/smoke.yaml")).unwrap();
        let result = run_scenario(&scenario, &ctx, &CommandRegistry::new());
        assert_eq!(result.overall_status, Status::Pass, "{:?}", result.failures);
    }

    #[test]
    fn test_parse_scenario_rejects_garbage() {
        assert!(load_scenario("steps: 12").is_err());
    }
}
