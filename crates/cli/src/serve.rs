//! Daemon mode – line-delimited JSON requests over a Unix socket.
//!
//! The catalog is loaded once at startup and shared read-only by every
//! connection.

use engine::types::*;
use engine::{AppContext, CommandRegistry};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

pub async fn run_daemon(socket_path: PathBuf, ctx: AppContext, registry: CommandRegistry) {
    // Remove stale socket if it exists
    let _ = std::fs::remove_file(&socket_path);

    let listener = match UnixListener::bind(&socket_path) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: cannot bind socket {}: {}", socket_path.display(), e);
            std::process::exit(2);
        }
    };

    tracing::info!(
        socket = %socket_path.display(),
        records = ctx.catalog().len(),
        "starterctl daemon listening"
    );

    let ctx = Arc::new(ctx);
    let registry = Arc::new(registry);

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let ctx = Arc::clone(&ctx);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    let (reader, mut writer) = stream.into_split();
                    let mut lines = BufReader::new(reader).lines();

                    while let Ok(Some(line)) = lines.next_line().await {
                        let response = handle_request(&line, &ctx, &registry);
                        let mut resp_json =
                            serde_json::to_string(&response).unwrap_or_else(|_| "{}".into());
                        resp_json.push('\n');
                        if writer.write_all(resp_json.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    tracing::debug!("connection closed");
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept error");
            }
        }
    }
}

fn error_response(id: String, message: String) -> DaemonResponse {
    DaemonResponse {
        id,
        result: None,
        error: Some(ErrorInfo {
            code: ErrorCode::InvalidArgument,
            message,
            details: Value::Null,
        }),
    }
}

/// Methods: `call` (`{cmd, args}`), `query` (params are query args), `list`.
pub(crate) fn handle_request(
    line: &str,
    ctx: &AppContext,
    registry: &CommandRegistry,
) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return error_response("unknown".into(), format!("invalid JSON request: {}", e));
        }
    };

    let result = match req.method.as_str() {
        "call" => {
            let cmd_name = req.params.get("cmd").and_then(|v| v.as_str()).unwrap_or("");
            let args = req
                .params
                .get("args")
                .cloned()
                .unwrap_or(Value::Object(Default::default()));
            registry.execute(cmd_name, args, ctx)
        }
        "query" => registry.execute("query", req.params, ctx),
        "list" => {
            let mut r = result_ok("list", "commands", &new_run_id(), 0);
            r.data = Some(serde_json::json!({ "commands": registry.list() }));
            r
        }
        other => {
            return error_response(req.id, format!("unknown method: {}", other));
        }
    };

    DaemonResponse {
        id: req.id,
        result: Some(result),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{Catalog, EngineConfig, StarterRecord};

    fn ctx() -> AppContext {
        let records = vec![
            StarterRecord::new("a", "2024-01-02T00:00:00Z".parse().unwrap())
                .with_tags(["blog"]),
            StarterRecord::new("b", "2024-01-01T00:00:00Z".parse().unwrap()),
        ];
        AppContext::new(Catalog::new(records).unwrap(), EngineConfig::default())
    }

    #[test]
    fn test_query_method() {
        let resp = handle_request(
            r#"{"id":"1","method":"query","params":{"categories":["blog"]}}"#,
            &ctx(),
            &CommandRegistry::new(),
        );
        assert_eq!(resp.id, "1");
        let result = resp.result.unwrap();
        assert_eq!(result.status, Status::Pass);
        assert_eq!(result.data.unwrap()["records"][0]["id"], "a");
    }

    #[test]
    fn test_call_method() {
        let resp = handle_request(
            r#"{"id":"2","method":"call","params":{"cmd":"get","args":{"id":"b"}}}"#,
            &ctx(),
            &CommandRegistry::new(),
        );
        assert_eq!(resp.result.unwrap().data.unwrap()["id"], "b");
    }

    #[test]
    fn test_list_method() {
        let resp = handle_request(r#"{"id":"3","method":"list"}"#, &ctx(), &CommandRegistry::new());
        let data = resp.result.unwrap().data.unwrap();
        assert!(data["commands"].as_array().unwrap().iter().any(|c| c == "query"));
    }

    #[test]
    fn test_bad_requests() {
        let reg = CommandRegistry::new();
        let resp = handle_request("not json", &ctx(), &reg);
        assert_eq!(resp.id, "unknown");
        assert_eq!(resp.error.unwrap().code, ErrorCode::InvalidArgument);

        let resp = handle_request(r#"{"id":"4","method":"reindex"}"#, &ctx(), &reg);
        assert_eq!(resp.id, "4");
        assert!(resp.result.is_none());
        assert!(resp.error.unwrap().message.contains("reindex"));
    }
}
