//! Protocol Dispatcher (C7): method routing, concurrency gating, and error
//! mapping (spec §4.7).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::core::cancel::CancellationToken;
use crate::core::executor::{ExecutionRequest, ExecutionResponse, InputFile, SecureExecutor};
use crate::core::formatter::ResponseFormatter;
use crate::core::protocol::{CallToolResult, ContentBlock, RpcError, RpcRequest, RpcResponse, PROTOCOL_VERSION};
use crate::core::registry::{Category, SearchCriteria, ToolRegistry};
use crate::errors::{ProtocolError, SandboxCategory, SandboxError, ValidationError};
use crate::timesheet;

pub struct DispatcherConfig {
    pub server_name: String,
    pub server_version: String,
    pub cli_binary: String,
    pub concurrency_limit: usize,
    pub queue_depth: usize,
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
    pub max_input_file_bytes: u64,
}

/// Routes `initialize`/`tools/list`/`tools/call`/`ping` to the Registry,
/// Executor, and Formatter, bounding concurrent tool executions with a
/// semaphore plus a FIFO admission queue (spec §5).
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    executor: SecureExecutor,
    formatter: ResponseFormatter,
    semaphore: Arc<Semaphore>,
    queued: AtomicUsize,
    config: DispatcherConfig,
    started_at: Instant,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, display_truncate_bytes: usize, stdout_cap: usize, stderr_cap: usize, config: DispatcherConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency_limit));
        let executor = SecureExecutor::new([config.cli_binary.clone()], stdout_cap, stderr_cap, config.max_input_file_bytes);
        Self {
            registry,
            executor,
            formatter: ResponseFormatter::new(display_truncate_bytes),
            semaphore,
            queued: AtomicUsize::new(0),
            config,
            started_at: Instant::now(),
        }
    }

    pub fn parse_request(bytes: &[u8]) -> Result<RpcRequest, ProtocolError> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Parse(e.to_string()))
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Whether the configured CLI binary resolves to an executable file,
    /// either directly or by a `PATH` lookup, without actually spawning it.
    pub fn cli_reachable(&self) -> bool {
        binary_resolves(&self.config.cli_binary)
    }

    /// Whether the system temp directory that every call workspace is
    /// carved out of is even present and a directory.
    pub fn storage_ok(&self) -> bool {
        std::fs::metadata(std::env::temp_dir()).map(|m| m.is_dir()).unwrap_or(false)
    }

    /// Whether a fresh per-call workspace directory can actually be
    /// created right now, the same primitive the Executor relies on for
    /// every call (spec §4.5).
    pub fn workspace_writable(&self) -> bool {
        crate::core::workspace::CallWorkspace::new().is_ok()
    }

    /// Per-tool invocation counts and average latencies, exposed at
    /// `GET /metrics` in a simple JSON shape (spec §6.3).
    pub fn metrics_snapshot(&self) -> Value {
        let mut tools: Vec<(String, crate::core::registry::ToolCountersSnapshot)> =
            self.registry.all_counters().into_iter().collect();
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        let tools: serde_json::Map<String, Value> = tools
            .into_iter()
            .map(|(name, snapshot)| {
                (
                    name,
                    json!({
                        "invocations": snapshot.invocations,
                        "successes": snapshot.successes,
                        "failures": snapshot.failures,
                        "avg_latency_ms": snapshot.avg_latency_ms,
                    }),
                )
            })
            .collect();
        json!({ "tools": tools })
    }

    pub async fn handle(&self, token: &CancellationToken, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);
        match request.method.as_str() {
            "initialize" => RpcResponse::ok(id, self.initialize()),
            "ping" => RpcResponse::ok(id, json!({})),
            "tools/list" => match self.tools_list(request.params.as_ref()) {
                Ok(result) => RpcResponse::ok(id, result),
                Err(e) => RpcResponse::err(id, protocol_error_to_rpc(&e)),
            },
            "tools/call" => match self.tools_call(token, request.params.as_ref()).await {
                Ok(result) => RpcResponse::ok(id, serde_json::to_value(result).unwrap_or(Value::Null)),
                Err(e) => RpcResponse::err(id, protocol_error_to_rpc(&e)),
            },
            other => RpcResponse::err(id, protocol_error_to_rpc(&ProtocolError::MethodNotFound(other.to_string()))),
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocol_version": PROTOCOL_VERSION,
            "server_info": { "name": self.config.server_name, "version": self.config.server_version },
            "capabilities": { "tools": { "list_changed": false } }
        })
    }

    fn tools_list(&self, params: Option<&Value>) -> Result<Value, ProtocolError> {
        let category = params
            .and_then(|p| p.get("category"))
            .and_then(Value::as_str)
            .map(parse_category)
            .transpose()?;

        let descriptors = self.registry.list(category);
        let out: Vec<Value> = descriptors
            .iter()
            .map(|d| {
                json!({
                    "name": d.name,
                    "description": d.description,
                    "input_schema": d.input_schema,
                    "category": d.category.as_str(),
                })
            })
            .collect();
        Ok(json!({ "tools": out }))
    }

    async fn tools_call(&self, token: &CancellationToken, params: Option<&Value>) -> Result<CallToolResult, ProtocolError> {
        let params = params.ok_or_else(|| ProtocolError::InvalidParams("missing params".to_string()))?;
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams("params.name is required".to_string()))?;
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let descriptor = self
            .registry
            .get(name)
            .ok_or_else(|| ProtocolError::InvalidParams(format!("tool_not_found: {name}")))?
            .clone();

        self.registry
            .validate_input(token, name, &arguments)
            .map_err(|e| validation_error_to_protocol(&e))?;

        if name == "timesheet_preview" {
            let result = self.run_timesheet_preview(&arguments);
            return Ok(result);
        }

        let mut input_files = Vec::new();
        let mut file_path_override = None;
        if let Some(host_path) = arguments.get("file_path").and_then(Value::as_str) {
            match self.load_input_file(host_path) {
                Ok(input_file) => {
                    file_path_override = Some(input_file.relative_path.clone());
                    input_files.push(input_file);
                }
                Err(e) => {
                    self.registry.record_invocation(name, false, std::time::Duration::ZERO);
                    let response = ExecutionResponse::sandbox_rejected(&e);
                    let workspace_root = std::env::temp_dir();
                    return Ok(self.formatter.format(&response, &workspace_root));
                }
            }
        }

        let mut args = descriptor.cli_args_template.positional.clone();
        for (field, flag) in &descriptor.cli_args_template.flags {
            if field == "file_path" {
                if let Some(relative) = &file_path_override {
                    args.push(flag.clone());
                    args.push(relative.clone());
                }
                continue;
            }
            if let Some(value) = arguments.get(field).filter(|v| !v.is_null()) {
                args.push(flag.clone());
                args.push(stringify_arg(value));
            }
        }

        let permit = match self.acquire_slot().await {
            Some(permit) => permit,
            None => {
                return Err(ProtocolError::Internal("server busy: concurrency and queue limits exceeded".to_string()));
            }
        };

        let timeout = std::time::Duration::from_secs(
            self.config.default_timeout_secs.min(self.config.max_timeout_secs),
        );
        let request = ExecutionRequest {
            command: descriptor.cli_command.clone(),
            args,
            input_files,
            timeout,
        };

        let start = Instant::now();
        let response = self.executor.execute(token, request).await;
        drop(permit);

        let success = response.error.is_none();
        self.registry.record_invocation(name, success, start.elapsed());

        let workspace_root = std::env::temp_dir();
        Ok(self.formatter.format(&response, &workspace_root))
    }

    /// Reads a caller-supplied `file_path` off the host filesystem so it can
    /// be placed into the call workspace by the executor, instead of ever
    /// forwarding a host path straight through to the wrapped CLI (spec §4.5).
    fn load_input_file(&self, host_path: &str) -> Result<InputFile, SandboxError> {
        let metadata = std::fs::metadata(host_path).map_err(|e| {
            SandboxError::new(SandboxCategory::ArgumentRejected, format!("failed to stat file_path '{host_path}': {e}"))
        })?;
        if metadata.len() > self.config.max_input_file_bytes {
            return Err(SandboxError::new(
                SandboxCategory::WorkspaceSetupFailed,
                format!(
                    "file_path '{host_path}' is {} bytes, exceeds the {} byte cap",
                    metadata.len(),
                    self.config.max_input_file_bytes
                ),
            ));
        }

        let bytes = std::fs::read(host_path).map_err(|e| {
            SandboxError::new(SandboxCategory::ArgumentRejected, format!("failed to read file_path '{host_path}': {e}"))
        })?;
        let relative_path = std::path::Path::new(host_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string());
        Ok(InputFile { relative_path, bytes })
    }

    fn run_timesheet_preview(&self, arguments: &Value) -> CallToolResult {
        let date_formats: Option<Vec<String>> = arguments
            .get("date_formats")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect());

        let bytes = if let Some(content) = arguments.get("content").and_then(Value::as_str) {
            content.as_bytes().to_vec()
        } else if let Some(path) = arguments.get("file_path").and_then(Value::as_str) {
            match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return CallToolResult {
                        content: vec![ContentBlock::Text { text: format!("[error: io_error]\nfailed to read '{path}': {e}") }],
                        is_error: true,
                    };
                }
            }
        } else {
            return CallToolResult {
                content: vec![ContentBlock::Text { text: "[error: invalid_params]\none of content or file_path is required".to_string() }],
                is_error: true,
            };
        };

        match timesheet::parse(&bytes, date_formats.as_deref()) {
            Ok(result) => CallToolResult {
                content: vec![ContentBlock::Text {
                    text: serde_json::to_string_pretty(&result).unwrap_or_default(),
                }],
                is_error: false,
            },
            Err(e) => CallToolResult {
                content: vec![ContentBlock::Text { text: format!("[error: {e}]") }],
                is_error: true,
            },
        }
    }

    /// Tries to admit one call: an immediately-available permit, or a
    /// queued wait bounded by `queue_depth`. `None` means the queue is
    /// already full and the caller must return a busy error (spec §5).
    async fn acquire_slot(&self) -> Option<tokio::sync::OwnedSemaphorePermit> {
        if let Ok(permit) = self.semaphore.clone().try_acquire_owned() {
            return Some(permit);
        }
        if self.queued.load(Ordering::SeqCst) >= self.config.queue_depth {
            return None;
        }
        self.queued.fetch_add(1, Ordering::SeqCst);
        let permit = self.semaphore.clone().acquire_owned().await.ok();
        self.queued.fetch_sub(1, Ordering::SeqCst);
        permit
    }
}

/// Resolves a command name the same way a shell would for spawn purposes,
/// without actually spawning it: an absolute/relative path is checked
/// directly, a bare name is searched across `PATH` (spec §6.3 `cli_reachable`).
fn binary_resolves(command: &str) -> bool {
    if command.contains(std::path::MAIN_SEPARATOR) {
        return is_executable_file(std::path::Path::new(command));
    }
    std::env::var_os("PATH")
        .into_iter()
        .flat_map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .any(|dir| is_executable_file(&dir.join(command)))
}

fn is_executable_file(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn parse_category(raw: &str) -> Result<Category, ProtocolError> {
    match raw {
        "invoice-management" => Ok(Category::InvoiceManagement),
        "client-management" => Ok(Category::ClientManagement),
        "import-export" => Ok(Category::ImportExport),
        "generation" => Ok(Category::Generation),
        "configuration" => Ok(Category::Configuration),
        other => Err(ProtocolError::InvalidParams(format!("unknown category '{other}'"))),
    }
}

fn stringify_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn validation_error_to_protocol(error: &ValidationError) -> ProtocolError {
    match error {
        ValidationError::UnknownTool(name) => ProtocolError::InvalidParams(format!("tool_not_found: {name}")),
        ValidationError::Invalid(violations) => {
            let data = json!({ "violations": violations });
            ProtocolError::InvalidParams(data.to_string())
        }
    }
}

fn protocol_error_to_rpc(error: &ProtocolError) -> RpcError {
    RpcError::new(error.code(), error.to_string())
}

/// `search` is exposed as a direct method on the registry for now; tools/list
/// with no params returns everything, matching the "ordered sequence"
/// contract without requiring a separate protocol method.
pub fn search_tools(registry: &ToolRegistry, criteria: &SearchCriteria) -> Vec<Value> {
    registry
        .search(criteria)
        .iter()
        .map(|d| json!({ "name": d.name, "description": d.description, "category": d.category.as_str() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools;

    fn dispatcher() -> Dispatcher {
        let registry = Arc::new(tools::build_registry().unwrap());
        Dispatcher::new(
            registry,
            8192,
            1024 * 1024,
            1024 * 1024,
            DispatcherConfig {
                server_name: "invoice-mcp-server".to_string(),
                server_version: "0.1.0".to_string(),
                cli_binary: "invoice".to_string(),
                concurrency_limit: 2,
                queue_depth: 2,
                default_timeout_secs: 5,
                max_timeout_secs: 5,
                max_input_file_bytes: crate::core::workspace::MAX_INPUT_FILE_BYTES,
            },
        )
    }

    #[tokio::test]
    async fn initialize_reports_protocol_version() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(
                &token,
                RpcRequest { jsonrpc: None, id: Some(json!(1)), method: "initialize".to_string(), params: None },
            )
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["protocol_version"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn ping_returns_empty_object() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(&token, RpcRequest { jsonrpc: None, id: Some(json!(1)), method: "ping".to_string(), params: None })
            .await;
        assert_eq!(response.result.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn tools_list_returns_all_tools() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(&token, RpcRequest { jsonrpc: None, id: Some(json!(1)), method: "tools/list".to_string(), params: None })
            .await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 21);
    }

    #[tokio::test]
    async fn unknown_method_maps_to_method_not_found_code() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(&token, RpcRequest { jsonrpc: None, id: Some(json!(1)), method: "bogus".to_string(), params: None })
            .await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn tools_call_with_unknown_tool_is_invalid_params() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(
                &token,
                RpcRequest {
                    jsonrpc: None,
                    id: Some(json!(1)),
                    method: "tools/call".to_string(),
                    params: Some(json!({"name": "does_not_exist", "arguments": {}})),
                },
            )
            .await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn tools_call_timesheet_preview_bypasses_executor() {
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        let response = dispatcher
            .handle(
                &token,
                RpcRequest {
                    jsonrpc: None,
                    id: Some(json!(1)),
                    method: "tools/call".to_string(),
                    params: Some(json!({
                        "name": "timesheet_preview",
                        "arguments": {"content": "[{\"date\": \"2026-01-05\", \"description\": \"x\", \"hours\": 1}]"}
                    })),
                },
            )
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["is_error"], json!(false));
    }

    #[test]
    fn cli_reachable_is_false_for_a_binary_not_on_path() {
        let dispatcher = dispatcher();
        assert!(!dispatcher.cli_reachable());
    }

    #[test]
    fn storage_and_workspace_checks_pass_in_a_normal_test_environment() {
        let dispatcher = dispatcher();
        assert!(dispatcher.storage_ok());
        assert!(dispatcher.workspace_writable());
    }

    #[tokio::test]
    async fn metrics_snapshot_reports_invocations_per_tool() {
        // "invoice" is not on PATH in the test environment, so this call
        // fails to spawn — but record_invocation still runs either way,
        // which is exactly what the counter is meant to reflect.
        let dispatcher = dispatcher();
        let token = CancellationToken::new();
        dispatcher
            .handle(
                &token,
                RpcRequest {
                    jsonrpc: None,
                    id: Some(json!(1)),
                    method: "tools/call".to_string(),
                    params: Some(json!({"name": "config_show", "arguments": {}})),
                },
            )
            .await;
        let snapshot = dispatcher.metrics_snapshot();
        assert_eq!(snapshot["tools"]["config_show"]["invocations"], json!(1));
    }
}
