//! Concurrency gate: beyond `concurrency_limit + queue_depth` simultaneous
//! calls, the dispatcher must answer busy rather than spawn unbounded
//! subprocesses (spec §5).

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use serde_json::json;

use invoice_mcp_server::core::cancel::CancellationToken;
use invoice_mcp_server::core::dispatcher::{Dispatcher, DispatcherConfig};
use invoice_mcp_server::core::protocol::RpcRequest;
use invoice_mcp_server::tools;

fn write_slow_stub_cli(dir: &std::path::Path) -> String {
    let script_path = dir.join("invoice");
    std::fs::write(&script_path, "#!/bin/sh\nsleep 0.3\necho ok\n").unwrap();
    let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script_path, perms).unwrap();
    script_path.to_string_lossy().to_string()
}

#[tokio::test]
async fn calls_beyond_limit_and_queue_return_busy() {
    let dir = tempfile::tempdir().unwrap();
    let cli_binary = write_slow_stub_cli(dir.path());
    let registry = Arc::new(tools::build_registry().unwrap());
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        8192,
        1024 * 1024,
        1024 * 1024,
        DispatcherConfig {
            server_name: "invoice-mcp-server".to_string(),
            server_version: "0.1.0".to_string(),
            cli_binary,
            concurrency_limit: 1,
            queue_depth: 1,
            default_timeout_secs: 5,
            max_timeout_secs: 5,
            max_input_file_bytes: invoice_mcp_server::core::workspace::MAX_INPUT_FILE_BYTES,
        },
    ));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let dispatcher = Arc::clone(&dispatcher);
        handles.push(tokio::spawn(async move {
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
                .await
        }));
    }

    let mut busy_count = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if let Some(error) = response.error {
            assert_eq!(error.code, -32603, "unexpected error code: {error:?}");
            busy_count += 1;
        }
    }

    assert!(busy_count >= 1, "expected at least one call to be rejected as busy with only 1 slot + 1 queue entry for 4 concurrent calls");
}
