//! Core server framework: the components wired together behind the two
//! transports (spec §4).

pub mod cancel;
pub mod dispatcher;
pub mod executor;
pub mod formatter;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod validator;
pub mod workspace;

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::errors::ServerError;
use dispatcher::{Dispatcher, DispatcherConfig};

/// Builds the tool registry and wires it into a `Dispatcher`. Failure here
/// is always a fatal startup error (spec §4.3): a malformed descriptor
/// catalog should never reach a transport loop.
pub fn initialize(config: &ServerConfig) -> Result<Arc<Dispatcher>, ServerError> {
    let registry = crate::tools::build_registry()
        .map_err(|e| ServerError::Startup(format!("tool registry failed to build: {e:?}")))?;

    let hygiene_violations = schema::check_hygiene(&registry.schema_catalog());
    for violation in &hygiene_violations {
        tracing::warn!(
            tool = %violation.tool,
            path = %violation.path,
            reason = %violation.reason,
            "schema hygiene violation"
        );
    }

    tracing::info!(tool_count = registry.len(), "tool registry initialized");

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        config.display_truncate_bytes,
        config.stdout_cap_bytes,
        config.stderr_cap_bytes,
        DispatcherConfig {
            server_name: config.server_name.clone(),
            server_version: config.server_version.clone(),
            cli_binary: config.cli_binary.clone(),
            concurrency_limit: config.concurrency_limit,
            queue_depth: config.queue_depth,
            default_timeout_secs: config.default_timeout_secs,
            max_timeout_secs: config.max_timeout_secs,
            max_input_file_bytes: config.max_input_file_bytes,
        },
    );

    Ok(Arc::new(dispatcher))
}
