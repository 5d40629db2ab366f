//! Server configuration: compiled defaults, overlaid with an optional TOML
//! file, overlaid with CLI flags. See SPEC_FULL.md §3/§4.9/§6.4.

use serde::Deserialize;
use std::path::PathBuf;

use crate::errors::ServerError;

/// Transport selected at startup. No auto-detection (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

/// Immutable, merged server configuration. Constructed once in `main` and
/// handed to `core::initialize`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_name: String,
    pub server_version: String,
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub cli_binary: String,
    pub concurrency_limit: usize,
    pub queue_depth: usize,
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
    pub stdout_cap_bytes: usize,
    pub stderr_cap_bytes: usize,
    pub max_input_file_bytes: u64,
    pub display_truncate_bytes: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "invoice-mcp-server".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 3000,
            cli_binary: "invoice".to_string(),
            concurrency_limit: 5,
            queue_depth: 50,
            default_timeout_secs: 300,
            max_timeout_secs: 1800,
            stdout_cap_bytes: 16 * 1024 * 1024,
            stderr_cap_bytes: 16 * 1024 * 1024,
            max_input_file_bytes: 50 * 1024 * 1024,
            display_truncate_bytes: 8 * 1024,
            log_level: "info".to_string(),
        }
    }
}

/// Optional, all-fields-`Option` shape deserialized from the TOML config
/// file named with `--config`. Mirrors `abp-config`'s raw/merged split.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    server: RawServerSection,
    #[serde(default)]
    limits: RawLimitsSection,
}

#[derive(Debug, Default, Deserialize)]
struct RawServerSection {
    transport: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    cli_binary: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLimitsSection {
    concurrency_limit: Option<usize>,
    queue_depth: Option<usize>,
    default_timeout_secs: Option<u64>,
    max_timeout_secs: Option<u64>,
    stdout_cap_bytes: Option<usize>,
    stderr_cap_bytes: Option<usize>,
    max_input_file_bytes: Option<u64>,
    display_truncate_bytes: Option<usize>,
}

impl ServerConfig {
    /// Load the TOML file at `path`, if given, and merge it over the
    /// compiled defaults. CLI flags are applied afterwards by the caller
    /// (see `main.rs`), since they must win over both.
    pub fn load(path: Option<&PathBuf>) -> Result<Self, ServerError> {
        let mut config = ServerConfig::default();
        let Some(path) = path else {
            return Ok(config);
        };

        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("reading {}: {e}", path.display())))?;
        let raw: RawConfig = toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("parsing {}: {e}", path.display())))?;

        if let Some(t) = raw.server.transport {
            config.transport = match t.as_str() {
                "stdio" => Transport::Stdio,
                "http" => Transport::Http,
                other => {
                    return Err(ServerError::Config(format!(
                        "unknown transport '{other}', expected 'stdio' or 'http'"
                    )));
                }
            };
        }
        if let Some(v) = raw.server.host {
            config.host = v;
        }
        if let Some(v) = raw.server.port {
            config.port = v;
        }
        if let Some(v) = raw.server.cli_binary {
            config.cli_binary = v;
        }
        if let Some(v) = raw.server.log_level {
            config.log_level = v;
        }
        if let Some(v) = raw.limits.concurrency_limit {
            config.concurrency_limit = v;
        }
        if let Some(v) = raw.limits.queue_depth {
            config.queue_depth = v;
        }
        if let Some(v) = raw.limits.default_timeout_secs {
            config.default_timeout_secs = v;
        }
        if let Some(v) = raw.limits.max_timeout_secs {
            config.max_timeout_secs = v;
        }
        if let Some(v) = raw.limits.stdout_cap_bytes {
            config.stdout_cap_bytes = v;
        }
        if let Some(v) = raw.limits.stderr_cap_bytes {
            config.stderr_cap_bytes = v;
        }
        if let Some(v) = raw.limits.max_input_file_bytes {
            config.max_input_file_bytes = v;
        }
        if let Some(v) = raw.limits.display_truncate_bytes {
            config.display_truncate_bytes = v;
        }

        Ok(config)
    }

    /// The effective per-call timeout: the minimum of the server default
    /// and the server-enforced upper bound (spec §5, "Cancellation &
    /// timeouts"). Tool- or caller-supplied timeouts are folded in by the
    /// executor at call time via `effective_timeout`.
    pub fn effective_timeout(&self, requested_secs: Option<u64>) -> std::time::Duration {
        let mut secs = requested_secs.unwrap_or(self.default_timeout_secs);
        secs = secs.min(self.default_timeout_secs).min(self.max_timeout_secs);
        std::time::Duration::from_secs(secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.concurrency_limit, 5);
        assert_eq!(config.queue_depth, 50);
        assert_eq!(config.transport, Transport::Stdio);
    }

    #[test]
    fn load_with_no_path_returns_defaults() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.cli_binary, "invoice");
    }

    #[test]
    fn effective_timeout_is_bounded_above() {
        let config = ServerConfig::default();
        let d = config.effective_timeout(Some(10_000));
        assert_eq!(d.as_secs(), config.max_timeout_secs.min(config.default_timeout_secs));
    }

    #[test]
    fn load_merges_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            transport = "http"
            port = 9090

            [limits]
            concurrency_limit = 2
            "#,
        )
        .unwrap();

        let config = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.port, 9090);
        assert_eq!(config.concurrency_limit, 2);
        assert_eq!(config.queue_depth, 50);
    }

    #[test]
    fn load_rejects_unknown_transport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\ntransport = \"carrier-pigeon\"\n").unwrap();
        assert!(ServerConfig::load(Some(&path)).is_err());
    }
}
