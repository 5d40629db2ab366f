//! Tagged-variant error catalog shared across every layer boundary.
//!
//! Each layer returns one of these instead of a loosely-typed string or a
//! generic `anyhow::Error`; only the Dispatcher (see `core::dispatcher`)
//! translates a `ServerError` into a JSON-RPC error code, and only the
//! Formatter composes the user-visible text that carries one.

use serde::Serialize;
use thiserror::Error;

/// One field-level schema or cross-field rule violation.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub field_path: String,
    pub message: String,
    pub rule_violated: String,
    pub received_value: serde_json::Value,
}

/// Errors raised by the Input Validator (C2).
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("{} violation(s)", .0.len())]
    Invalid(Vec<Violation>),
}

/// Failure taxonomy emitted by the Secure Executor (C5), see spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxCategory {
    CommandNotAllowed,
    ArgumentRejected,
    WorkspaceSetupFailed,
    SpawnFailed,
    Timeout,
    NonzeroExit,
    StreamOverflow,
    OutputCollectionFailed,
    InternalError,
    Cancelled,
}

impl SandboxCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SandboxCategory::CommandNotAllowed => "command_not_allowed",
            SandboxCategory::ArgumentRejected => "argument_rejected",
            SandboxCategory::WorkspaceSetupFailed => "workspace_setup_failed",
            SandboxCategory::SpawnFailed => "spawn_failed",
            SandboxCategory::Timeout => "timeout",
            SandboxCategory::NonzeroExit => "nonzero_exit",
            SandboxCategory::StreamOverflow => "stream_overflow",
            SandboxCategory::OutputCollectionFailed => "output_collection_failed",
            SandboxCategory::InternalError => "internal_error",
            SandboxCategory::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Error)]
#[error("{category:?}: {message}")]
pub struct SandboxError {
    pub category: SandboxCategory,
    pub message: String,
}

impl SandboxError {
    pub fn new(category: SandboxCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

/// Whole-call errors raised by the Timesheet Parser (C4). Per-row errors are
/// accumulated inside a successful `ParseResult` instead (see `timesheet`).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("input is empty")]
    FileEmpty,
    #[error("input format could not be detected")]
    InvalidFormat,
    #[error("no work items present")]
    NoWorkItems,
}

/// JSON-RPC error codes used by the Protocol Dispatcher (C7), see spec §4.7.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    pub fn code(&self) -> i64 {
        match self {
            ProtocolError::Parse(_) => -32700,
            ProtocolError::MethodNotFound(_) => -32601,
            ProtocolError::InvalidParams(_) => -32602,
            ProtocolError::Internal(_) => -32603,
        }
    }
}

/// Top-level error used by `main` to collapse into a process exit code.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("startup failure: {0}")]
    Startup(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ServerError {
    /// Exit codes per spec §6.4: 1 startup, 2 config, 3 transport.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServerError::Startup(_) => 1,
            ServerError::Config(_) => 2,
            ServerError::Transport(_) => 3,
        }
    }
}
