//! Per-call workspace isolation used by the Secure Executor (spec §4.5).

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{SandboxCategory, SandboxError};

/// Output files beyond this extension set are never collected, even if the
/// subprocess writes them.
const OUTPUT_EXTENSION_ALLOWLIST: &[&str] = &["html", "pdf", "csv", "json", "xml", "yaml"];

/// Maximum size of any single file placed into a workspace before the
/// subprocess runs.
pub const MAX_INPUT_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// One collected output file, checksummed so the Formatter can attach a
/// resource block without re-reading it.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub relative_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub sha256_hex: String,
}

/// A fresh, unique temporary directory owned for the lifetime of one
/// executor call. `tempfile::TempDir`'s `Drop` removes the directory on
/// every exit path, including unwind from a panic.
pub struct CallWorkspace {
    dir: tempfile::TempDir,
}

impl CallWorkspace {
    pub fn new() -> Result<Self, SandboxError> {
        let dir = tempfile::TempDir::new().map_err(|e| {
            SandboxError::new(
                SandboxCategory::WorkspaceSetupFailed,
                format!("failed to create workspace: {e}"),
            )
        })?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Place one input file's bytes into the workspace. Rejects anything
    /// over `max_bytes` (the server-configured per-file cap) before writing
    /// a single byte.
    pub fn place_input_file(&self, relative_path: &str, bytes: &[u8], max_bytes: u64) -> Result<(), SandboxError> {
        if bytes.len() as u64 > max_bytes {
            return Err(SandboxError::new(
                SandboxCategory::WorkspaceSetupFailed,
                format!(
                    "input file '{relative_path}' is {} bytes, exceeds the {} byte cap",
                    bytes.len(),
                    max_bytes
                ),
            ));
        }
        let target = self.dir.path().join(relative_path);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SandboxError::new(
                    SandboxCategory::WorkspaceSetupFailed,
                    format!("failed to create parent directory for '{relative_path}': {e}"),
                )
            })?;
        }
        std::fs::write(&target, bytes).map_err(|e| {
            SandboxError::new(
                SandboxCategory::WorkspaceSetupFailed,
                format!("failed to write input file '{relative_path}': {e}"),
            )
        })
    }

    /// Snapshot of every file present before the subprocess runs, so output
    /// collection can find only what the subprocess created.
    pub fn snapshot(&self) -> HashSet<PathBuf> {
        walkdir::WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// Collect every file absent from `before` whose extension is
    /// allow-listed, checksumming each with SHA-256 (spec §4.5).
    pub fn collect_output_files(&self, before: &HashSet<PathBuf>) -> Result<Vec<OutputFile>, SandboxError> {
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path().to_path_buf();
            if before.contains(&path) {
                continue;
            }
            let Some(ext) = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase) else {
                continue;
            };
            if !OUTPUT_EXTENSION_ALLOWLIST.contains(&ext.as_str()) {
                continue;
            }

            let bytes = std::fs::read(&path).map_err(|e| {
                SandboxError::new(
                    SandboxCategory::OutputCollectionFailed,
                    format!("failed to read output file '{}': {e}", path.display()),
                )
            })?;
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            let sha256_hex = hex::encode(hasher.finalize());

            let relative_path = path
                .strip_prefix(self.dir.path())
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();

            out.push(OutputFile {
                content_type: content_type_for_extension(&ext),
                relative_path,
                size_bytes: bytes.len() as u64,
                sha256_hex,
            });
        }
        out.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(out)
    }
}

fn content_type_for_extension(ext: &str) -> String {
    match ext {
        "html" => "text/html",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" => "application/yaml",
        _ => "application/octet-stream",
    }
    .to_string()
}
