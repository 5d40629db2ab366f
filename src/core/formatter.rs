//! Response Formatter (C8): turns an `ExecutionResponse` into protocol
//! content blocks (spec §4.8).

use std::path::Path;

use crate::core::executor::ExecutionResponse;
use crate::core::protocol::{CallToolResult, ContentBlock};

const DISPLAY_TRUNCATE_MARKER: &str = "\n… (truncated)";

pub struct ResponseFormatter {
    display_truncate_bytes: usize,
}

impl ResponseFormatter {
    pub fn new(display_truncate_bytes: usize) -> Self {
        Self { display_truncate_bytes }
    }

    /// `workspace_root` is used only to sanitise stderr text, never echoed
    /// back raw (spec §4.8/§7).
    pub fn format(&self, response: &ExecutionResponse, workspace_root: &Path) -> CallToolResult {
        let mut content = Vec::new();

        let stdout = truncate_for_display(response.stdout.trim(), self.display_truncate_bytes);
        content.push(ContentBlock::Text { text: stdout });

        for file in &response.output_files {
            content.push(ContentBlock::Resource {
                path: format!("./{}", file.relative_path),
                content_type: file.content_type.clone(),
                size_bytes: file.size_bytes,
            });
        }

        let is_error = response.exit_code != 0 || response.error.is_some();
        if is_error {
            let marker = response.category.map(|c| c.as_str()).unwrap_or("nonzero_exit");
            let sanitised_stderr = sanitize_paths(&response.stderr, workspace_root);
            let detail = if sanitised_stderr.trim().is_empty() {
                response.error.clone().unwrap_or_default()
            } else {
                sanitised_stderr
            };
            content.push(ContentBlock::Text {
                text: format!("[error: {marker}]\n{detail}"),
            });
        }

        CallToolResult { content, is_error }
    }
}

fn truncate_for_display(text: &str, cap: usize) -> String {
    if text.len() <= cap {
        return text.to_string();
    }
    let mut end = cap;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &text[..end], DISPLAY_TRUNCATE_MARKER)
}

/// Replaces the workspace root prefix with `./` and strips any other
/// absolute path down to its file name, so host filesystem layout never
/// leaks into a response (spec §4.7 "never exposing absolute host paths").
fn sanitize_paths(text: &str, workspace_root: &Path) -> String {
    let root_str = workspace_root.to_string_lossy().to_string();
    text.split_inclusive(char::is_whitespace)
        .map(|token| sanitize_token(token, &root_str))
        .collect()
}

fn sanitize_token(token: &str, root_str: &str) -> String {
    let (word, trailing_ws) = split_trailing_whitespace(token);
    if let Some(rest) = word.strip_prefix(root_str) {
        return format!(".{rest}{trailing_ws}");
    }
    if word.starts_with('/') {
        let name = Path::new(word)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| word.to_string());
        return format!("{name}{trailing_ws}");
    }
    token.to_string()
}

fn split_trailing_whitespace(token: &str) -> (&str, &str) {
    let trimmed = token.trim_end_matches(char::is_whitespace);
    (trimmed, &token[trimmed.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::OutputFile;
    use std::time::Duration;

    fn response(exit_code: i32, stdout: &str, stderr: &str) -> ExecutionResponse {
        ExecutionResponse {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(1),
            output_files: vec![],
            error: if exit_code == 0 { None } else { Some("nonzero_exit".to_string()) },
            category: None,
        }
    }

    #[test]
    fn successful_stdout_becomes_single_text_block() {
        let formatter = ResponseFormatter::new(1024);
        let result = formatter.format(&response(0, "created invoice inv-1", ""), Path::new("/tmp/ws"));
        assert!(!result.is_error);
        assert_eq!(result.content.len(), 1);
    }

    #[test]
    fn nonzero_exit_adds_error_block_and_sets_is_error() {
        let formatter = ResponseFormatter::new(1024);
        let result = formatter.format(&response(1, "", "boom"), Path::new("/tmp/ws"));
        assert!(result.is_error);
        assert_eq!(result.content.len(), 2);
    }

    #[test]
    fn output_files_become_resource_blocks() {
        let formatter = ResponseFormatter::new(1024);
        let mut r = response(0, "done", "");
        r.output_files.push(OutputFile {
            relative_path: "invoice.html".to_string(),
            content_type: "text/html".to_string(),
            size_bytes: 42,
            sha256_hex: "deadbeef".to_string(),
        });
        let result = formatter.format(&r, Path::new("/tmp/ws"));
        assert_eq!(result.content.len(), 2);
        match &result.content[1] {
            ContentBlock::Resource { path, .. } => assert_eq!(path, "./invoice.html"),
            _ => panic!("expected resource block"),
        }
    }

    #[test]
    fn sandbox_rejection_reports_the_category_as_the_error_tag() {
        use crate::errors::SandboxCategory;
        let formatter = ResponseFormatter::new(1024);
        let mut r = response(-1, "", "");
        r.error = Some("input file 'huge.csv' is 2048 bytes, exceeds the 1024 byte cap".to_string());
        r.category = Some(SandboxCategory::WorkspaceSetupFailed);
        let result = formatter.format(&r, Path::new("/tmp/ws"));
        match &result.content[1] {
            ContentBlock::Text { text } => {
                assert!(text.starts_with("[error: workspace_setup_failed]"));
                assert!(text.contains("exceeds the 1024 byte cap"));
            }
            _ => panic!("expected text block"),
        }
    }

    #[test]
    fn long_stdout_is_truncated_with_marker() {
        let formatter = ResponseFormatter::new(10);
        let result = formatter.format(&response(0, "0123456789abcdef", ""), Path::new("/tmp/ws"));
        match &result.content[0] {
            ContentBlock::Text { text } => assert!(text.ends_with(DISPLAY_TRUNCATE_MARKER)),
            _ => panic!("expected text block"),
        }
    }

    #[test]
    fn workspace_path_is_sanitized_to_dot() {
        let sanitised = sanitize_paths("wrote /tmp/ws/out.html ok", Path::new("/tmp/ws"));
        assert_eq!(sanitised, "wrote ./out.html ok");
    }

    #[test]
    fn foreign_absolute_path_is_reduced_to_file_name() {
        let sanitised = sanitize_paths("read /etc/secrets/config.toml", Path::new("/tmp/ws"));
        assert_eq!(sanitised, "read config.toml");
    }
}
