//! File tools
//!
//! Read, write, existence, listing and deletion rooted at the context's
//! project root. Relative paths resolve under the root; traversal
//! components are rejected so a plan cannot reach outside the project.

use crate::engine::EngineCap;
use crate::registry::Tool;
use crate::types::{ExecutionContext, ToolCategory, ToolResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Resolve an input path under the project root
///
/// Absolute paths and parent-directory components are refused.
fn resolve(root: &Path, raw: &str) -> Result<PathBuf, String> {
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(format!("Absolute paths are not allowed: {}", raw));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(format!("Path escapes project root: {}", raw));
    }
    Ok(root.join(path))
}

fn path_arg(input: &serde_json::Value) -> Option<&str> {
    input["path"].as_str().filter(|p| !p.trim().is_empty())
}

/// Read a file's contents
pub struct FileReadTool;

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file.read"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let start = Instant::now();
        let Some(raw) = path_arg(input) else {
            return ToolResult::failure("path is required", start.elapsed());
        };
        let path = match resolve(&ctx.project_root, raw) {
            Ok(path) => path,
            Err(e) => return ToolResult::failure(e, start.elapsed()),
        };
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => ToolResult::success(content, start.elapsed()),
            Err(e) => ToolResult::failure(format!("Failed to read {}: {}", raw, e), start.elapsed()),
        }
    }
}

/// Write content to a file, creating parent directories
pub struct FileWriteTool;

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file.write"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let start = Instant::now();
        let Some(raw) = path_arg(input) else {
            return ToolResult::failure("path is required", start.elapsed());
        };
        let Some(content) = input["content"].as_str() else {
            return ToolResult::failure("content is required", start.elapsed());
        };
        let path = match resolve(&ctx.project_root, raw) {
            Ok(path) => path,
            Err(e) => return ToolResult::failure(e, start.elapsed()),
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return ToolResult::failure(
                    format!("Failed to create parent of {}: {}", raw, e),
                    start.elapsed(),
                );
            }
        }
        match tokio::fs::write(&path, content).await {
            Ok(()) => ToolResult::success(
                format!("Wrote {} bytes to {}", content.len(), raw),
                start.elapsed(),
            ),
            Err(e) => {
                ToolResult::failure(format!("Failed to write {}: {}", raw, e), start.elapsed())
            }
        }
    }
}

/// Check whether a file exists
pub struct FileExistsTool;

#[async_trait]
impl Tool for FileExistsTool {
    fn name(&self) -> &str {
        "file.exists"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let start = Instant::now();
        let Some(raw) = path_arg(input) else {
            return ToolResult::failure("path is required", start.elapsed());
        };
        let path = match resolve(&ctx.project_root, raw) {
            Ok(path) => path,
            Err(e) => return ToolResult::failure(e, start.elapsed()),
        };
        let exists = tokio::fs::try_exists(&path).await.unwrap_or(false);
        ToolResult::success(
            format!("{}: {}", raw, if exists { "exists" } else { "missing" }),
            start.elapsed(),
        )
    }
}

/// List a directory's entries, sorted
pub struct FileListTool;

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &str {
        "file.list"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let start = Instant::now();
        let raw = input["path"].as_str().unwrap_or(".");
        let path = match resolve(&ctx.project_root, raw) {
            Ok(path) => path,
            Err(e) => return ToolResult::failure(e, start.elapsed()),
        };
        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                return ToolResult::failure(format!("Failed to list {}: {}", raw, e), start.elapsed())
            }
        };
        let mut names = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        let listing = if names.is_empty() {
            format!("{}: (empty)", raw)
        } else {
            names.join("\n")
        };
        ToolResult::success(listing, start.elapsed())
    }
}

/// Delete a file. High-impact: license-gated and confirmation-bound.
pub struct FileDeleteTool;

#[async_trait]
impl Tool for FileDeleteTool {
    fn name(&self) -> &str {
        "file.delete"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::HighImpact
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let start = Instant::now();
        let Some(raw) = path_arg(input) else {
            return ToolResult::failure("path is required", start.elapsed());
        };
        let path = match resolve(&ctx.project_root, raw) {
            Ok(path) => path,
            Err(e) => return ToolResult::failure(e, start.elapsed()),
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => ToolResult::success(format!("Deleted {}", raw), start.elapsed()),
            Err(e) => {
                ToolResult::failure(format!("Failed to delete {}: {}", raw, e), start.elapsed())
            }
        }
    }
}
