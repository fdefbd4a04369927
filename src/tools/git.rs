//! Version-control tools
//!
//! Thin wrappers over the git binary, executed through the same sanitized
//! argv spawn helper as the terminal tool — no shell, cleared environment,
//! bounded runtime.

use crate::engine::EngineCap;
use crate::registry::Tool;
use crate::tools::terminal::run_argv;
use crate::types::{ExecutionContext, ToolCategory, ToolResult};
use async_trait::async_trait;

/// Timeout for git invocations (10s)
const GIT_TIMEOUT_MS: u64 = 10_000;

async fn git(ctx: &ExecutionContext, args: &[&str]) -> ToolResult {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    run_argv("git", &args, &ctx.project_root, GIT_TIMEOUT_MS).await
}

/// Working-tree status (`git status --short --branch`)
pub struct GitStatusTool;

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git.status"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        _input: &serde_json::Value,
        ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        git(ctx, &["status", "--short", "--branch"]).await
    }
}

/// Recent history (`git log --oneline`)
pub struct GitLogTool;

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &str {
        "git.log"
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
        let count = input["count"].as_u64().unwrap_or(10);
        git(ctx, &["log", "--oneline", "-n", &count.to_string()]).await
    }
}

/// Stage paths (`git add`)
pub struct GitStageTool;

#[async_trait]
impl Tool for GitStageTool {
    fn name(&self) -> &str {
        "git.stage"
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
        let paths: Vec<&str> = input["paths"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if paths.is_empty() {
            return ToolResult::failure("paths is required", std::time::Duration::ZERO);
        }
        let mut args = vec!["add", "--verbose"];
        args.extend(paths);
        git(ctx, &args).await
    }
}

/// Create a commit. Safe-write, but demands explicit confirmation:
/// commits rewrite shared history expectations even when reversible.
pub struct GitCommitTool;

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        "git.commit"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
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
        let Some(message) = input["message"].as_str().filter(|m| !m.trim().is_empty()) else {
            return ToolResult::failure("message is required", std::time::Duration::ZERO);
        };
        git(ctx, &["commit", "-m", message]).await
    }
}
