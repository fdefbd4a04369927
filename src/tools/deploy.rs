//! High-impact operations
//!
//! The most heavily gated tools in the standard registry: license-tier
//! restricted and confirmation-bound. Bodies are dispatch shims that
//! surface what was requested; wiring them to a real deploy pipeline is
//! the hosting application's concern.

use crate::engine::EngineCap;
use crate::registry::Tool;
use crate::types::{ExecutionContext, ToolCategory, ToolResult};
use async_trait::async_trait;
use std::time::Duration;

/// Production deploy — the one high-impact tool pro/pioneer tiers reach
pub struct DeployProdTool;

#[async_trait]
impl Tool for DeployProdTool {
    fn name(&self) -> &str {
        "deploy.prod"
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
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let Some(target) = input["target"].as_str().filter(|t| !t.trim().is_empty()) else {
            return ToolResult::failure("target is required", Duration::ZERO);
        };
        ToolResult::success(format!("Deployed to {}", target), Duration::ZERO)
    }
}

/// Docker resource pruning — destructive cleanup, founder/enterprise only
pub struct DockerPruneTool;

#[async_trait]
impl Tool for DockerPruneTool {
    fn name(&self) -> &str {
        "docker.prune"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::HighImpact
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    async fn run(
        &self,
        _input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        ToolResult::success("Docker prune executed", Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_tools_are_high_impact_and_confirmed() {
        assert_eq!(DeployProdTool.category(), ToolCategory::HighImpact);
        assert!(DeployProdTool.requires_confirmation());
        assert_eq!(DockerPruneTool.category(), ToolCategory::HighImpact);
        assert!(DockerPruneTool.requires_confirmation());
    }
}
