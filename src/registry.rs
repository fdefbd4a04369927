//! Tool trait and authoritative allowlist
//!
//! Every executable action is a `Tool` registered in a `ToolRegistry`.
//! The registry is the single allowlist: no tool outside it is reachable,
//! and the engine hard-blocks unknown names at execution time.
//!
//! Registries are constructed once, before any `execute` call, and passed
//! by shared reference into the engine — never a module-level singleton.
//! Concurrent registration during active executions is unsupported.

use crate::engine::EngineCap;
use crate::errors::{EngineError, Result};
use crate::types::{ExecutionContext, ToolCategory, ToolResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A named, categorized unit of work
///
/// `run` receives the capability minted by the engine for this step; the
/// signature makes it impossible to invoke a tool without one, so side
/// effects only ever happen downstream of the engine's enforcement checks.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry (e.g. `terminal.write`)
    fn name(&self) -> &str;

    /// Category, the source of truth for risk and confirmation derivation
    fn category(&self) -> ToolCategory;

    /// Whether the tool demands confirmation beyond its category
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// Perform the work
    async fn run(
        &self,
        input: &serde_json::Value,
        ctx: &ExecutionContext,
        cap: &EngineCap,
    ) -> ToolResult;
}

/// Single authoritative allowlist for all tools
#[derive(Default)]
pub struct ToolRegistry {
    /// Map of tool name to implementation
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    ///
    /// Duplicate names are a fatal construction error; a registry with two
    /// tools under one name has no authoritative answer for that name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(EngineError::DuplicateTool { name });
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Register multiple tools, rejecting duplicates per item
    pub fn register_many(&mut self, tools: Vec<Arc<dyn Tool>>) -> Result<()> {
        for tool in tools {
            self.register(tool)?;
        }
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Check whether a tool is registered
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered names, sorted for deterministic reporting
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTool {
        name: &'static str,
        category: ToolCategory,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }

        fn category(&self) -> ToolCategory {
            self.category
        }

        async fn run(
            &self,
            _input: &serde_json::Value,
            _ctx: &ExecutionContext,
            _cap: &EngineCap,
        ) -> ToolResult {
            ToolResult::success("stub", std::time::Duration::ZERO)
        }
    }

    fn read_tool(name: &'static str) -> Arc<dyn Tool> {
        Arc::new(StubTool {
            name,
            category: ToolCategory::Read,
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(read_tool("logs.read")).unwrap();

        assert!(registry.has("logs.read"));
        assert!(registry.get("logs.read").is_some());
        assert!(!registry.has("unknown.tool"));
        assert!(registry.get("unknown.tool").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(read_tool("logs.read")).unwrap();

        let err = registry.register(read_tool("logs.read")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTool { ref name } if name == "logs.read"));
    }

    #[test]
    fn test_register_many_stops_at_duplicate() {
        let mut registry = ToolRegistry::new();
        let result = registry.register_many(vec![
            read_tool("a.read"),
            read_tool("b.read"),
            read_tool("a.read"),
        ]);

        assert!(result.is_err());
        // Items before the duplicate stay registered
        assert!(registry.has("a.read"));
        assert!(registry.has("b.read"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = ToolRegistry::new();
        registry
            .register_many(vec![
                read_tool("git.status"),
                read_tool("file.read"),
                read_tool("terminal.write"),
            ])
            .unwrap();

        assert_eq!(registry.list(), vec!["file.read", "git.status", "terminal.write"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }
}
