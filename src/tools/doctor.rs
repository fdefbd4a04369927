//! System diagnostic tools
//!
//! Read-only probes for doctor mode: hardware sensors, disk, uptime,
//! processes and memory. Each shells through the same sanitized argv
//! spawn helper as the terminal and git tools, so diagnostics inherit
//! the no-shell, cleared-environment, bounded-runtime semantics.

use crate::engine::EngineCap;
use crate::registry::Tool;
use crate::tools::terminal::run_argv;
use crate::types::{ExecutionContext, ToolCategory, ToolResult};
use async_trait::async_trait;

/// Timeout for diagnostic probes (10s)
const DOCTOR_TIMEOUT_MS: u64 = 10_000;

async fn probe(ctx: &ExecutionContext, file: &str, args: &[&str]) -> ToolResult {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    run_argv(file, &args, &ctx.project_root, DOCTOR_TIMEOUT_MS).await
}

/// Temperature sensors (`sensors`)
pub struct DoctorSensorsTool;

#[async_trait]
impl Tool for DoctorSensorsTool {
    fn name(&self) -> &str {
        "doctor.sensors"
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
        probe(ctx, "sensors", &[]).await
    }
}

/// Disk usage (`df -h`)
pub struct DoctorDfTool;

#[async_trait]
impl Tool for DoctorDfTool {
    fn name(&self) -> &str {
        "doctor.df"
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
        probe(ctx, "df", &["-h"]).await
    }
}

/// Load average (`uptime`)
pub struct DoctorUptimeTool;

#[async_trait]
impl Tool for DoctorUptimeTool {
    fn name(&self) -> &str {
        "doctor.uptime"
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
        probe(ctx, "uptime", &[]).await
    }
}

/// Top processes by CPU (`ps -eo ... --sort=-pcpu`)
pub struct DoctorPsTool;

#[async_trait]
impl Tool for DoctorPsTool {
    fn name(&self) -> &str {
        "doctor.ps"
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
        probe(ctx, "ps", &["-eo", "pid,ppid,pcpu,pmem,comm", "--sort=-pcpu"]).await
    }
}

/// Memory usage (`free -h`)
pub struct DoctorFreeTool;

#[async_trait]
impl Tool for DoctorFreeTool {
    fn name(&self) -> &str {
        "doctor.free"
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
        probe(ctx, "free", &["-h"]).await
    }
}
