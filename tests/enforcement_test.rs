//! Enforcement regression tests (v1 contract lock)
//!
//! Drives the engine through its public surface only: a registry of stub
//! tools plus the real terminal tool, exactly how an external caller would
//! wire it. Each case pins one never-do guarantee of the spine.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use toolgate::{
    CancelReason, ConfirmationToken, EngineCap, ExecutionContext, ExecutionEngine, FailureClass,
    HaltReason, LicenseTier, PlanStep, RiskLevel, Tool, ToolCategory, ToolEvent, ToolRegistry,
    ToolResult, VerificationPlan, VerificationStep,
};

// ---------------------------------------------------------------------------
// Stub tools
// ---------------------------------------------------------------------------

struct ReadTool;

#[async_trait]
impl Tool for ReadTool {
    fn name(&self) -> &str {
        "logs.read"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let msg = input["msg"].as_str().unwrap_or("");
        ToolResult::success(format!("READ:{}", msg), Duration::from_millis(1))
    }
}

struct DeleteTool;

#[async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &str {
        "fs.delete"
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
        let path = input["path"].as_str().unwrap_or("");
        ToolResult::success(format!("DELETED:{}", path), Duration::from_millis(1))
    }
}

struct DeployTool;

#[async_trait]
impl Tool for DeployTool {
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
        let target = input["target"].as_str().unwrap_or("");
        ToolResult::success(format!("DEPLOYED:{}", target), Duration::from_millis(1))
    }
}

/// Claims success but surfaces only whitespace
struct SilentSuccessTool;

#[async_trait]
impl Tool for SilentSuccessTool {
    fn name(&self) -> &str {
        "format.run"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
    }

    async fn run(
        &self,
        _input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        ToolResult::success("   ", Duration::from_millis(1))
    }
}

/// Verification probe that always reports unhealthy
struct VerifyFailTool;

#[async_trait]
impl Tool for VerifyFailTool {
    fn name(&self) -> &str {
        "verify.health"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Read
    }

    async fn run(
        &self,
        input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        let target = input["target"].as_str().unwrap_or("");
        ToolResult::failure(format!("HEALTH_BAD:{}", target), Duration::from_millis(1))
    }
}

struct PermissionFailTool;

#[async_trait]
impl Tool for PermissionFailTool {
    fn name(&self) -> &str {
        "fs.protected_write"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
    }

    async fn run(
        &self,
        _input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        ToolResult::failure("EACCES: permission denied", Duration::from_millis(1))
    }
}

struct TimeoutFailTool;

#[async_trait]
impl Tool for TimeoutFailTool {
    fn name(&self) -> &str {
        "build.timeout"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::SafeWrite
    }

    async fn run(
        &self,
        _input: &serde_json::Value,
        _ctx: &ExecutionContext,
        _cap: &EngineCap,
    ) -> ToolResult {
        ToolResult::failure("command timed out after 60000ms", Duration::from_millis(1))
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn make_engine() -> ExecutionEngine {
    let mut registry = ToolRegistry::new();
    registry
        .register_many(vec![
            Arc::new(ReadTool),
            Arc::new(DeleteTool),
            Arc::new(DeployTool),
            Arc::new(SilentSuccessTool),
            Arc::new(VerifyFailTool),
            Arc::new(PermissionFailTool),
            Arc::new(TimeoutFailTool),
            Arc::new(toolgate::tools::TerminalWriteTool),
        ])
        .unwrap();
    ExecutionEngine::new(Arc::new(registry))
}

/// Fill declared safety fields from the tool name, the way a correct
/// planner would
fn step(tool: &str, input: serde_json::Value) -> PlanStep {
    let (risk, confirm) = match tool {
        "fs.delete" | "deploy.prod" => (RiskLevel::High, true),
        "format.run" | "fs.protected_write" | "build.timeout" | "terminal.write" => {
            (RiskLevel::Medium, false)
        }
        _ => (RiskLevel::Low, false),
    };
    PlanStep::new(tool, tool, input)
        .with_safety(risk, confirm)
        .with_verification(VerificationPlan::default())
}

fn ctx(license: LicenseTier) -> ExecutionContext {
    ExecutionContext::new(".", license)
}

// ---------------------------------------------------------------------------
// Never-do cases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_tool_must_be_blocked() {
    let engine = make_engine();
    let report = engine
        .execute(&[step("fs.nuke", json!({}))], &ctx(LicenseTier::Starter))
        .await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::UnknownTool));
    assert_eq!(report.steps.len(), 1);
}

#[tokio::test]
async fn high_impact_cannot_run_without_explicit_token() {
    let engine = make_engine();
    let plan = [step("fs.delete", json!({"path": "./x"})).with_confirmation_scope("delete ./x")];
    let report = engine.execute(&plan, &ctx(LicenseTier::Founder)).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::ConfirmationRequired));
}

#[tokio::test]
async fn wrong_scope_token_is_rejected() {
    let engine = make_engine();
    let plan = [step("deploy.prod", json!({"target": "prod"})).with_confirmation_scope("deploy prod")];
    // Near-miss scope must not pass
    let context = ctx(LicenseTier::Pro).with_confirmation(ConfirmationToken::explicit("deploy production"));
    let report = engine.execute(&plan, &context).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::ConfirmationRequired));
}

#[tokio::test]
async fn starter_license_blocks_all_high_impact() {
    let engine = make_engine();
    let plan = [step("deploy.prod", json!({"target": "prod"})).with_confirmation_scope("deploy prod")];
    // Even with a valid token, the license gate comes first
    let context =
        ctx(LicenseTier::Starter).with_confirmation(ConfirmationToken::explicit("deploy prod"));
    let report = engine.execute(&plan, &context).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::LicenseBlock));
    // Tier renders by its wire name in the surfaced message
    assert_eq!(
        report.steps[0].result.error.as_deref(),
        Some("Blocked by license (starter): deploy.prod")
    );
}

#[tokio::test]
async fn pro_can_use_deploy_prod_but_not_other_high_impact() {
    let engine = make_engine();

    let plan = [step("deploy.prod", json!({"target": "prod"})).with_confirmation_scope("deploy prod")];
    let context = ctx(LicenseTier::Pro).with_confirmation(ConfirmationToken::explicit("deploy prod"));
    let report = engine.execute(&plan, &context).await;
    assert!(report.ok);
    assert_eq!(report.steps[0].result.output, "DEPLOYED:prod");

    let plan = [step("fs.delete", json!({"path": "./x"})).with_confirmation_scope("delete ./x")];
    let context = ctx(LicenseTier::Pro).with_confirmation(ConfirmationToken::explicit("delete ./x"));
    let report = engine.execute(&plan, &context).await;
    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::LicenseBlock));
}

#[tokio::test]
async fn must_not_claim_success_without_output() {
    let engine = make_engine();
    let report = engine
        .execute(&[step("format.run", json!({}))], &ctx(LicenseTier::Starter))
        .await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::VerificationFailed));
    assert!(report.steps[0]
        .result
        .error
        .as_deref()
        .unwrap()
        .contains("without surfaced output"));
}

#[tokio::test]
async fn verification_failure_fails_execution() {
    let engine = make_engine();
    let plan = [step("deploy.prod", json!({"target": "prod"}))
        .with_confirmation_scope("deploy prod")
        .with_verification(VerificationPlan {
            steps: vec![VerificationStep {
                tool: "verify.health".to_string(),
                input: json!({"target": "prod"}),
            }],
        })];
    let context = ctx(LicenseTier::Pro).with_confirmation(ConfirmationToken::explicit("deploy prod"));
    let report = engine.execute(&plan, &context).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::VerificationFailed));
    let verification = report.steps[0].verification.as_ref().unwrap();
    assert_eq!(verification.len(), 1);
    assert!(!verification[0].result.success);
}

#[tokio::test]
async fn unknown_verification_tool_halts_and_is_recorded() {
    let engine = make_engine();
    let plan = [step("logs.read", json!({"msg": "a"})).with_verification(VerificationPlan {
        steps: vec![VerificationStep {
            tool: "verify.missing".to_string(),
            input: json!({}),
        }],
    })];
    let report = engine.execute(&plan, &ctx(LicenseTier::Starter)).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::UnknownTool));
    let verification = report.steps[0].verification.as_ref().unwrap();
    assert_eq!(verification.len(), 1);
    assert_eq!(
        verification[0].result.error.as_deref(),
        Some("Unknown verification tool: verify.missing")
    );
}

#[tokio::test]
async fn stop_requested_halts_before_any_step() {
    let engine = make_engine();
    let context = ctx(LicenseTier::Starter);
    context
        .stop_flag()
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let report = engine
        .execute(
            &[step("logs.read", json!({"msg": "a"})), step("logs.read", json!({"msg": "b"}))],
            &context,
        )
        .await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::StopRequested));
    assert!(report.steps.is_empty());
}

#[tokio::test]
async fn read_tool_works_without_confirmation() {
    let engine = make_engine();
    let report = engine
        .execute(&[step("logs.read", json!({"msg": "test"}))], &ctx(LicenseTier::Starter))
        .await;

    assert!(report.ok);
    assert!(report.halted_because.is_none());
    assert_eq!(report.steps[0].result.output, "READ:test");
}

#[tokio::test]
async fn missing_safety_fields_rejected_before_execution() {
    let engine = make_engine();
    let bare = PlanStep::new("s1", "logs.read", json!({"msg": "test"}));
    let report = engine.execute(&[bare], &ctx(LicenseTier::Starter)).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::InvalidPlan));
    let error = report.steps[0].result.error.as_deref().unwrap();
    assert!(error.contains("risk_level is required"));
    assert!(error.contains("; "));
}

#[tokio::test]
async fn risk_level_mismatch_is_invalid_plan_regardless_of_license() {
    let engine = make_engine();
    // Correct license and token; only the declared risk is wrong
    let plan = [PlanStep::new("s1", "deploy.prod", json!({"target": "prod"}))
        .with_safety(RiskLevel::Low, true)
        .with_confirmation_scope("deploy prod")
        .with_verification(VerificationPlan::default())];
    let context = ctx(LicenseTier::Founder).with_confirmation(ConfirmationToken::explicit("deploy prod"));
    let report = engine.execute(&plan, &context).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::InvalidPlan));
    assert!(report.steps[0]
        .result
        .error
        .as_deref()
        .unwrap()
        .contains("risk_level mismatch"));
}

// ---------------------------------------------------------------------------
// Failure semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_step_is_not_a_halt_and_is_classified() {
    let engine = make_engine();

    let report = engine
        .execute(&[step("fs.protected_write", json!({}))], &ctx(LicenseTier::Starter))
        .await;
    assert!(!report.ok);
    assert!(report.halted_because.is_none());
    assert_eq!(report.steps[0].failure_class, Some(FailureClass::PermissionDenied));

    let report = engine
        .execute(&[step("build.timeout", json!({}))], &ctx(LicenseTier::Starter))
        .await;
    assert!(!report.ok);
    assert!(report.halted_because.is_none());
    assert_eq!(report.steps[0].failure_class, Some(FailureClass::Timeout));
}

#[tokio::test]
async fn report_contains_exactly_the_attempted_steps() {
    let engine = make_engine();
    // Five steps; the third fails the allowlist check
    let plan = [
        step("logs.read", json!({"msg": "1"})),
        step("logs.read", json!({"msg": "2"})),
        step("fs.nuke", json!({})),
        step("logs.read", json!({"msg": "4"})),
        step("logs.read", json!({"msg": "5"})),
    ];
    let report = engine.execute(&plan, &ctx(LicenseTier::Starter)).await;

    assert!(!report.ok);
    assert_eq!(report.halted_because, Some(HaltReason::UnknownTool));
    assert_eq!(report.steps.len(), 3);
    assert!(report.steps[0].result.success);
    assert!(report.steps[1].result.success);
    assert!(!report.steps[2].result.success);
}

#[tokio::test]
async fn step_audit_redacts_sensitive_inputs() {
    let engine = make_engine();
    let plan = [step(
        "logs.read",
        json!({"msg": "hello", "token": "abc", "nested": {"password": "p1", "keep": "ok"}}),
    )];
    let report = engine.execute(&plan, &ctx(LicenseTier::Starter)).await;

    assert!(report.ok);
    assert_eq!(
        report.steps[0].audit.input_redacted,
        json!({"msg": "hello", "token": "[REDACTED]", "nested": {"password": "[REDACTED]", "keep": "ok"}})
    );
}

// ---------------------------------------------------------------------------
// Terminal tool through the engine
// ---------------------------------------------------------------------------

#[tokio::test]
async fn terminal_streaming_forwards_chunks() {
    let engine = make_engine();
    let (tx, mut rx) = mpsc::channel(64);
    let context = ctx(LicenseTier::Starter).with_emitter(tx);
    let plan = [step(
        "terminal.write",
        json!({"command": "echo streamed-line", "stepId": "t1"}),
    )];

    let report = engine.execute(&plan, &context).await;
    assert!(report.ok);
    assert!(report.steps[0].result.output.contains("streamed-line"));

    drop(context);
    let mut saw_chunk = false;
    while let Some(event) = rx.recv().await {
        if let ToolEvent::Chunk { stream, data, step_id } = event {
            assert_eq!(stream, toolgate::StreamKind::Stdout);
            assert_eq!(step_id, "t1");
            if data.contains("streamed-line") {
                saw_chunk = true;
            }
        }
    }
    assert!(saw_chunk);
}

#[tokio::test]
async fn terminal_timeout_kills_and_emits_cancel() {
    let engine = make_engine();
    let (tx, mut rx) = mpsc::channel(64);
    let context = ctx(LicenseTier::Starter).with_emitter(tx);
    let plan = [step(
        "terminal.write",
        json!({"command": "sleep 5", "timeoutMs": 100, "stepId": "t2"}),
    )];

    let started = std::time::Instant::now();
    let report = engine.execute(&plan, &context).await;
    // Resolves on the timeout, not the sleep
    assert!(started.elapsed() < Duration::from_secs(2));

    assert!(!report.ok);
    assert!(report.halted_because.is_none());
    let error = report.steps[0].result.error.as_deref().unwrap();
    assert!(error.starts_with("TIMEOUT:"), "unexpected error: {error}");
    assert_eq!(report.steps[0].failure_class, Some(FailureClass::Timeout));

    drop(context);
    let mut saw_cancel = false;
    while let Some(event) = rx.recv().await {
        if let ToolEvent::Cancel { reason, step_id, command, .. } = event {
            assert_eq!(reason, CancelReason::Timeout);
            assert_eq!(step_id, "t2");
            assert_eq!(command, "sleep 5");
            saw_cancel = true;
        }
    }
    assert!(saw_cancel);
}

#[tokio::test]
async fn terminal_nonstreaming_reports_exit_code() {
    let engine = make_engine();
    let plan = [step("terminal.write", json!({"command": "false"}))];
    let report = engine.execute(&plan, &ctx(LicenseTier::Starter)).await;

    assert!(!report.ok);
    assert!(report.halted_because.is_none());
    assert_eq!(report.steps[0].result.exit_code, Some(1));
    assert_eq!(report.steps[0].result.error.as_deref(), Some("Exit code 1"));
}

#[tokio::test]
async fn bypass_attempt_never_surfaces_through_the_engine() {
    // EngineCap is sealed: no caller can invoke a tool without the engine,
    // so no report produced through the public entry point can carry a
    // bypass marker.
    let engine = make_engine();
    let plans: Vec<Vec<PlanStep>> = vec![
        vec![step("logs.read", json!({"msg": "a"}))],
        vec![step("terminal.write", json!({"command": "echo ok"}))],
        vec![step("fs.nuke", json!({}))],
    ];
    for plan in plans {
        let report = engine.execute(&plan, &ctx(LicenseTier::Starter)).await;
        let serialized = serde_json::to_string(&report).unwrap();
        assert!(!serialized.contains("BYPASS_ATTEMPT"));
    }
}
