//! Shared types for the enforcement spine
//!
//! Core data model consumed by the registry, the policies and the engine:
//! tool categories, license tiers, plan steps, confirmation tokens, results,
//! streamed events and the execution report.
//!
//! Wire-shaped types serialize to the JSON contract the external planner and
//! UI already speak, so field renames are explicit rather than global.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Tool category, the source of truth for risk and confirmation derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolCategory {
    /// Pure inspection, no side effects
    #[serde(rename = "read")]
    Read,

    /// Reversible writes (files, staging)
    #[serde(rename = "safe-write")]
    SafeWrite,

    /// Produces plans/analysis, no direct side effects
    #[serde(rename = "planning")]
    Planning,

    /// Costly or hard-to-reverse effects, gated by license and confirmation
    #[serde(rename = "high-impact")]
    HighImpact,
}

/// Caller's entitlement tier
///
/// Ordering between tiers only exists through `LicensePolicy`; the enum
/// derives no ordering on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    Starter,
    Creator,
    Pro,
    Pioneer,
    Founder,
    Enterprise,
}

impl LicenseTier {
    /// Tier name as it appears on the wire and in report messages
    pub fn wire_name(self) -> &'static str {
        match self {
            LicenseTier::Starter => "starter",
            LicenseTier::Creator => "creator",
            LicenseTier::Pro => "pro",
            LicenseTier::Pioneer => "pioneer",
            LicenseTier::Founder => "founder",
            LicenseTier::Enterprise => "enterprise",
        }
    }
}

/// Declared risk level on a plan step
///
/// Must equal the value derived from the referenced tool's category;
/// the engine rejects mismatches before execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Risk level a tool category is expected to declare
    pub fn expected_for(category: ToolCategory) -> Self {
        match category {
            ToolCategory::HighImpact => RiskLevel::High,
            ToolCategory::SafeWrite => RiskLevel::Medium,
            ToolCategory::Read | ToolCategory::Planning => RiskLevel::Low,
        }
    }
}

/// One verification sub-step: a tool to run after the main step succeeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStep {
    /// Verification tool name (must be in the same registry)
    pub tool: String,

    /// Input for the verification tool
    pub input: serde_json::Value,
}

/// Verification plan attached to a step
///
/// Required on every step; an empty `steps` list means "nothing to verify".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationPlan {
    /// Ordered verification sub-steps
    pub steps: Vec<VerificationStep>,
}

/// One requested action in a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    /// Step identifier, echoed in streamed events
    #[serde(rename = "stepId", default)]
    pub step_id: String,

    /// Registered tool name
    pub tool: String,

    /// Tool input payload
    pub input: serde_json::Value,

    /// Declared risk level; must match the tool's category
    pub risk_level: Option<RiskLevel>,

    /// Declared confirmation requirement; must match the derived value
    pub requires_confirmation: Option<bool>,

    /// Scope string a confirmation token must match exactly
    #[serde(rename = "confirmationScope", skip_serializing_if = "Option::is_none")]
    pub confirmation_scope: Option<String>,

    /// Verification plan, required on every step
    pub verification_plan: Option<VerificationPlan>,
}

impl PlanStep {
    /// Create a step with safety fields left for the caller to fill
    pub fn new(step_id: impl Into<String>, tool: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            step_id: step_id.into(),
            tool: tool.into(),
            input,
            risk_level: None,
            requires_confirmation: None,
            confirmation_scope: None,
            verification_plan: None,
        }
    }

    /// Set declared safety fields
    pub fn with_safety(mut self, risk_level: RiskLevel, requires_confirmation: bool) -> Self {
        self.risk_level = Some(risk_level);
        self.requires_confirmation = Some(requires_confirmation);
        self
    }

    /// Set the confirmation scope
    pub fn with_confirmation_scope(mut self, scope: impl Into<String>) -> Self {
        self.confirmation_scope = Some(scope.into());
        self
    }

    /// Set the verification plan
    pub fn with_verification(mut self, plan: VerificationPlan) -> Self {
        self.verification_plan = Some(plan);
        self
    }
}

/// Kind of a confirmation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Explicit human approval (the only kind in v1)
    Explicit,
}

/// Evidence of human approval for one specific action+target pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationToken {
    /// Token kind
    pub kind: TokenKind,

    /// Whether the human approved
    pub approved: bool,

    /// Scope string, compared to the step's `confirmationScope` verbatim
    pub scope: String,
}

impl ConfirmationToken {
    /// Create an approved explicit token for the given scope
    pub fn explicit(scope: impl Into<String>) -> Self {
        Self {
            kind: TokenKind::Explicit,
            approved: true,
            scope: scope.into(),
        }
    }
}

/// Outcome of one tool run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool claims success
    pub success: bool,

    /// Surfaced output (stdout or result data)
    pub output: String,

    /// Human-readable error when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Exit code for process-backed tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(output: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            exit_code: Some(0),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            exit_code: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a result from a process exit code
    pub fn with_exit_code(output: impl Into<String>, exit_code: i32, duration: Duration) -> Self {
        Self {
            success: exit_code == 0,
            output: output.into(),
            error: if exit_code != 0 {
                Some(format!("Exit code {}", exit_code))
            } else {
                None
            },
            exit_code: Some(exit_code),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Output stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Event streamed to the caller while a process-backed tool runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolEvent {
    /// A chunk of child-process output
    Chunk {
        /// Source stream
        stream: StreamKind,

        /// Raw chunk data (lossy UTF-8)
        data: String,

        /// Step the chunk belongs to
        #[serde(rename = "stepId")]
        step_id: String,
    },

    /// The in-flight process was terminated
    Cancel {
        /// Stream identifier minted when spawning
        #[serde(rename = "streamId")]
        stream_id: String,

        /// Step the process belonged to
        #[serde(rename = "stepId")]
        step_id: String,

        /// Command that was running
        command: String,

        /// Termination reason (only `timeout` in v1)
        reason: CancelReason,
    },
}

/// Why an in-flight process was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelReason {
    Timeout,
}

/// Per-run environment handed to the engine and to every tool
///
/// Read-only during a run. Cancellation is cooperative: the stop flag is
/// checked between steps only, so a process already spawned for the current
/// step is not interrupted by it — only its own timeout can terminate it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Project root directory tools operate under
    pub project_root: PathBuf,

    /// Caller's license tier
    pub license: LicenseTier,

    /// Human approval evidence, if any
    pub confirmation_token: Option<ConfirmationToken>,

    /// Cooperative stop flag, shared with the caller
    stop: Arc<AtomicBool>,

    /// Bounded event channel; present switches process tools into
    /// streaming mode. A full channel blocks the chunk forwarders, not
    /// the engine loop.
    pub emitter: Option<mpsc::Sender<ToolEvent>>,
}

impl ExecutionContext {
    /// Create a context with no token, no emitter and a fresh stop flag
    pub fn new(project_root: impl Into<PathBuf>, license: LicenseTier) -> Self {
        Self {
            project_root: project_root.into(),
            license,
            confirmation_token: None,
            stop: Arc::new(AtomicBool::new(false)),
            emitter: None,
        }
    }

    /// Attach a confirmation token
    pub fn with_confirmation(mut self, token: ConfirmationToken) -> Self {
        self.confirmation_token = Some(token);
        self
    }

    /// Attach a streaming event channel
    pub fn with_emitter(mut self, emitter: mpsc::Sender<ToolEvent>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Share an external stop flag (e.g. flipped by a cancel endpoint)
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Whether the caller requested a stop
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Handle callers can use to request a stop between steps
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}

/// Categorized reason a run halted early
///
/// Exhaustive. A step that merely failed (`success=false`) does not halt
/// with a reason — the report is marked not-ok and the loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltReason {
    StopRequested,
    UnknownTool,
    LicenseBlock,
    InvalidPlan,
    ConfirmationRequired,
    VerificationFailed,
}

/// Informational classification of a failed tool result
///
/// Never feeds back into the halt taxonomy; recorded on the step so callers
/// can distinguish transient failures from permission problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    Timeout,
    PermissionDenied,
    Other,
}

impl FailureClass {
    /// Classify a tool error message
    pub fn classify(error: &str) -> Self {
        let lower = error.to_lowercase();
        if lower.starts_with("timeout:") || lower.contains("timed out") {
            FailureClass::Timeout
        } else if lower.contains("eacces") || lower.contains("permission denied") {
            FailureClass::PermissionDenied
        } else {
            FailureClass::Other
        }
    }
}

/// Audit trail attached to every attempted step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepAudit {
    /// Step input with sensitive values replaced by `[REDACTED]`
    pub input_redacted: serde_json::Value,
}

/// Result of one verification sub-step, recorded regardless of outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Verification tool name
    pub tool: String,

    /// Verification result
    pub result: ToolResult,
}

/// Record of one attempted plan step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// The step as submitted
    pub step: PlanStep,

    /// When the step was picked up
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    /// When the step finished (or was rejected)
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,

    /// The step's result (synthesized for pre-execution rejections)
    pub result: ToolResult,

    /// Verification attempts, present when any were made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Vec<VerificationRecord>>,

    /// Audit trail with redacted input
    pub audit: StepAudit,

    /// Classification when the tool itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_class: Option<FailureClass>,
}

/// Outcome of a whole plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether every step ran and succeeded
    pub ok: bool,

    /// Exactly the steps attempted, in order, up to the halting step
    pub steps: Vec<StepRecord>,

    /// Categorized halt reason, absent for clean runs and plain failures
    #[serde(rename = "haltedBecause", skip_serializing_if = "Option::is_none")]
    pub halted_because: Option<HaltReason>,
}

impl ExecutionReport {
    /// Create an empty, so-far-ok report
    pub fn new() -> Self {
        Self {
            ok: true,
            steps: Vec::new(),
            halted_because: None,
        }
    }
}

impl Default for ExecutionReport {
    fn default() -> Self {
        Self::new()
    }
}
