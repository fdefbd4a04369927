//! Execution engine: the single choke point for tool execution
//!
//! Every requested action passes through `ExecutionEngine::execute`, which
//! enforces, in order: cooperative stop, registry allowlist, license gating,
//! plan-safety declaration, scoped confirmation, output surfacing and
//! verification. The first failing check halts the whole run with a
//! categorized reason.
//!
//! Plan execution is strictly sequential: a step runs to completion,
//! verification sub-steps included, before the next step begins.

pub mod audit;
pub mod cap;
pub mod safety;

pub use cap::EngineCap;


use crate::policy::{ConfirmationPolicy, LicensePolicy};
use crate::registry::ToolRegistry;
use crate::types::{
    ExecutionContext, ExecutionReport, FailureClass, HaltReason, PlanStep, StepAudit, StepRecord,
    ToolResult, VerificationRecord,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Orchestrates a plan against a registry and a context
///
/// Holds the only path to `EngineCap` construction: a fresh cap is minted
/// for each step, shared with that step's verification sub-steps, and
/// dropped when the step ends.
pub struct ExecutionEngine {
    /// Authoritative allowlist, constructed before any execute call
    registry: Arc<ToolRegistry>,
}

impl ExecutionEngine {
    /// Create an engine over a constructed registry
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// The engine's registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Execute a plan step by step, halting on the first failed check
    ///
    /// The report contains exactly the steps attempted, in order, up to and
    /// including the halting step. A stop request before a step leaves no
    /// record for that step.
    pub async fn execute(&self, plan: &[PlanStep], ctx: &ExecutionContext) -> ExecutionReport {
        let mut report = ExecutionReport::new();

        for step in plan {
            // 1. Cooperative stop, checked between steps only
            if ctx.stop_requested() {
                warn!(step = %step.step_id, "halting: stop requested");
                report.ok = false;
                report.halted_because = Some(HaltReason::StopRequested);
                break;
            }

            // 2. Registry allowlist
            let Some(tool) = self.registry.get(&step.tool) else {
                warn!(tool = %step.tool, "halting: unknown tool");
                report.ok = false;
                report.halted_because = Some(HaltReason::UnknownTool);
                report
                    .steps
                    .push(rejected_record(step, format!("Unknown tool: {}", step.tool)));
                break;
            };

            // 3. License gating
            if !LicensePolicy::can_use_tool(ctx.license, tool.as_ref()) {
                warn!(tool = %step.tool, license = ?ctx.license, "halting: license block");
                report.ok = false;
                report.halted_because = Some(HaltReason::LicenseBlock);
                report.steps.push(rejected_record(
                    step,
                    format!("Blocked by license ({}): {}", ctx.license.wire_name(), tool.name()),
                ));
                break;
            }

            // 4. Plan-safety declaration
            let safety_errors = safety::validate_safety_fields(step, tool.as_ref());
            if !safety_errors.is_empty() {
                warn!(tool = %step.tool, errors = ?safety_errors, "halting: invalid plan");
                report.ok = false;
                report.halted_because = Some(HaltReason::InvalidPlan);
                report.steps.push(rejected_record(
                    step,
                    format!("Invalid step safety fields: {}", safety_errors.join("; ")),
                ));
                break;
            }

            // 5. Scoped explicit confirmation
            if step.requires_confirmation == Some(true) {
                let valid = ConfirmationPolicy::is_token_valid_for_step(
                    ctx.confirmation_token.as_ref(),
                    step,
                );
                if !valid {
                    warn!(tool = %step.tool, "halting: confirmation required");
                    report.ok = false;
                    report.halted_because = Some(HaltReason::ConfirmationRequired);
                    report.steps.push(rejected_record(
                        step,
                        format!("Explicit confirmation required: {}", tool.name()),
                    ));
                    break;
                }
            }

            // 6. Execute with a freshly minted capability
            debug!(tool = %step.tool, step = %step.step_id, "executing step");
            let cap = EngineCap::mint();
            let started_at = Utc::now();
            let result = tool.run(&step.input, ctx, &cap).await;
            let finished_at = Utc::now();

            // 7. Output surfacing: never trust a silent success
            if result.success && result.output.trim().is_empty() {
                warn!(tool = %step.tool, "halting: claimed success without surfaced output");
                report.ok = false;
                report.halted_because = Some(HaltReason::VerificationFailed);
                report.steps.push(StepRecord {
                    step: step.clone(),
                    started_at,
                    finished_at,
                    result: ToolResult::failure(
                        "Tool claimed success without surfaced output",
                        Duration::from_millis(result.duration_ms),
                    ),
                    verification: None,
                    audit: audit_for(step),
                    failure_class: None,
                });
                break;
            }

            let mut entry = StepRecord {
                step: step.clone(),
                started_at,
                finished_at,
                result: result.clone(),
                verification: None,
                audit: audit_for(step),
                failure_class: None,
            };

            // 8. Verification enforcement, same cap, all attempts recorded
            let verification_steps = step
                .verification_plan
                .as_ref()
                .map(|p| p.steps.as_slice())
                .unwrap_or(&[]);
            if result.success && !verification_steps.is_empty() {
                let mut records = Vec::new();
                for v in verification_steps {
                    let Some(vtool) = self.registry.get(&v.tool) else {
                        warn!(tool = %v.tool, "halting: unknown verification tool");
                        report.ok = false;
                        report.halted_because = Some(HaltReason::UnknownTool);
                        records.push(VerificationRecord {
                            tool: v.tool.clone(),
                            result: ToolResult::failure(
                                format!("Unknown verification tool: {}", v.tool),
                                Duration::ZERO,
                            ),
                        });
                        break;
                    };
                    let vres = vtool.run(&v.input, ctx, &cap).await;
                    let failed = !vres.success;
                    records.push(VerificationRecord {
                        tool: v.tool.clone(),
                        result: vres,
                    });
                    if failed {
                        warn!(tool = %v.tool, "halting: verification failed");
                        report.ok = false;
                        report.halted_because = Some(HaltReason::VerificationFailed);
                        break;
                    }
                }
                entry.verification = Some(records);
            }

            // 9. Record the attempt; a failed tool result ends the run
            //    without a halt reason
            if !result.success {
                entry.failure_class = result
                    .error
                    .as_deref()
                    .map(FailureClass::classify)
                    .or(Some(FailureClass::Other));
            }
            report.steps.push(entry);

            if report.halted_because.is_some() {
                break;
            }
            if !result.success {
                debug!(tool = %step.tool, "step failed, stopping run");
                report.ok = false;
                break;
            }
        }

        report
    }
}

/// Record for a step rejected before its tool ran
fn rejected_record(step: &PlanStep, error: String) -> StepRecord {
    let now = Utc::now();
    StepRecord {
        step: step.clone(),
        started_at: now,
        finished_at: now,
        result: ToolResult::failure(error, Duration::ZERO),
        verification: None,
        audit: audit_for(step),
        failure_class: None,
    }
}

fn audit_for(step: &PlanStep) -> StepAudit {
    StepAudit {
        input_redacted: audit::redact_input(&step.input),
    }
}
