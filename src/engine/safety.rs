//! Plan-safety field validation
//!
//! A plan step must declare the risk level and confirmation requirement
//! the referenced tool's category implies. Violations are collected, not
//! short-circuited, so a malformed step is reported in full.

use crate::policy::ConfirmationPolicy;
use crate::registry::Tool;
use crate::types::{PlanStep, RiskLevel};

/// Validate a step's declared safety fields against a known tool
///
/// Returns every violation; an empty vec means the declaration matches
/// what the tool's category derives.
pub fn validate_safety_fields(step: &PlanStep, tool: &dyn Tool) -> Vec<String> {
    let mut errors = Vec::new();

    let expected_risk = RiskLevel::expected_for(tool.category());
    let expected_confirmation = ConfirmationPolicy::needs_explicit_confirmation(tool);

    match step.risk_level {
        None => errors.push("risk_level is required".to_string()),
        Some(declared) if declared != expected_risk => {
            errors.push(format!(
                "risk_level mismatch (expected {:?}, got {:?})",
                expected_risk, declared
            ));
        }
        Some(_) => {}
    }

    match step.requires_confirmation {
        None => errors.push("requires_confirmation is required".to_string()),
        Some(declared) if declared != expected_confirmation => {
            errors.push(format!(
                "requires_confirmation mismatch (expected {}, got {})",
                expected_confirmation, declared
            ));
        }
        Some(_) => {}
    }

    if step.verification_plan.is_none() {
        errors.push("verification_plan is required".to_string());
    }

    if step.requires_confirmation == Some(true) && step.confirmation_scope.is_none() {
        errors.push("confirmationScope is required when requires_confirmation=true".to_string());
    }

    errors
}
