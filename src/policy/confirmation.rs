//! Scoped explicit confirmation
//!
//! A confirmation token binds one human approval to one action+target pair.
//! Scope comparison is exact string equality — no trimming, no case folding.
//! Both the plan-construction side and the token-issuing side must build the
//! scope with `generate_scope` or tokens will never match.

use crate::registry::Tool;
use crate::types::{ConfirmationToken, PlanStep, TokenKind, ToolCategory};

/// Confirmation requirement derivation and token validation
pub struct ConfirmationPolicy;

impl ConfirmationPolicy {
    /// Whether a tool demands explicit confirmation
    ///
    /// This derived value is what a plan step's `requires_confirmation`
    /// field must declare; mismatches are rejected as an invalid plan.
    pub fn needs_explicit_confirmation(tool: &dyn Tool) -> bool {
        tool.category() == ToolCategory::HighImpact || tool.requires_confirmation()
    }

    /// Whether a token approves this specific step
    pub fn is_token_valid_for_step(token: Option<&ConfirmationToken>, step: &PlanStep) -> bool {
        let Some(scope) = step.confirmation_scope.as_deref() else {
            return false;
        };
        let Some(token) = token else {
            return false;
        };
        if token.kind != TokenKind::Explicit {
            return false;
        }
        if !token.approved {
            return false;
        }
        token.scope == scope
    }

    /// Canonical scope string for an action on a target
    pub fn generate_scope(action: &str, target: &str) -> String {
        format!("{} {}", action, target)
    }
}
