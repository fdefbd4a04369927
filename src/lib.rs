//! toolgate — enforcement spine for agent tool execution
//!
//! A single choke point decides, for every requested action, whether it may
//! run, whether it needs explicit human confirmation, and whether its
//! claimed success is trustworthy — before any side-effecting operation
//! (notably spawning OS processes) occurs.
//!
//! # Architecture
//!
//! Dependency order, leaves first:
//! - `types`: shared data model (plan steps, tokens, results, report)
//! - `engine::cap`: unforgeable capability token
//! - `registry`: authoritative tool allowlist
//! - `policy`: pure license and confirmation decisions
//! - `engine`: the execution choke point
//! - `tools`: concrete tools, the only performers of real side effects
//!
//! External callers build a plan and an [`ExecutionContext`], call
//! [`ExecutionEngine::execute`], and render the returned
//! [`ExecutionReport`].

pub mod engine;
pub mod errors;
pub mod policy;
pub mod registry;
pub mod tools;
pub mod types;

// Re-export the public surface
pub use engine::{EngineCap, ExecutionEngine};
pub use errors::{EngineError, Result};
pub use policy::{ConfirmationPolicy, LicensePolicy};
pub use registry::{Tool, ToolRegistry};
pub use types::{
    CancelReason, ConfirmationToken, ExecutionContext, ExecutionReport, FailureClass, HaltReason,
    LicenseTier, PlanStep, RiskLevel, StepRecord, StreamKind, TokenKind, ToolCategory, ToolEvent,
    ToolResult, VerificationPlan, VerificationStep,
};
