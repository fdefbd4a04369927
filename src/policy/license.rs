//! License gating (tier matrix, v1 locked)
//!
//! - starter/creator: no high-impact tools
//! - pro/pioneer: only `deploy.prod` among high-impact
//! - founder/enterprise: all tools

use crate::registry::Tool;
use crate::types::{LicenseTier, ToolCategory};

/// The one high-impact tool pro/pioneer tiers may use
const PRO_TIER_EXCEPTION: &str = "deploy.prod";

/// License tier matrix
pub struct LicensePolicy;

impl LicensePolicy {
    /// Whether a license tier may execute a tool
    ///
    /// This is the enforcement path. Non-high-impact tools are always
    /// allowed regardless of tier.
    pub fn can_use_tool(license: LicenseTier, tool: &dyn Tool) -> bool {
        if tool.category() != ToolCategory::HighImpact {
            return true;
        }
        match license {
            LicenseTier::Starter | LicenseTier::Creator => false,
            LicenseTier::Pro | LicenseTier::Pioneer => tool.name() == PRO_TIER_EXCEPTION,
            LicenseTier::Founder | LicenseTier::Enterprise => true,
        }
    }

    /// Categories a tier could reach, for UI display only
    ///
    /// Advisory. Execution is gated by `can_use_tool` alone — pro/pioneer
    /// appear here with high-impact access even though only `deploy.prod`
    /// would actually pass the gate.
    pub fn allowed_categories(license: LicenseTier) -> Vec<ToolCategory> {
        let base = vec![
            ToolCategory::Read,
            ToolCategory::SafeWrite,
            ToolCategory::Planning,
        ];
        match license {
            LicenseTier::Starter | LicenseTier::Creator => base,
            _ => {
                let mut all = base;
                all.push(ToolCategory::HighImpact);
                all
            }
        }
    }
}
