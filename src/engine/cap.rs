//! Engine capability token
//!
//! `EngineCap` proves to a tool that its invocation came through the
//! engine's enforcement checks. The guarantee is structural, not a runtime
//! predicate: the only constructor is private to the `engine` module tree,
//! so no other code — in this crate or outside it — can produce a value
//! that satisfies a `run(&self, .., cap: &EngineCap)` signature. Spawning a
//! process therefore requires having passed the allowlist, license,
//! plan-safety and confirmation gates.
//!
//! Caps are minted fresh for each step inside `ExecutionEngine::execute`
//! and dropped when the step (including its verification sub-steps) ends;
//! the engine never stores one.

/// Unforgeable proof of engine-mediated invocation
///
/// ```compile_fail
/// // EngineCap has no public constructor and a private field;
/// // neither line compiles outside the engine module.
/// let cap = toolgate::EngineCap { _sealed: () };
/// ```
#[derive(Debug)]
pub struct EngineCap {
    _sealed: (),
}

impl EngineCap {
    /// Mint a capability. Only reachable from the engine module tree.
    pub(in crate::engine) fn mint() -> Self {
        Self { _sealed: () }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_inside_engine_module() {
        // The engine module tree can mint; everyone else only borrows.
        let _cap = EngineCap::mint();
    }
}
