//! Which solver backends each execution context can run.
//!
//! This table has to follow the engine builds actually deployed. A solver listed here that the
//! engine cannot run is not caught by the capability check; it fails at solve time and comes
//! back as an `ERROR` result.

use crate::context::ExecutionContext;
use crate::session::SessionError;
use log::warn;

const NATIVE_SOLVERS: &[&str] = &["cbc", "coinbc", "cp-sat", "chuffed"];
const SANDBOXED_SOLVERS: &[&str] = &["gecode", "chuffed", "cbc"];

/// Solver ids usable in one execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub context: ExecutionContext,
    pub available: &'static [&'static str],
    pub default: &'static str,
}

/// What to do when a caller asks for a solver the context cannot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Report [`SessionError::UnsupportedSolver`].
    #[default]
    Reject,
    /// Substitute the context's default solver (logged at warn level).
    UseDefault,
}

/// Look up the capability row for `context`.
#[must_use]
pub fn capabilities_for(context: ExecutionContext) -> Capabilities {
    match context {
        ExecutionContext::Native => Capabilities { context, available: NATIVE_SOLVERS, default: "cbc" },
        ExecutionContext::Sandboxed => Capabilities { context, available: SANDBOXED_SOLVERS, default: "gecode" },
    }
}

impl Capabilities {
    /// Exact, case-sensitive membership test.
    #[must_use]
    pub fn supports(&self, solver_id: &str) -> bool {
        self.available.contains(&solver_id)
    }

    /// Check a requested solver id against this row, applying `policy` when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnsupportedSolver`] when the id is not available and the policy
    /// is [`FallbackPolicy::Reject`].
    pub fn resolve(&self, solver_id: &str, policy: FallbackPolicy) -> Result<&'static str, SessionError> {
        if let Some(id) = self.available.iter().copied().find(|&id| id == solver_id) {
            return Ok(id);
        }
        match policy {
            FallbackPolicy::Reject => Err(self.unsupported(solver_id)),
            FallbackPolicy::UseDefault => {
                warn!("Solver '{solver_id}' is not available in the {} context; using '{}'", self.context, self.default);
                Ok(self.default)
            }
        }
    }

    pub(crate) fn unsupported(&self, solver_id: &str) -> SessionError {
        SessionError::UnsupportedSolver {
            solver: solver_id.to_string(),
            context: self.context,
            available: self.available.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_row() {
        let caps = capabilities_for(ExecutionContext::Native);
        assert_eq!(caps.default, "cbc");
        for id in ["cbc", "coinbc", "cp-sat", "chuffed"] {
            assert!(caps.supports(id), "native should support {id}");
        }
        assert!(!caps.supports("gecode"));
    }

    #[test]
    fn test_sandboxed_row() {
        let caps = capabilities_for(ExecutionContext::Sandboxed);
        assert_eq!(caps.default, "gecode");
        for id in ["gecode", "chuffed", "cbc"] {
            assert!(caps.supports(id), "sandboxed should support {id}");
        }
        assert!(!caps.supports("cp-sat"));
        assert!(!caps.supports("coinbc"));
    }

    #[test]
    fn test_default_is_always_available() {
        for context in [ExecutionContext::Native, ExecutionContext::Sandboxed] {
            let caps = capabilities_for(context);
            assert!(caps.supports(caps.default));
        }
    }

    #[test]
    fn test_ids_are_case_sensitive() {
        assert!(!capabilities_for(ExecutionContext::Native).supports("CBC"));
    }

    #[test]
    fn test_resolve_rejects_by_default() {
        let caps = capabilities_for(ExecutionContext::Native);
        let err = caps.resolve("gecode", FallbackPolicy::default()).unwrap_err();
        match err {
            SessionError::UnsupportedSolver { solver, context, available } => {
                assert_eq!(solver, "gecode");
                assert_eq!(context, ExecutionContext::Native);
                assert!(available.contains("cp-sat"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_with_explicit_fallback() {
        let caps = capabilities_for(ExecutionContext::Sandboxed);
        assert_eq!(caps.resolve("cp-sat", FallbackPolicy::UseDefault).unwrap(), "gecode");
        assert_eq!(caps.resolve("chuffed", FallbackPolicy::UseDefault).unwrap(), "chuffed");
    }
}
