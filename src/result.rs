//! The canonical result of one solve call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of a solve. No other status is ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// The engine proved its solution optimal.
    Optimal,
    /// A feasible solution, not proven optimal (e.g. the time limit was reached).
    Satisfied,
    /// The engine proved no assignment satisfies the model.
    Unsatisfiable,
    /// No solution and no proof either way: timeouts and unreadable responses end up here.
    Unknown,
    /// The engine failed.
    Error,
}

impl SolveStatus {
    /// Map an engine status string. Anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_engine(raw: &str) -> SolveStatus {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OPTIMAL" | "OPTIMAL_SOLUTION" => SolveStatus::Optimal,
            "SATISFIED" | "ALL_SOLUTIONS" => SolveStatus::Satisfied,
            "UNSATISFIABLE" | "UNSAT_OR_UNBOUNDED" => SolveStatus::Unsatisfiable,
            "ERROR" => SolveStatus::Error,
            _ => SolveStatus::Unknown,
        }
    }

    /// True for the statuses that carry an assignment.
    #[must_use]
    pub fn is_solved(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Satisfied)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Satisfied => "SATISFIED",
            SolveStatus::Unsatisfiable => "UNSATISFIABLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine statistics, numeric entries only.
pub type Statistics = BTreeMap<String, f64>;

/// Canonical solve result, identical in shape for every engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResult {
    pub status: SolveStatus,
    /// `assignment[i]` is the team (0 or 1) of player `i`; present only for solved statuses.
    pub assignment: Option<Vec<u8>>,
    pub statistics: Option<Statistics>,
    pub elapsed_millis: u64,
    pub error_detail: Option<String>,
}

impl SolveResult {
    /// A result with no solution data.
    #[must_use]
    pub fn empty(status: SolveStatus) -> SolveResult {
        SolveResult { status, assignment: None, statistics: None, elapsed_millis: 0, error_detail: None }
    }

    /// An `ERROR` result carrying `detail`.
    #[must_use]
    pub fn error(detail: impl Into<String>) -> SolveResult {
        SolveResult { error_detail: Some(detail.into()), ..SolveResult::empty(SolveStatus::Error) }
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.status.is_solved() && self.assignment.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_status_mapping() {
        assert_eq!(SolveStatus::from_engine("OPTIMAL_SOLUTION"), SolveStatus::Optimal);
        assert_eq!(SolveStatus::from_engine("optimal"), SolveStatus::Optimal);
        assert_eq!(SolveStatus::from_engine("SATISFIED"), SolveStatus::Satisfied);
        assert_eq!(SolveStatus::from_engine("ALL_SOLUTIONS"), SolveStatus::Satisfied);
        assert_eq!(SolveStatus::from_engine("UNSATISFIABLE"), SolveStatus::Unsatisfiable);
        assert_eq!(SolveStatus::from_engine("UNSAT_OR_UNBOUNDED"), SolveStatus::Unsatisfiable);
        assert_eq!(SolveStatus::from_engine("ERROR"), SolveStatus::Error);
        assert_eq!(SolveStatus::from_engine("UNBOUNDED"), SolveStatus::Unknown);
        assert_eq!(SolveStatus::from_engine("whatever"), SolveStatus::Unknown);
    }

    #[test]
    fn test_serialized_shape() {
        let result = SolveResult {
            status: SolveStatus::Optimal,
            assignment: Some(vec![0, 1]),
            statistics: None,
            elapsed_millis: 12,
            error_detail: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "OPTIMAL");
        assert_eq!(value["assignment"], serde_json::json!([0, 1]));
        assert_eq!(value["elapsedMillis"], 12);
        assert!(value["errorDetail"].is_null());
    }

    #[test]
    fn test_error_result() {
        let result = SolveResult::error("boom");
        assert_eq!(result.status, SolveStatus::Error);
        assert_eq!(result.error_detail.as_deref(), Some("boom"));
        assert!(!result.is_solved());
    }
}
