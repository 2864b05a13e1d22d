//! Request handling shared by every front-end: CSV in, teams out.

use crate::capability::FallbackPolicy;
use crate::engine::Engine;
use crate::payload::ModelPayload;
use crate::result::{SolveResult, SolveStatus, Statistics};
use crate::roster;
use crate::scenario;
use crate::session::{Session, SessionError, SolverConfig, DEFAULT_TIME_LIMIT_MILLIS};
use crate::teams::TeamSplit;
use log::debug;
use serde::{Deserialize, Serialize};

/// A solve request as a front-end sends it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub solver_id: String,
    pub scenario_id: String,
    pub csv_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_millis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_all_solutions: Option<bool>,
}

/// What a front-end gets back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: SolveStatus,
    /// Present whenever the result carries an assignment.
    pub solution: Option<SolveResult>,
    pub teams: Option<TeamSplit>,
    pub elapsed_millis: u64,
    pub statistics: Option<Statistics>,
    pub error_detail: Option<String>,
}

impl SolveResponse {
    fn new(result: SolveResult, teams: Option<TeamSplit>) -> SolveResponse {
        SolveResponse {
            status: result.status,
            elapsed_millis: result.elapsed_millis,
            statistics: result.statistics.clone(),
            error_detail: result.error_detail.clone(),
            solution: result.assignment.is_some().then_some(result),
            teams,
        }
    }
}

/// Parse, look up, check, solve, and pair the assignment with the roster.
///
/// Input problems are reported before the session is touched. `policy` decides what
/// happens to a solver id the session's context cannot run.
///
/// # Errors
///
/// - [`SessionError::Input`] for an unreadable roster or an unknown scenario
/// - [`SessionError::UnsupportedSolver`] when `policy` rejects the solver id
/// - [`SessionError::NotReady`] when the session has not been initialized
pub async fn handle_request<E: Engine>(
    session: &mut Session<E>,
    request: &SolveRequest,
    policy: FallbackPolicy,
) -> Result<SolveResponse, SessionError> {
    let players = roster::parse_csv(&request.csv_text)?;
    let scenario = scenario::get(&request.scenario_id)?;
    debug!("Scenario '{}' with {} players", scenario.id, players.len());

    let solver_id = session.capabilities().resolve(&request.solver_id, policy)?;

    let config = SolverConfig {
        solver_id: solver_id.to_string(),
        time_limit_millis: request.time_limit_millis.unwrap_or(DEFAULT_TIME_LIMIT_MILLIS),
        collect_all_solutions: request.collect_all_solutions.unwrap_or(false),
    };
    let payload = ModelPayload::from_players(&players);
    let result = session.solve(scenario.model_text, &payload, &config).await?;

    let teams = if result.is_solved() {
        result.assignment.as_deref().and_then(|assignment| TeamSplit::from_assignment(&players, assignment))
    } else {
        None
    };
    Ok(SolveResponse::new(result, teams))
}
