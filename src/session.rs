//! Solver session: the one way to run a model, whichever engine sits underneath.
//!
//! A [`Session`] owns one engine handle and walks it through
//! `Uninitialized -> Initializing -> Ready -> (Solving -> Ready)* -> Closed`.
//!
//! # Error Handling
//!
//! The session uses [`SessionError`] for the problems a caller has to fix:
//!
//! - S001: `Initialization` (Engine unreachable or failed to load)
//! - S002: `UnsupportedSolver` (Solver id not available in this execution context)
//! - S003: `NotReady` (Solve attempted before `init` or after `close`)
//! - S004: `Input` (Roster or scenario rejected (wraps [`InputError`]))
//!
//! Everything that goes wrong *during* a solve (engine errors, timeouts, unreadable
//! responses) is folded into the returned [`SolveResult`] instead, so a front-end always has
//! something to show.
//!
//! # Examples
//!
//! ```no_run
//! # #[cfg(not(target_arch = "wasm32"))]
//! # async fn demo() -> Result<(), teamsplit::session::SessionError> {
//! use teamsplit::context::ExecutionContext;
//! use teamsplit::engine::native::{NativeConfig, NativeEngine};
//! use teamsplit::payload::ModelPayload;
//! use teamsplit::session::{Session, SolverConfig};
//! use teamsplit::{roster, scenario};
//!
//! let players = roster::parse_csv("name,rating\nAlice,8\nBob,6")?;
//! let scenario = scenario::get("ratings_only")?;
//!
//! let mut session = Session::<NativeEngine>::new(ExecutionContext::Native);
//! session.init(NativeConfig::default()).await?;
//!
//! let config = SolverConfig::for_context(ExecutionContext::Native);
//! let result = session.solve(scenario.model_text, &ModelPayload::from_players(&players), &config).await?;
//! println!("{}: {:?}", result.status, result.assignment);
//! # Ok(())
//! # }
//! ```

use crate::capability::{capabilities_for, Capabilities};
use crate::context::ExecutionContext;
use crate::engine::{self, Engine, EngineRequest};
use crate::errors::InputError;
use crate::normalize::normalize;
use crate::payload::ModelPayload;
use crate::result::{SolveResult, SolveStatus};
use futures_util::future::{select, Either};
use futures_util::pin_mut;
use instant::Instant;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Time limit used when the caller does not give one.
pub const DEFAULT_TIME_LIMIT_MILLIS: u64 = 10_000;
/// Headroom the engine gets past its own time limit before the session gives up on it.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Solving,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Solving => "solving",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Per-solve options chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    pub solver_id: String,
    pub time_limit_millis: u64,
    pub collect_all_solutions: bool,
}

impl SolverConfig {
    /// The context's default solver with the default time limit.
    #[must_use]
    pub fn for_context(context: ExecutionContext) -> SolverConfig {
        SolverConfig {
            solver_id: capabilities_for(context).default.to_string(),
            time_limit_millis: DEFAULT_TIME_LIMIT_MILLIS,
            collect_all_solutions: false,
        }
    }

    #[must_use]
    pub fn with_solver(solver_id: impl Into<String>) -> SolverConfig {
        SolverConfig { solver_id: solver_id.into(), time_limit_millis: DEFAULT_TIME_LIMIT_MILLIS, collect_all_solutions: false }
    }
}

/// Errors a caller has to act on. Solve-time failures are reported in the result instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The engine could not be reached or loaded. The session stays uninitialized.
    #[error("{context} solver engine failed to initialize: {detail}")]
    Initialization { context: ExecutionContext, detail: String },

    /// The solver id is not in the context's capability set. Nothing was sent to the engine.
    #[error("solver '{solver}' is not available in the {context} context (available: {available})")]
    UnsupportedSolver { solver: String, context: ExecutionContext, available: String },

    /// `solve` was called outside the `Ready` state.
    #[error("session is {state}; a solve needs a ready session")]
    NotReady { state: SessionState },

    /// The request itself was rejected before reaching the session.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
}

impl SessionError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Initialization { .. } => "S001",
            SessionError::UnsupportedSolver { .. } => "S002",
            SessionError::NotReady { .. } => "S003",
            SessionError::Input(_) => "S004",
        }
    }

    /// Returns a short description of this error type (for documentation)
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            SessionError::Initialization { .. } => "Solver engine unreachable or failed to load",
            SessionError::UnsupportedSolver { .. } => "Solver not available in this execution context",
            SessionError::NotReady { .. } => "Session is not ready to solve",
            SessionError::Input(_) => "Roster or scenario rejected",
        }
    }

    /// Returns detailed explanation of this error type (for documentation)
    #[must_use]
    pub fn details(&self) -> &'static str {
        match self {
            SessionError::Initialization { .. } => "Natively, the `minizinc` executable could not be run with `--version`. In the browser, the MiniZinc JavaScript bundle is missing or its WebAssembly assets failed to load. The session stays uninitialized, so `init` can be retried with a corrected configuration.",
            SessionError::UnsupportedSolver { .. } => "Each execution context can run a fixed set of solver backends: natively cbc, coinbc, cp-sat and chuffed; in the browser gecode, chuffed and cbc. The request was rejected before the engine was started.",
            SessionError::NotReady { .. } => "A solve can only run on an initialized session that has not been closed.",
            SessionError::Input(_) => "The request was rejected before any solver ran. This wraps an underlying InputError (see Input Errors section for specific error codes).",
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            SessionError::Initialization { .. } => Some("Install MiniZinc and put `minizinc` on PATH, or pass its location with --minizinc"),
            SessionError::UnsupportedSolver { .. } => Some("Pick one of the available solvers, or opt into falling back to the default solver"),
            SessionError::NotReady { .. } => Some("Call init() before solving, and don't reuse a closed session"),
            SessionError::Input(_) => None, // InputError has its own help
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        match self {
            SessionError::Input(ie) => {
                // delegate to InputError's detailed display
                format!("{}\n  caused by: {}", self.code(), ie.display_detailed())
            }
            _ => crate::errors::format_error_with_code_and_help(&self.to_string(), self.code(), self.help()),
        }
    }
}

/// Holds a session in a transient state and puts it back to `fallback` when dropped,
/// including when the surrounding future is dropped mid-await.
struct Transition<'a> {
    state: &'a mut SessionState,
    fallback: SessionState,
}

impl<'a> Transition<'a> {
    fn enter(state: &'a mut SessionState, during: SessionState, fallback: SessionState) -> Self {
        debug!("Session {state} -> {during}");
        *state = during;
        Transition { state, fallback }
    }

    fn finish(mut self, next: SessionState) {
        self.fallback = next;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        debug!("Session {} -> {}", self.state, self.fallback);
        *self.state = self.fallback;
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Owner of one solver engine.
pub struct Session<E: Engine> {
    context: ExecutionContext,
    capabilities: Capabilities,
    state: SessionState,
    engine: Option<E>,
    grace: Duration,
}

impl<E: Engine> Session<E> {
    /// A new, uninitialized session for `context`.
    #[must_use]
    pub fn new(context: ExecutionContext) -> Self {
        Session {
            context,
            capabilities: capabilities_for(context),
            state: SessionState::Uninitialized,
            engine: None,
            grace: DEFAULT_GRACE,
        }
    }

    /// Change how long past its time limit the engine may run before the session gives up.
    #[must_use]
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.context
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Load the engine. A no-op on a session that is already ready.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Initialization`] if the engine cannot be loaded; the session stays
    ///   `Uninitialized` and `init` may be called again
    /// - [`SessionError::NotReady`] on a closed session
    pub async fn init(&mut self, config: E::Config) -> Result<(), SessionError> {
        match self.state {
            SessionState::Ready => {
                debug!("Session already initialized");
                return Ok(());
            }
            SessionState::Uninitialized => {}
            state => return Err(SessionError::NotReady { state }),
        }

        let transition = Transition::enter(&mut self.state, SessionState::Initializing, SessionState::Uninitialized);
        match E::load(config).await {
            Ok(engine) => {
                self.engine = Some(engine);
                transition.finish(SessionState::Ready);
                info!("{} solver session ready", self.context);
                Ok(())
            }
            Err(failure) => {
                warn!("{} solver engine failed to initialize: {failure}", self.context);
                Err(SessionError::Initialization { context: self.context, detail: failure.detail })
            }
        }
    }

    /// Run `model_text` on `payload` with the options in `config`.
    ///
    /// The engine is never started for a solver id outside the capability set. Once it is
    /// started, every outcome is an `Ok`: engine failures become `ERROR` results, timeouts and
    /// unreadable responses become `UNKNOWN` results. The session is `Ready` again afterwards,
    /// also when this future is dropped before it completes.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotReady`] if the session is not `Ready`
    /// - [`SessionError::UnsupportedSolver`] if `config.solver_id` is not available
    pub async fn solve(&mut self, model_text: &str, payload: &ModelPayload, config: &SolverConfig) -> Result<SolveResult, SessionError> {
        let engine = match (self.state, self.engine.as_ref()) {
            (SessionState::Ready, Some(engine)) => engine,
            (state, _) => return Err(SessionError::NotReady { state }),
        };

        if !self.capabilities.supports(&config.solver_id) {
            warn!("Rejected solver '{}' in the {} context", config.solver_id, self.context);
            return Err(self.capabilities.unsupported(&config.solver_id));
        }

        let _transition = Transition::enter(&mut self.state, SessionState::Solving, SessionState::Ready);

        let time_limit = Duration::from_millis(config.time_limit_millis);
        let request = EngineRequest {
            model_text,
            payload,
            solver_id: &config.solver_id,
            time_limit,
            collect_all_solutions: config.collect_all_solutions,
            statistics: true,
        };
        info!(
            "Solving for {} players with '{}' ({} ms limit)",
            payload.player_count, config.solver_id, config.time_limit_millis
        );

        let started = Instant::now();
        let run = engine.run(&request);
        let deadline = engine::sleep(time_limit + self.grace);
        pin_mut!(run, deadline);
        let outcome = match select(run, deadline).await {
            Either::Left((outcome, _)) => Some(outcome),
            Either::Right(((), _)) => None,
        };
        let elapsed_millis = millis(started.elapsed());

        let result = match outcome {
            None => {
                warn!("No result from the engine within {elapsed_millis} ms");
                SolveResult {
                    elapsed_millis,
                    error_detail: Some(format!("no result from the engine within {} ms", config.time_limit_millis)),
                    ..SolveResult::empty(SolveStatus::Unknown)
                }
            }
            Some(Err(failure)) => {
                warn!("Engine failure: {failure}");
                SolveResult { elapsed_millis, ..SolveResult::error(failure.detail) }
            }
            Some(Ok(raw)) => check_alignment(SolveResult { elapsed_millis, ..normalize(&raw) }, payload.player_count),
        };

        info!("Solve finished: {} in {} ms", result.status, result.elapsed_millis);
        Ok(result)
    }

    /// Release the engine. The session cannot be used afterwards.
    pub fn close(&mut self) {
        self.engine = None;
        self.state = SessionState::Closed;
        debug!("Session closed");
    }
}

/// An assignment that does not cover exactly the roster means the model broke the output
/// contract; report it rather than hand out a split that silently drops or invents players.
fn check_alignment(result: SolveResult, player_count: usize) -> SolveResult {
    match &result.assignment {
        Some(assignment) if assignment.len() != player_count => {
            warn!("Assignment has {} entries for {player_count} players", assignment.len());
            SolveResult {
                statistics: result.statistics,
                elapsed_millis: result.elapsed_millis,
                ..SolveResult::error(format!(
                    "model returned an assignment for {} players, roster has {player_count}",
                    assignment.len()
                ))
            }
        }
        _ => result,
    }
}
