use crate::capability::FallbackPolicy;
use crate::context::ExecutionContext;
use crate::engine::browser::{BrowserConfig, BrowserEngine};
use crate::log::init_logger;
use crate::pipeline::{handle_request, SolveRequest};
use crate::scenario;
use crate::session::{Session, SessionError};
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

/// Structured error information for JavaScript consumers
#[derive(serde::Serialize)]
struct WasmError {
    /// Error code (e.g., "S002", "I003")
    code: String,
    /// Display message
    message: String,
    /// Short description of error type
    description: String,
    /// Detailed explanation
    details: String,
    /// Optional helpful suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<String>,
}

impl From<SessionError> for WasmError {
    fn from(e: SessionError) -> Self {
        // For Input, surface the InputError itself
        match &e {
            SessionError::Input(ie) => WasmError {
                code: ie.code().to_string(),
                message: ie.to_string(),
                description: ie.description().to_string(),
                details: ie.details().to_string(),
                help: ie.help().map(str::to_string),
            },
            _ => WasmError {
                code: e.code().to_string(),
                message: e.to_string(),
                description: e.description().to_string(),
                details: e.details().to_string(),
                help: e.help().map(str::to_string),
            },
        }
    }
}

impl From<WasmError> for JsValue {
    fn from(e: WasmError) -> Self {
        let mut msg = format!("Error {}: {}", e.code, e.message);

        if !e.details.is_empty() {
            msg.push_str(&format!("\n\n{}", e.details));
        }

        if let Some(help) = e.help {
            msg.push_str(&format!("\n\nSuggestion: {help}"));
        }

        js_sys::Error::new(&msg).into()
    }
}

fn busy() -> WasmError {
    WasmError {
        code: "WASM001".to_string(),
        message: "a solve is already in progress".to_string(),
        description: "Session busy".to_string(),
        details: "The browser engine runs one solve at a time and has no queue.".to_string(),
        help: Some("Wait for the pending solve to settle before starting another".to_string()),
    }
}

fn bad_argument(what: &str, e: impl std::fmt::Display) -> WasmError {
    WasmError {
        code: "WASM002".to_string(),
        message: format!("{what}: {e}"),
        description: "Invalid argument".to_string(),
        details: "An argument passed from JavaScript does not have the expected shape.".to_string(),
        help: Some("Pass a plain object with camelCase fields, e.g. { solverId, scenarioId, csvText }".to_string()),
    }
}

fn serialization_failed(e: impl std::fmt::Display) -> WasmError {
    WasmError {
        code: "WASM003".to_string(),
        message: format!("serialization failed: {e}"),
        description: "Failed to serialize result".to_string(),
        details: "The result could not be converted to JavaScript format.".to_string(),
        help: Some("This is an internal error. Please report this issue.".to_string()),
    }
}

enum Slot {
    Vacant,
    Parked(Session<BrowserEngine>),
    InUse,
}

thread_local! {
    static SESSION: RefCell<Slot> = const { RefCell::new(Slot::Vacant) };
}

/// The page's session, taken out of its slot while an async call uses it and put back on drop.
struct Checkout(Option<Session<BrowserEngine>>);

impl Checkout {
    fn take() -> Result<Checkout, WasmError> {
        SESSION.with(|slot| {
            let mut slot = slot.borrow_mut();
            match std::mem::replace(&mut *slot, Slot::InUse) {
                Slot::Parked(session) => Ok(Checkout(Some(session))),
                Slot::Vacant => Ok(Checkout(Some(Session::new(ExecutionContext::detect())))),
                Slot::InUse => Err(busy()),
            }
        })
    }

    fn session(&mut self) -> Result<&mut Session<BrowserEngine>, WasmError> {
        self.0.as_mut().ok_or_else(busy)
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        if let Some(session) = self.0.take() {
            SESSION.with(|slot| *slot.borrow_mut() = Slot::Parked(session));
        }
    }
}

/// Initialize logging with the specified debug setting.
///
/// # Arguments
/// * `debug_enabled` - If true, use Debug log level; if false, use Info log level
///
/// This function must be called from JavaScript after the WASM module loads.
#[wasm_bindgen]
pub fn initialize(debug_enabled: bool) {
    console_error_panic_hook::set_once();
    init_logger(debug_enabled);

    log::info!("WASM module initialized ({} context)", ExecutionContext::detect());
    if !debug_enabled {
        log::info!("Debug logging disabled");
    }
}

/// Load the MiniZinc browser engine. `config` is optional: `{ workerURL?, wasmURL?, dataURL? }`.
///
/// Safe to call again; a ready engine is kept.
#[wasm_bindgen(js_name = initSolver)]
pub async fn init_solver(config: JsValue) -> Result<(), JsValue> {
    let config: BrowserConfig = if config.is_undefined() || config.is_null() {
        BrowserConfig::default()
    } else {
        browser_config(config)?
    };

    let mut checkout = Checkout::take()?;
    checkout.session()?.init(config).await.map_err(WasmError::from)?;
    Ok(())
}

fn browser_config(value: JsValue) -> Result<BrowserConfig, WasmError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| bad_argument("invalid engine config", e))
}

/// JS entry: `solveRoster({ solverId, scenarioId, csvText, timeLimitMillis?, collectAllSolutions? }, fallbackToDefault)`
/// resolves to `{ status, solution, teams, elapsedMillis, statistics, errorDetail }`.
///
/// Rejects for input problems, an unavailable solver (unless `fallback_to_default`), an engine
/// that was never initialized, or a solve already in flight.
#[wasm_bindgen(js_name = solveRoster)]
pub async fn solve_roster(request: JsValue, fallback_to_default: bool) -> Result<JsValue, JsValue> {
    let request: SolveRequest =
        serde_wasm_bindgen::from_value(request).map_err(|e| bad_argument("invalid solve request", e))?;
    let policy = if fallback_to_default { FallbackPolicy::UseDefault } else { FallbackPolicy::Reject };

    let mut checkout = Checkout::take()?;
    let response = handle_request(checkout.session()?, &request, policy).await.map_err(WasmError::from)?;
    drop(checkout);

    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    serde::Serialize::serialize(&response, &serializer).map_err(|e| serialization_failed(e).into())
}

/// Scenario metadata (`id`, `modelFile`, `displayName`, `description`) for building a picker.
#[wasm_bindgen(js_name = listScenarios)]
pub fn list_scenarios() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(scenario::all()).map_err(|e| serialization_failed(e).into())
}

/// Solver ids the current context can run, default first.
#[wasm_bindgen(js_name = availableSolvers)]
pub fn available_solvers() -> Vec<String> {
    let capabilities = crate::capability::capabilities_for(ExecutionContext::detect());
    let mut ids = vec![capabilities.default.to_string()];
    ids.extend(capabilities.available.iter().filter(|&&id| id != capabilities.default).map(|id| id.to_string()));
    ids
}

/// Generate a debug report for troubleshooting.
///
/// Users can copy/paste it when reporting issues. It includes the error message, the request
/// that failed, and environment information.
#[wasm_bindgen]
pub fn get_debug_info(scenario_id: &str, solver_id: &str, error_message: &str, player_count: usize) -> String {
    use std::fmt::Write;
    let mut report = String::new();

    // NB: writing to a String never fails
    let _ = writeln!(&mut report, "=== TEAMSPLIT DEBUG REPORT ===");
    let _ = writeln!(&mut report, "Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH_FULL"));
    let _ = writeln!(&mut report, "Generated: {}", js_sys::Date::new_0().to_iso_string().as_string().unwrap_or_else(|| "unknown".to_string()));
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Error");
    let _ = writeln!(&mut report, "{error_message}");
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Request");
    let _ = writeln!(&mut report, "Scenario: {scenario_id}");
    let _ = writeln!(&mut report, "Solver: {solver_id}");
    let _ = writeln!(&mut report, "Players: {player_count}");
    let _ = writeln!(&mut report, "Context: {}", ExecutionContext::detect());
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "## Environment");
    if let Some(window) = web_sys::window() {
        if let Ok(user_agent) = window.navigator().user_agent() {
            let _ = writeln!(&mut report, "User Agent: {user_agent}");
        }
        let _ = writeln!(&mut report, "Location: {}", window.location().href().unwrap_or_else(|_| "unknown".to_string()));
    }
    let _ = writeln!(&mut report);

    let _ = writeln!(&mut report, "=== END DEBUG REPORT ===");

    report
}
