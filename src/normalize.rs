//! Result normalizer: one canonical [`SolveResult`] out of whatever an engine client returned.
//!
//! The native executable and the browser build do not agree on a response schema, and both
//! have moved solution data around between releases. Depending on the engine the assignment
//! may sit in a structured field, several levels down, or inside a JSON document embedded in
//! the solution's output text. The normalizer only *extracts*; it never computes anything
//! from the solution, and it never fails.
//!
//! # Precedence
//!
//! 1. An embedded JSON block in the output text (`output`, or `solution.output.default` /
//!    `solution.output.raw`) is parsed if present. Parse failures are ignored.
//! 2. Status: embedded `status`, direct `status`, `solution.status`, `OPTIMAL` when an
//!    embedded block parsed, otherwise `UNKNOWN`.
//! 3. Solution: embedded `solution` (or the embedded block itself), `solution.output.json`,
//!    `solution.solution`, top-level `solution`.
//! 4. Statistics: embedded `statistics`, direct `statistics`, `solution.statistics`.
//!
//! A solved status without a readable 0/1 assignment is downgraded to `UNKNOWN`.

use crate::result::{SolveResult, SolveStatus, Statistics};
use log::debug;
use serde_json::{json, Map, Value};

/// Keys an assignment array may be stored under inside a solution object.
const ASSIGNMENT_KEYS: [&str; 3] = ["assignment", "team", "teams"];

/// Fields that may hold the solver's output text.
const OUTPUT_TEXT_PATHS: [&[&str]; 3] = [&["output"], &["solution", "output", "default"], &["solution", "output", "raw"]];

/// Top-level keys that mark a JSON text as a whole response rather than the model's output.
const RESPONSE_KEYS: [&str; 3] = ["status", "solution", "output"];

/// A response exactly as an engine client produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Events of the native `--json-stream` output, in emission order.
    Stream(Vec<Value>),
    /// A single response object (the browser client, or a caller-wrapped result).
    Object(Value),
    /// Plain output text.
    Text(String),
}

impl From<&SolveResult> for RawResponse {
    /// Wrap a canonical result so it reads like a structured engine response.
    fn from(result: &SolveResult) -> Self {
        RawResponse::Object(json!({
            "status": result.status.as_str(),
            "solution": { "assignment": result.assignment },
            "statistics": result.statistics,
            "elapsedMillis": result.elapsed_millis,
            "errorDetail": result.error_detail,
        }))
    }
}

/// The shapes the normalizer knows how to read.
enum Shape {
    Fields(Map<String, Value>),
    Unrecognized,
}

impl Shape {
    fn of(raw: &RawResponse) -> Shape {
        match raw {
            RawResponse::Stream(events) => Shape::Fields(fold_stream(events)),
            RawResponse::Object(Value::Object(map)) => Shape::Fields(map.clone()),
            RawResponse::Object(_) => Shape::Unrecognized,
            RawResponse::Text(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) if RESPONSE_KEYS.iter().any(|key| map.contains_key(*key)) => Shape::Fields(map),
                _ => {
                    let mut map = Map::new();
                    map.insert("output".to_string(), Value::String(text.clone()));
                    Shape::Fields(map)
                }
            },
        }
    }
}

/// Collapse `--json-stream` events into one response object:
/// last solution, last status, merged statistics, all error messages.
fn fold_stream(events: &[Value]) -> Map<String, Value> {
    let mut solution = None;
    let mut status = None;
    let mut statistics = Map::new();
    let mut errors = Vec::new();

    for event in events {
        match event.get("type").and_then(Value::as_str) {
            Some("solution") => solution = Some(event.clone()),
            Some("status") => status = event.get("status").cloned(),
            Some("statistics") => {
                if let Some(Value::Object(stats)) = event.get("statistics") {
                    statistics.extend(stats.clone());
                }
            }
            Some("error") => {
                let message = event
                    .get("message")
                    .or_else(|| event.get("what"))
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified engine error");
                errors.push(message.to_string());
            }
            Some("warning") => debug!("Engine warning: {}", event.get("message").unwrap_or(&Value::Null)),
            _ => {}
        }
    }

    let mut fields = Map::new();
    if let Some(solution) = solution {
        fields.insert("solution".to_string(), solution);
    }
    if !statistics.is_empty() {
        fields.insert("statistics".to_string(), Value::Object(statistics));
    }
    if !errors.is_empty() {
        fields.insert("error".to_string(), Value::String(errors.join("; ")));
        status.get_or_insert_with(|| Value::String("ERROR".to_string()));
    }
    if let Some(status) = status {
        fields.insert("status".to_string(), status);
    }
    fields
}

/// Result of reading an assignment out of a solution value.
enum Assignment {
    Missing,
    Valid(Vec<u8>),
    Invalid,
}

fn read_assignment(value: &Value) -> Assignment {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Bool(b) => Some(u8::from(*b)),
                _ => item.as_u64().filter(|&v| v <= 1).and_then(|v| u8::try_from(v).ok()),
            })
            .collect::<Option<Vec<u8>>>()
            .map_or(Assignment::Invalid, Assignment::Valid),
        Value::Object(map) => ASSIGNMENT_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map_or(Assignment::Missing, read_assignment),
        Value::Null => Assignment::Missing,
        _ => Assignment::Invalid,
    }
}

/// Parse the span between the first `{` and the last `}` of `text`.
fn parse_embedded(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            debug!("Ignoring unparsable JSON block in engine output: {e}");
            None
        }
    }
}

/// Walk `path` below `root`, treating missing or null fields as absent.
fn at<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut value = root.get(*first)?;
    for key in rest {
        value = value.get(*key)?;
    }
    (!value.is_null()).then_some(value)
}

fn numeric_entries(value: &Value) -> Option<Statistics> {
    let stats: Statistics = value
        .as_object()?
        .iter()
        .filter_map(|(key, v)| v.as_f64().map(|n| (key.clone(), n)))
        .collect();
    (!stats.is_empty()).then_some(stats)
}

/// Normalize a raw engine response. Total: unknown shapes come back as `UNKNOWN`.
#[must_use]
pub fn normalize(raw: &RawResponse) -> SolveResult {
    let fields = match Shape::of(raw) {
        Shape::Fields(fields) => fields,
        Shape::Unrecognized => {
            debug!("Unrecognized engine response shape");
            return SolveResult::empty(SolveStatus::Unknown);
        }
    };

    // 1. embedded JSON block
    let embedded = OUTPUT_TEXT_PATHS
        .iter()
        .find_map(|path| at(&fields, path).and_then(Value::as_str))
        .and_then(parse_embedded);
    let from_embedded = |key: &str| embedded.as_ref().and_then(|e| e.get(key)).filter(|v| !v.is_null());

    // 2. status
    let status = from_embedded("status")
        .and_then(Value::as_str)
        .or_else(|| at(&fields, &["status"]).and_then(Value::as_str))
        .or_else(|| at(&fields, &["solution", "status"]).and_then(Value::as_str))
        .or_else(|| embedded.as_ref().map(|_| "OPTIMAL"))
        .map_or(SolveStatus::Unknown, SolveStatus::from_engine);

    // 3. solution
    let embedded_solution = embedded
        .as_ref()
        .map(|e| e.get("solution").filter(|v| !v.is_null()).cloned().unwrap_or_else(|| Value::Object(e.clone())));
    let solution = embedded_solution
        .as_ref()
        .or_else(|| at(&fields, &["solution", "output", "json"]))
        .or_else(|| at(&fields, &["solution", "solution"]))
        .or_else(|| at(&fields, &["solution"]));

    // 4. statistics
    let statistics = from_embedded("statistics")
        .or_else(|| at(&fields, &["statistics"]))
        .or_else(|| at(&fields, &["solution", "statistics"]))
        .and_then(numeric_entries);

    let elapsed_millis = from_embedded("elapsedMillis")
        .or_else(|| at(&fields, &["elapsedMillis"]))
        .or_else(|| at(&fields, &["solution", "time"]))
        .and_then(Value::as_f64)
        .map_or(0, |ms| ms.max(0.0).round() as u64);

    let error_detail = ["errorDetail", "error", "message"]
        .into_iter()
        .find_map(|key| from_embedded(key).or_else(|| at(&fields, &[key])).and_then(Value::as_str))
        .map(str::to_string);

    let assignment = solution.map_or(Assignment::Missing, read_assignment);
    let (status, assignment) = match (status.is_solved(), assignment) {
        (true, Assignment::Valid(teams)) => (status, Some(teams)),
        (true, Assignment::Missing) => {
            debug!("Engine reported {status} but no assignment was found; downgrading to UNKNOWN");
            (SolveStatus::Unknown, None)
        }
        (true, Assignment::Invalid) => {
            debug!("Engine reported {status} with an assignment that is not all 0/1; downgrading to UNKNOWN");
            (SolveStatus::Unknown, None)
        }
        (false, _) => (status, None),
    };

    let error_detail = match (status, error_detail) {
        (SolveStatus::Error, None) => Some("engine reported an error without a message".to_string()),
        (_, detail) => detail,
    };

    SolveResult { status, assignment, statistics, elapsed_millis, error_detail }
}
