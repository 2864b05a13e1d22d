//! Scenario registry: which balance objective, and so which MiniZinc model, a solve uses.
//!
//! Models are compiled into the crate so both the CLI and the browser build can hand the
//! model text straight to an engine.

use crate::errors::InputError;
use serde::Serialize;

/// One balance objective and the model that implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: &'static str,
    pub model_file: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub model_text: &'static str,
}

static SCENARIOS: [Scenario; 3] = [
    Scenario {
        id: "ratings_only",
        model_file: "models/ratings_only.mzn",
        display_name: "Ratings only",
        description: "Balance the total rating of both teams.",
        model_text: include_str!("../models/ratings_only.mzn"),
    },
    Scenario {
        id: "ratings_and_positions",
        model_file: "models/ratings_and_positions.mzn",
        display_name: "Ratings and positions",
        description: "Balance the total rating while splitting each position's head count evenly.",
        model_text: include_str!("../models/ratings_and_positions.mzn"),
    },
    Scenario {
        id: "ratings_per_position",
        model_file: "models/ratings_per_position.mzn",
        display_name: "Ratings per position",
        description: "Balance the rating sum within each position.",
        model_text: include_str!("../models/ratings_per_position.mzn"),
    },
];

/// The scenario used when a front-end does not name one.
pub const DEFAULT_SCENARIO: &str = "ratings_only";

/// Look up a scenario by id.
///
/// # Errors
///
/// Returns [`InputError::UnknownScenario`] if no scenario has this id.
pub fn get(id: &str) -> Result<&'static Scenario, InputError> {
    SCENARIOS
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| InputError::UnknownScenario { id: id.to_string() })
}

/// Every registered scenario, in display order.
#[must_use]
pub fn all() -> &'static [Scenario] {
    &SCENARIOS
}
