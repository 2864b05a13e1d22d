//! Model data builder: turns parsed players into the parameters every scenario model declares.
//!
//! The three arrays of a model run are index-aligned with the player list: entry `i` of
//! `ratings` and `position_indices` (and of the solver's `team` output) all describe player
//! `i`. Nothing here reorders, filters or deduplicates players.

use crate::roster::Player;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write;

/// Parameters handed to a solver engine alongside the model text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPayload {
    pub player_count: usize,
    pub ratings: Vec<i64>,
    pub position_codes: Vec<i64>,
}

impl ModelPayload {
    /// Build the payload for `players`, preserving their order.
    #[must_use]
    pub fn from_players(players: &[Player]) -> ModelPayload {
        ModelPayload {
            player_count: players.len(),
            ratings: players.iter().map(|p| p.rating).collect(),
            position_codes: players.iter().map(|p| p.position.code()).collect(),
        }
    }

    /// MiniZinc data (`.dzn`) text, as passed to the native executable with `--cmdline-data`.
    #[must_use]
    pub fn to_dzn(&self) -> String {
        let mut dzn = String::new();
        // NB: writing to a String never fails
        let _ = write!(dzn, "num_players = {}; ", self.player_count);
        let _ = write!(dzn, "ratings = {}; ", dzn_array(&self.ratings));
        let _ = write!(dzn, "position_indices = {};", dzn_array(&self.position_codes));
        dzn
    }

    /// MiniZinc JSON data object, as passed to the browser engine with `addJson`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "num_players": self.player_count,
            "ratings": self.ratings,
            "position_indices": self.position_codes,
        })
    }
}

fn dzn_array(values: &[i64]) -> String {
    let items: Vec<String> = values.iter().map(i64::to_string).collect();
    format!("[{}]", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::parse_csv;

    fn sample() -> ModelPayload {
        let players = parse_csv("name,rating,position\nAlice,8,forward\nBob,6,defense\nCharlie,7,midfield\nDiana,9,forward").unwrap();
        ModelPayload::from_players(&players)
    }

    #[test]
    fn test_payload_from_players() {
        let payload = sample();
        assert_eq!(payload.player_count, 4);
        assert_eq!(payload.ratings, vec![8, 6, 7, 9]);
        assert_eq!(payload.position_codes, vec![1, 3, 2, 1]);
    }

    #[test]
    fn test_arrays_stay_aligned_with_players() {
        let players = parse_csv("name,rating,position\nA,1,d\nB,x,f\nC,3\nD,4,mid\nE,5,keeper").unwrap();
        let payload = ModelPayload::from_players(&players);
        assert_eq!(players.len(), payload.player_count);
        assert_eq!(payload.ratings.len(), payload.player_count);
        assert_eq!(payload.position_codes.len(), payload.player_count);
        for (i, player) in players.iter().enumerate() {
            assert_eq!(payload.ratings[i], player.rating);
            assert_eq!(payload.position_codes[i], player.position.code());
        }
    }

    #[test]
    fn test_dzn_rendering() {
        assert_eq!(
            sample().to_dzn(),
            "num_players = 4; ratings = [8, 6, 7, 9]; position_indices = [1, 3, 2, 1];"
        );
    }

    #[test]
    fn test_json_rendering_uses_model_parameter_names() {
        let data = sample().to_json();
        assert_eq!(data["num_players"], 4);
        assert_eq!(data["ratings"], json!([8, 6, 7, 9]));
        assert_eq!(data["position_indices"], json!([1, 3, 2, 1]));
    }
}
