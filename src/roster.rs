//! `roster` — load a player roster from CSV text
//!
//! The expected input is a header row naming the columns, followed by one row per player:
//!
//! ```text
//! name,rating,position
//! Alice,8,forward
//! Bob,6,defense
//! ```
//!
//! The parsing logic:
//! - The first non-blank line is the header. It must contain `name` and `rating`;
//!   `position` is optional. Header names are case-insensitive and may come in any order.
//! - Blank lines are ignored.
//! - Rows whose rating does not parse as an integer are skipped silently.
//! - Ratings are documented as 1-10 but are passed through as-is.
//! - Missing or unrecognized positions become [`Position::Unknown`].
//!
//! Like the rest of the library this module never touches the filesystem unless we're on a
//! native build: [`parse_csv`] works everywhere, [`load_from_path`] is native-only.

use crate::errors::InputError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playing position of a [`Player`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Forward,
    Midfield,
    Defense,
    Unknown,
}

impl Position {
    /// Parse a position cell. Never fails: anything unrecognized is `Unknown`.
    #[must_use]
    pub fn parse(raw: &str) -> Position {
        match raw.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" | "f" | "striker" | "attack" | "attacker" => Position::Forward,
            "midfield" | "midfielder" | "mid" | "m" => Position::Midfield,
            "defense" | "defence" | "defender" | "def" | "d" | "back" => Position::Defense,
            _ => Position::Unknown,
        }
    }

    /// The integer the model files use for this position.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Position::Unknown => 0,
            Position::Forward => 1,
            Position::Midfield => 2,
            Position::Defense => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Forward => "forward",
            Position::Midfield => "midfield",
            Position::Defense => "defense",
            Position::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub rating: i64,
    pub position: Position,
}

/// Column indices resolved from the header row.
struct Columns {
    name: usize,
    rating: usize,
    position: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Result<Columns, InputError> {
        let cells: Vec<String> = split_row(header).into_iter().map(|c| c.to_ascii_lowercase()).collect();
        let find = |column: &'static str| cells.iter().position(|c| c == column);

        let name = find("name").ok_or_else(|| InputError::MissingColumn { column: "name", header: header.to_string() })?;
        let rating = find("rating").ok_or_else(|| InputError::MissingColumn { column: "rating", header: header.to_string() })?;

        Ok(Columns { name, rating, position: find("position") })
    }

    fn player(&self, line: &str) -> Option<Player> {
        let cells = split_row(line);
        let rating = cells.get(self.rating)?.parse::<i64>().ok()?;
        let name = cells.get(self.name)?.clone();
        let position = self
            .position
            .and_then(|i| cells.get(i))
            .map_or(Position::Unknown, |raw| Position::parse(raw));

        Some(Player { name, rating, position })
    }
}

/// Split one CSV row into trimmed cells.
///
/// Handles simple double quoting (`"Smith, J."`) and doubled quotes inside quoted cells.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    cells
}

/// Parse a roster from in-memory CSV text.
///
/// This is **WASM-safe**: pass it the contents of an uploaded file or a text area.
///
/// # Errors
///
/// - [`InputError::EmptyInput`] if there is no header row
/// - [`InputError::MissingColumn`] if the header lacks `name` or `rating`
/// - [`InputError::NotEnoughPlayers`] if fewer than two rows survive parsing
pub fn parse_csv(text: &str) -> Result<Vec<Player>, InputError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let header = lines.next().ok_or(InputError::EmptyInput)?;
    let columns = Columns::from_header(header.trim_start_matches('\u{feff}'))?;

    let mut skipped = 0usize;
    let players: Vec<Player> = lines
        .filter_map(|line| {
            let player = columns.player(line);
            if player.is_none() {
                skipped += 1;
            }
            player
        })
        .collect();

    if skipped > 0 {
        debug!("Skipped {skipped} roster row(s) without an integer rating");
    }

    if players.len() < 2 {
        return Err(InputError::NotEnoughPlayers { found: players.len() });
    }

    Ok(players)
}

/// Native-only convenience method: read a roster file and parse it.
///
/// # Errors
///
/// Will return [`InputError::Io`] if the file cannot be read, or any error of [`parse_csv`].
#[cfg(not(target_arch = "wasm32"))]
pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Vec<Player>, InputError> {
    let contents = std::fs::read_to_string(path)?;
    parse_csv(&contents)
}
