//! Error types for roster input and scenario selection, with error codes and helpful messages.
//!
//! # Error Codes
//!
//! Each error variant has a unique code (I001-I005) for documentation lookup:
//!
//! - I001: `EmptyInput` (Roster text is empty)
//! - I002: `MissingColumn` (Header row lacks a required column)
//! - I003: `NotEnoughPlayers` (Fewer than two usable player rows)
//! - I004: `UnknownScenario` (Scenario id not in the registry)
//! - I005: `Io` (Roster file could not be read)
//!
//! Input errors are always reported before anything reaches a solver engine.
//!
//! # Examples
//!
//! ```
//! use teamsplit::errors::InputError;
//! use teamsplit::roster;
//!
//! match roster::parse_csv("") {
//!     Err(e) => {
//!         assert_eq!(e.code(), "I001");
//!         println!("{}", e.display_detailed());
//!     }
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::io;

/// Everything that can be wrong with a solve request before a solver sees it.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Roster is empty")]
    EmptyInput,

    #[error("Roster header is missing the \"{column}\" column (header was \"{header}\")")]
    MissingColumn { column: &'static str, header: String },

    #[error("Roster has {found} usable player(s); at least 2 are needed to form two teams")]
    NotEnoughPlayers { found: usize },

    #[error("Unknown scenario \"{id}\"")]
    UnknownScenario { id: String },

    #[error("Could not read roster: {0}")]
    Io(#[from] io::Error),
}

impl InputError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            InputError::EmptyInput => "I001",
            InputError::MissingColumn { .. } => "I002",
            InputError::NotEnoughPlayers { .. } => "I003",
            InputError::UnknownScenario { .. } => "I004",
            InputError::Io(_) => "I005",
        }
    }

    /// Returns a short description of this error type (for documentation)
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            InputError::EmptyInput => "Roster text is empty",
            InputError::MissingColumn { .. } => "Header row lacks a required column",
            InputError::NotEnoughPlayers { .. } => "Too few usable player rows",
            InputError::UnknownScenario { .. } => "Scenario id not in the registry",
            InputError::Io(_) => "Roster file could not be read",
        }
    }

    /// Returns detailed explanation of this error type (for documentation)
    #[must_use]
    pub fn details(&self) -> &'static str {
        match self {
            InputError::EmptyInput => "The roster contained no text at all, so there is no header row and no players.",
            InputError::MissingColumn { .. } => "The first non-blank line is read as the header. It must name a `name` column and a `rating` column; `position` is optional. Column order does not matter.",
            InputError::NotEnoughPlayers { .. } => "Rows whose rating is not an integer are skipped silently. After skipping, at least two players must remain to split into teams.",
            InputError::UnknownScenario { .. } => "The scenario id selects the balance objective (and therefore the model file). Only the ids listed by the scenario registry are accepted.",
            InputError::Io(_) => "The roster file path given on the command line could not be opened or was not valid UTF-8.",
        }
    }

    /// Returns a helpful suggestion for this error
    #[must_use]
    pub fn help(&self) -> Option<&'static str> {
        match self {
            InputError::EmptyInput | InputError::MissingColumn { .. } => Some("Start the roster with a header such as 'name,rating,position'"),
            InputError::NotEnoughPlayers { .. } => Some("Check that every rating is a whole number, e.g. 'Alice,8,forward'"),
            InputError::UnknownScenario { .. } => Some("Use one of: ratings_only, ratings_and_positions, ratings_per_position"),
            InputError::Io(_) => None,
        }
    }

    /// Formats the error with code and optional help text
    #[must_use]
    pub fn display_detailed(&self) -> String {
        format_error_with_code_and_help(&self.to_string(), self.code(), self.help())
    }
}

/// Helper function to format error messages with code and optional help text
pub(crate) fn format_error_with_code_and_help(base_msg: &str, code: &str, help: Option<&str>) -> String {
    if let Some(help_text) = help {
        format!("{base_msg} ({code})\n{help_text}")
    } else {
        format!("{base_msg} ({code})")
    }
}
