//! Generate error code documentation from the source of truth (error enums).
//!
//! This binary reads the error codes, descriptions, details, and help text
//! directly from the `SessionError` and `InputError` implementations via their
//! `code()`, `description()`, `details()`, and `help()` methods.
//!
//! Run with:
//! ```bash
//! cargo run --bin generate_error_docs > docs/ERROR_CODES.md
//! ```

use std::fmt::Write;
use teamsplit::context::ExecutionContext;
use teamsplit::errors::InputError;
use teamsplit::session::{SessionError, SessionState};

/// Macro to append error documentation for any error type
/// with `code()`, `description()`, `details()`, `help()`, and `display_detailed()` methods
macro_rules! write_error_docs {
    ($out:expr, $errors:expr) => {
        for error in $errors {
            let _ = writeln!($out, "### {}: {}\n", error.code(), error.description());
            let _ = writeln!($out, "**Details:** {}\n", error.details());

            if let Some(help_text) = error.help() {
                let _ = writeln!($out, "**How to fix:**\n```\n{help_text}\n```\n");
            }

            let _ = writeln!($out, "**Example error message:**\n```\n{error}\n```\n");
            let _ = writeln!($out, "**Detailed format:**\n```\n{}\n```\n", error.display_detailed());
            let _ = writeln!($out, "---\n");
        }
    };
}

/// One instance of every `SessionError` variant
fn all_session_error_variants() -> Vec<SessionError> {
    vec![
        SessionError::Initialization {
            context: ExecutionContext::Native,
            detail: "cannot run 'minizinc': No such file or directory (os error 2)".to_string(),
        },
        SessionError::UnsupportedSolver {
            solver: "gecode".to_string(),
            context: ExecutionContext::Native,
            available: "cbc, coinbc, cp-sat, chuffed".to_string(),
        },
        SessionError::NotReady { state: SessionState::Uninitialized },
        SessionError::Input(InputError::NotEnoughPlayers { found: 1 }),
    ]
}

/// One instance of every `InputError` variant
fn all_input_error_variants() -> Vec<InputError> {
    vec![
        InputError::EmptyInput,
        InputError::MissingColumn { column: "rating", header: "name,position".to_string() },
        InputError::NotEnoughPlayers { found: 1 },
        InputError::UnknownScenario { id: "ratings_by_height".to_string() },
        InputError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "roster.csv: No such file or directory")),
    ]
}

fn render() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Error Code Reference\n");
    let _ = writeln!(out, "**⚠️ This document is auto-generated from the source code. Do not edit manually.**\n");

    let _ = writeln!(out, "## Table of Contents\n");
    let _ = writeln!(out, "- [Session Errors (S001–S004)](#session-errors)");
    let _ = writeln!(out, "- [Input Errors (I001–I005)](#input-errors)");
    let _ = writeln!(out, "- [Errors Inside Results](#errors-inside-results)\n");

    let _ = writeln!(out, "## Session Errors\n");
    let _ = writeln!(out, "Errors returned before a solve reaches the engine.\n");
    write_error_docs!(out, all_session_error_variants());

    let _ = writeln!(out, "## Input Errors\n");
    let _ = writeln!(out, "Problems with the roster or the scenario id.\n");
    write_error_docs!(out, all_input_error_variants());

    let _ = writeln!(out, "## Errors Inside Results\n");
    let _ = writeln!(out, "Once the engine has started, failures are not errors but results:\n");
    let _ = writeln!(out, "- `ERROR`: the engine exited with an error or threw; `errorDetail` says why.");
    let _ = writeln!(out, "- `UNKNOWN`: no solution within the time limit, or a response that could not be read.");
    out
}

fn main() {
    print!("{}", render());
}
