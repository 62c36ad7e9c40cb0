//! Raw-value boundary helpers.
//!
//! How a reading is acquired (DOM text vs. an intercepted workspace
//! response) is a host-specific collaborator detail; these helpers only
//! cover the last step of either path: getting a number out of what the
//! host surfaced. Both return `Option` — a malformed input is "no reading",
//! never an error.

use serde::Deserialize;

/// Extract the first numeric run from displayed credit text.
///
/// Accepts an optional fractional part; ignores surrounding prose, so
/// `"45 left"` and `"Credits: 37.5"` both parse.
#[must_use]
pub fn parse_credit_text(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
    }

    // A trailing dot ("45.") parses as 45; "end" stops at the last digit.
    rest[..end].parse().ok()
}

/// Workspace-shaped record from an intercepted quota response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkspaceRecord {
    pub limit: f64,
    pub used: f64,
}

impl WorkspaceRecord {
    /// Remaining credit: `limit - used`.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.limit - self.used
    }
}

/// Parse an intercepted JSON body into a remaining-credit reading.
///
/// Unknown fields are tolerated; a body without the workspace shape yields
/// no reading.
#[must_use]
pub fn remaining_from_workspace(body: &str) -> Option<f64> {
    let record: WorkspaceRecord = serde_json::from_str(body).ok()?;
    let remaining = record.remaining();
    remaining.is_finite().then_some(remaining)
}
