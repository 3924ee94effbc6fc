//! Error types for model parsing and checking.

use thiserror::Error;

use crate::formula::FormulaClass;

/// Errors produced while building models or running checks.
///
/// Parse errors carry the line number of the offending model text, as
/// reported by the external scanner. Internal invariant violations are not
/// represented here; they are programming defects and panic instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The model text is malformed (duplicate state definition, transition
    /// to a state that is never defined, unexpected token).
    #[error("parse error at line {line}: {msg}")]
    Parse {
        /// Line number reported by the scanner (1-based).
        line: usize,
        /// Description of the problem.
        msg: String,
    },

    /// A state name was added twice through the programmatic API.
    #[error("state {name} already exists")]
    StateExists {
        /// The duplicated state name.
        name: i64,
    },

    /// An operation referenced a state name that has not been added.
    #[error("unknown state {name}")]
    UnknownState {
        /// The missing state name.
        name: i64,
    },

    /// A checker was invoked on a formula outside its logic fragment.
    #[error("formula is not {expected}: classified as {found}")]
    FormulaClass {
        /// The fragment the checker accepts.
        expected: &'static str,
        /// The class the formula actually belongs to.
        found: FormulaClass,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
