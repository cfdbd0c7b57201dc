// ─────────────────────────────────────────────────────────────────────
// Strata Kernel: Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Strata Kernel failures.
///
/// The scoring pipeline itself is total; these errors only surface at
/// the call boundary (config, snapshot, and input validation).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrataError {
    /// Engine configuration is out of range.
    #[error("config error: {0}")]
    Config(String),

    /// Caller input violates the engine contract (length, arity).
    #[error("validation error: {0}")]
    Validation(String),

    /// Dictionary/rule snapshot failed to load or validate.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// A mapping condition string does not match the condition grammar.
    #[error("malformed condition: {0:?}")]
    Condition(String),
}

pub type StrataResult<T> = Result<T, StrataError>;
