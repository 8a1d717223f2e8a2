//! Stable exit codes for mentor CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid configuration or internal state invariant violation.
pub const INVALID: i32 = 1;
/// A stage's generation backend stayed unavailable after retries.
pub const STAGE_FAILED: i32 = 2;
/// The session was cancelled before completing.
pub const CANCELLED: i32 = 3;
