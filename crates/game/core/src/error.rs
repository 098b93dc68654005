//! Common error infrastructure for game-core.
//!
//! Domain-specific errors (e.g. [`MapError`](crate::map::MapError),
//! [`OrderError`](crate::movement::OrderError)) live next to the types they
//! guard. This module provides the shared classification used when the
//! runtime decides how loudly to log a rejection.
//!
//! Note that rejected orders discovered while a tick is resolving are *not*
//! errors; they are reported through [`crate::engine::TickOutcome`].

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Validation**: malformed input that should be rejected without retry
/// - **State**: input that is well-formed but illegal right now
/// - **Internal**: unexpected state inconsistencies that require investigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Invalid input, should not retry without changes.
    ///
    /// Examples: move target not adjacent, coordinate out of bounds
    Validation,

    /// Well-formed input that the current state does not allow.
    ///
    /// Examples: command from an eliminated player
    State,

    /// Unexpected state inconsistency.
    ///
    /// Examples: a map with two generals for one color
    Internal,
}

/// Common trait for all game-core errors.
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on who is at fault, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for metrics, logs and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
