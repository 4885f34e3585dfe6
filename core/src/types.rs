//! Shared primitive types used across the scoring workspace.

/// A stable, unique customer identifier as it appears in the source table.
pub type CustomerId = String;

/// The canonical scoring-run identifier (a v4 UUID string).
pub type RunId = String;

/// Number of months covered by a payment history.
pub const HISTORY_MONTHS: usize = 6;
