//! Shared value types for the surveillance domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (costs are finite and non-negative, a
//! budget is strictly positive) and participate in domain computations.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token and cost types
// ---------------------------------------------------------------------------

/// Number of tokens assumed or consumed by a summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenCount(u64);

impl TokenCount {
    /// Creates a [`TokenCount`] from a raw integer.
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TokenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Monetary cost of summarization, expressed in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TokenCost(f64);

impl TokenCost {
    /// Creates a [`TokenCost`] from a raw float value (USD).
    ///
    /// Returns `None` if `value` is negative, infinite, or NaN.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && value >= 0.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates a [`TokenCost`] of exactly zero.
    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Returns the underlying `f64` value (USD).
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for TokenCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Hard ceiling on the estimated cost of a single run.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct CostBudget(f64);

impl CostBudget {
    /// Operational ceiling for one run: 5 USD.
    pub const DEFAULT_CEILING: CostBudget = CostBudget(5.0);

    /// Creates a [`CostBudget`] cap (USD).
    ///
    /// Returns `None` if `limit` is not strictly positive, infinite, or NaN.
    #[must_use]
    pub fn new(limit: f64) -> Option<Self> {
        if limit.is_finite() && limit > 0.0 {
            Some(Self(limit))
        } else {
            None
        }
    }

    /// Returns the budget limit as a `f64` (USD).
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns `true` if `estimate` is strictly greater than this budget.
    ///
    /// An estimate exactly equal to the ceiling is still within budget.
    pub fn is_exceeded_by(self, estimate: TokenCost) -> bool {
        estimate.as_f64() > self.0
    }
}

impl TryFrom<f64> for CostBudget {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("cost ceiling must be positive, got {value}"))
    }
}

impl From<CostBudget> for f64 {
    fn from(budget: CostBudget) -> Self {
        budget.0
    }
}

impl std::fmt::Display for CostBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Derives the file-name-safe [`RunStamp`] for this instant, in local time.
    pub fn run_stamp(self) -> RunStamp {
        let local = self.0.with_timezone(&Local);
        RunStamp(local.format("%Y-%m-%dT%H-%M-%S_%6f").to_string())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------

/// File-name-safe rendering of a run's start time (no `:` or `.`).
///
/// Shared by the ledger backup and every output artifact of the same run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunStamp(String);

impl RunStamp {
    /// Wraps an already file-name-safe stamp (e.g. one read back from a backup
    /// file name).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the stamp as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
