//! # Error Types
//!
//! Structured error types for shaft_core. Sizing failures carry enough
//! context (span budget, seat diameter, damage) for a caller to decide
//! whether to change the drivetrain layout or the material.
//!
//! ## Example
//!
//! ```rust
//! use shaft_core::errors::{CalcError, CalcResult};
//!
//! fn validate_span(span_m: f64) -> CalcResult<()> {
//!     if span_m <= 0.0 {
//!         return Err(CalcError::InvalidInput {
//!             field: "span_m".to_string(),
//!             value: span_m.to_string(),
//!             reason: "Span must be positive".to_string(),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for shaft_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for sizing operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (out of range, non-finite, degenerate)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No admissible span fits inside the envelope left by overhang and gearbox
    #[error("Infeasible geometry: {stage} span {span_m:.4} m exceeds budget {budget_m:.4} m - {reason}")]
    InfeasibleGeometry {
        stage: String,
        span_m: f64,
        budget_m: f64,
        reason: String,
    },

    /// Seat diameter reached its upper bound with damage still above one
    #[error("Infeasible fatigue: {seat} seat at {diameter_m:.3} m (limit {limit_m:.3} m) has damage {damage:.3e}")]
    InfeasibleFatigue {
        seat: String,
        diameter_m: f64,
        limit_m: f64,
        damage: f64,
    },

    /// A search loop hit its iteration cap
    #[error("No convergence in {search} after {iterations} iterations")]
    NonConvergence { search: String, iterations: usize },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InfeasibleGeometry error
    pub fn infeasible_geometry(
        stage: impl Into<String>,
        span_m: f64,
        budget_m: f64,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InfeasibleGeometry {
            stage: stage.into(),
            span_m,
            budget_m,
            reason: reason.into(),
        }
    }

    /// Create an InfeasibleFatigue error
    pub fn infeasible_fatigue(seat: impl Into<String>, diameter_m: f64, limit_m: f64, damage: f64) -> Self {
        CalcError::InfeasibleFatigue {
            seat: seat.into(),
            diameter_m,
            limit_m,
            damage,
        }
    }

    /// Create a NonConvergence error
    pub fn non_convergence(search: impl Into<String>, iterations: usize) -> Self {
        CalcError::NonConvergence {
            search: search.into(),
            iterations,
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    ///
    /// Sizing failures are deterministic; only a held file lock can clear on its own.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// True for the two design-infeasibility outcomes
    pub fn is_infeasible_design(&self) -> bool {
        matches!(
            self,
            CalcError::InfeasibleGeometry { .. } | CalcError::InfeasibleFatigue { .. }
        )
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::InfeasibleGeometry { .. } => "INFEASIBLE_GEOMETRY",
            CalcError::InfeasibleFatigue { .. } => "INFEASIBLE_FATIGUE",
            CalcError::NonConvergence { .. } => "NON_CONVERGENCE",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
