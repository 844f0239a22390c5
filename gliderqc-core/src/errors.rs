//! Error Types for Profile Processing Failures
//!
//! ## Design Philosophy
//!
//! The error system follows a few rules:
//!
//! 1. **Small Size**: variants carry only the numbers needed to act on the
//!    failure (sizes, iteration counts) plus a `&'static str` description
//!    where one suffices. The single exception is `UnknownVariable`, which
//!    must carry the offending name from a caller-supplied configuration.
//!
//! 2. **Shape vs. Value**: *input-shape* problems (mismatched series
//!    lengths, empty casts) are errors; *bad values* (NaN samples, zero
//!    time deltas) are not. Bad values are first-class data here: the QC
//!    library flags them and the numeric kernels guard them with epsilon
//!    floors, but nothing ever throws on them.
//!
//! 3. **Typed Non-Convergence**: optimizer failure is a distinct variant
//!    so callers can fall back to published default coefficients instead
//!    of mistaking the initial guess for a fit.
//!
//! ## Error Categories
//!
//! ### Input shape
//! - `LengthMismatch`: aligned series disagree on length
//! - `EmptyInput`: an operation received no usable samples
//!
//! ### Estimation
//! - `NoConvergence`: the bounded minimizer exhausted its budget
//!
//! ### Configuration
//! - `UnknownVariable`: a QC check declaration names a variable the
//!   bound table does not contain (reported at binding time)
//! - `InvalidConfig`: malformed bounds, bands, or polynomial degrees

use alloc::string::String;

use thiserror_no_std::Error;

/// Result type for processing operations
pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Processing errors for the correction/QC/gridding core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// Aligned series disagree on length
    #[error("series length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length of the reference series
        expected: usize,
        /// Length of the offending series
        actual: usize,
    },

    /// An operation received no usable samples
    #[error("empty input: {what}")]
    EmptyInput {
        /// Which input was empty
        what: &'static str,
    },

    /// The bounded minimizer exhausted its iteration budget
    ///
    /// Carries the best objective value reached so the caller can judge
    /// whether the partial result is worth anything before falling back
    /// to default parameters.
    #[error("optimizer did not converge after {iterations} iterations (best value {best_value})")]
    NoConvergence {
        /// Iterations spent before giving up
        iterations: usize,
        /// Best objective value reached
        best_value: f64,
    },

    /// A QC check declaration references a variable the table lacks
    #[error("unknown variable in check configuration: {name}")]
    UnknownVariable {
        /// The name that failed to resolve
        name: String,
    },

    /// Malformed caller-supplied configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn error_display() {
        let e = ProcessingError::LengthMismatch {
            expected: 10,
            actual: 8,
        };
        assert_eq!(e.to_string(), "series length mismatch: expected 10, got 8");
    }

    #[test]
    fn no_convergence_carries_best_value() {
        let e = ProcessingError::NoConvergence {
            iterations: 500,
            best_value: 0.25,
        };
        match e {
            ProcessingError::NoConvergence { best_value, .. } => {
                assert!(best_value > 0.0);
            }
            _ => panic!("wrong variant"),
        }
    }
}
