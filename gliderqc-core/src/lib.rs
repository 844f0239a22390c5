//! Core correction, QC and gridding engine for glider CTD profiles
//!
//! Turns raw per-sensor time series from profiling gliders into
//! quality-controlled, depth-gridded profiles ready for salinity and
//! density computation.
//!
//! Key constraints:
//! - Pure functions over owned inputs; no I/O, no global state
//! - NaN is the in-band missing-value marker, never a panic
//! - Every cast/variable is independent, so the pipeline is trivially
//!   data-parallel across casts
//!
//! ```
//! use gliderqc_core::{correct_thermal_lag, Profile, ThermalLagParams};
//!
//! let profile = Profile::new(
//!     vec![0.0, 2.0, 4.0],        // time (s)
//!     vec![1.0, 2.0, 3.0],        // depth (m)
//!     vec![15.0, 14.8, 14.1],     // temperature (°C)
//!     vec![4.3, 4.3, 4.2],        // conductivity (S/m)
//! )?;
//!
//! // Correct with the published reference coefficients
//! let corrected = correct_thermal_lag(
//!     &profile,
//!     &ThermalLagParams::default(),
//!     &Default::default(),
//! )?;
//! assert_eq!(corrected.conductivity_outside.len(), profile.len());
//! # Ok::<(), gliderqc_core::ProcessingError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Optional logging, compiled away without the feature
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod constants;
pub mod errors;
pub mod estimator;
pub mod filter;
pub mod grid;
pub mod optim;
pub mod polygon;
pub mod profiles;
pub mod qc;
pub mod response;
pub mod series;
pub mod thermal;

// Public API
pub use errors::{ProcessingError, ProcessingResult};
pub use estimator::{
    estimate_thermal_lag_params, estimate_time_constant, ThermalLagEstimationOptions,
    TimeConstantOptions, ValueCast,
};
pub use grid::{grid_profiles, CastTable, GridConfig, GridVariable, ProfileGrid};
pub use optim::{Bounds, Minimizer, Minimum, NelderMead, OptimOptions};
pub use profiles::{find_casts, CastDirection, CastOptions, CastSpan};
pub use qc::{CheckKind, CheckSpec, QcFlag, QcPipeline, QcReport, VariableTable};
pub use series::{Profile, ThermalLagParams};
pub use thermal::{correct_thermal_lag, FlowPolynomial, ThermalLagCorrection, ThermalLagOptions};

/// Crate version, for provenance attributes written by downstream encoders
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
