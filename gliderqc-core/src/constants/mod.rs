//! Physical and Procedural Constants
//!
//! Central location for every fixed number in the crate, so nothing is
//! buried as a magic literal inside a correction kernel or a QC check.
//!
//! ## Organization
//!
//! - [`physics`] - Sensor and seawater physics (thermal-lag coefficients,
//!   conductivity sensitivity, default glider attitude)
//! - [`estimation`] - Optimizer bounds, budgets and tolerances
//!
//! ## Sources
//!
//! Thermal-lag reference coefficients come from Morison et al. (1994),
//! "The Correction for Thermal-Lag Effects in Sea-Bird CTD Data",
//! J. Atmos. Oceanic Technol. Conductivity sensitivity terms follow the
//! usual linearization of the UNESCO conductivity ratio around typical
//! shelf-water temperatures.

pub mod estimation;
pub mod physics;
