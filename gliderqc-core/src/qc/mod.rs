//! Quality-Control Flags, Checks and Configuration Binding
//!
//! ## Overview
//!
//! Every scientific variable leaving the correction stage passes through
//! a configurable set of per-sample checks. Checks never drop or modify
//! data: each one returns a flag vector sized to the variable, and the
//! combined verdict travels alongside the data to downstream writers.
//!
//! ## Module Organization
//!
//! - This file: the [`QcFlag`] code set, the worst-flag-wins combination
//!   rule, and the declaration/binding machinery that turns a
//!   configuration into runnable checks.
//! - [`checks`] - the stateless per-variable check functions.
//!
//! ## Flag Combination
//!
//! Multiple checks may fire on the same sample. The combination rule is
//! worst-flag-wins under one fixed severity order, defined in a single
//! place ([`QcFlag::severity`]):
//!
//! ```text
//! Good < ProbablyGood < ProbablyBad < Spike < Bad < Missing
//! ```
//!
//! `Missing` outranks `Bad` so a NaN sample can never be "upgraded" by
//! a later range check that happens to pass vacuously.
//!
//! ## Configuration as Data
//!
//! Deployments declare checks by name with a positional parameter
//! payload and the variable(s) each check reads ([`CheckSpec`]). The
//! payload is a tagged union ([`CheckKind`]), not a fixed signature:
//! different checks take different shapes of parameters. Declarations
//! are resolved against a [`VariableTable`] *before* anything runs;
//! referencing an unknown variable fails at binding time with
//! [`ProcessingError::UnknownVariable`], not deep inside a check.

pub mod checks;

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::errors::{ProcessingError, ProcessingResult};

pub use checks::{DepthBand, GradientSpec, RangeSpec, SpikeSpec};

/// Per-sample quality code
///
/// The numeric values follow the IOC convention used by the downstream
/// NetCDF writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum QcFlag {
    /// Passed every check it was subjected to
    Good = 1,
    /// Good by indirect evidence
    ProbablyGood = 2,
    /// Suspect but not provably wrong
    ProbablyBad = 3,
    /// Failed a check outright
    Bad = 4,
    /// Flagged by the spike detector
    Spike = 6,
    /// Not a usable number
    Missing = 9,
}

impl QcFlag {
    /// Position in the worst-flag-wins order; higher is worse
    pub fn severity(self) -> u8 {
        match self {
            Self::Good => 0,
            Self::ProbablyGood => 1,
            Self::ProbablyBad => 2,
            Self::Spike => 3,
            Self::Bad => 4,
            Self::Missing => 5,
        }
    }

    /// Worst-flag-wins combination of two verdicts
    pub fn combine(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

/// Fold a new flag vector into an accumulated one, worst-flag-wins.
///
/// Lengths must agree; the accumulator is updated in place.
pub fn combine_flags(accumulated: &mut [QcFlag], new: &[QcFlag]) -> ProcessingResult<()> {
    if accumulated.len() != new.len() {
        return Err(ProcessingError::LengthMismatch {
            expected: accumulated.len(),
            actual: new.len(),
        });
    }
    for (acc, n) in accumulated.iter_mut().zip(new) {
        *acc = acc.combine(*n);
    }
    Ok(())
}

/// Tagged parameter payload: which check to run, with its thresholds
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CheckKind {
    /// Flag non-finite samples
    Finite,
    /// Flag timestamps outside `[min, max]`
    ValidDate {
        /// Earliest plausible timestamp (s)
        min: f64,
        /// Latest plausible timestamp (s)
        max: f64,
    },
    /// Flag impossible positions; reads `[latitude, longitude]`
    ValidLocation,
    /// Flag samples outside a range, optionally depth-banded; reads
    /// `[variable]` or `[variable, depth]`
    ValidRange(RangeSpec),
    /// Flag local double-difference outliers; reads `[variable]` or
    /// `[variable, divider_signal]` for the two-regime variant
    Spike(SpikeSpec),
    /// Flag stuck-after-step runs in depth order; reads
    /// `[variable, depth]`
    GradientFlatline(GradientSpec),
}

/// One check declaration: kind, the variables it reads, the flag it
/// assigns on failure
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckSpec {
    /// Which check, with its parameter payload
    pub kind: CheckKind,
    /// Variable names, positional: first is the primary (flagged)
    /// variable, the rest are auxiliary inputs. Grouped checks flag
    /// every listed variable.
    pub variables: Vec<String>,
    /// Flag assigned at failing indices
    pub flag: QcFlag,
}

/// Named, borrowed view of the variables available to a QC run
#[derive(Debug, Default)]
pub struct VariableTable<'a> {
    vars: BTreeMap<&'a str, &'a [f64]>,
}

impl<'a> VariableTable<'a> {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable under a name (replacing any previous entry)
    pub fn insert(&mut self, name: &'a str, data: &'a [f64]) {
        self.vars.insert(name, data);
    }

    /// Look a variable up, failing with the offending name
    pub fn get(&self, name: &str) -> ProcessingResult<&'a [f64]> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| ProcessingError::UnknownVariable { name: name.into() })
    }

    fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

/// Flag vectors per variable, the terminal output of a QC run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QcReport {
    /// Combined flags keyed by variable name
    pub flags: BTreeMap<String, Vec<QcFlag>>,
}

impl QcReport {
    /// Flags for one variable, if it was checked
    pub fn get(&self, name: &str) -> Option<&[QcFlag]> {
        self.flags.get(name).map(|v| v.as_slice())
    }
}

/// A configured, ordered set of checks
///
/// Order is irrelevant to the outcome (worst-flag-wins is commutative
/// and associative) but preserved for reporting.
#[derive(Debug, Clone, Default)]
pub struct QcPipeline {
    checks: Vec<CheckSpec>,
}

impl QcPipeline {
    /// Empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a check declaration
    pub fn with_check(mut self, spec: CheckSpec) -> Self {
        self.checks.push(spec);
        self
    }

    /// Resolve every declaration against the table without running
    /// anything.
    ///
    /// This is the configuration-binding step: unknown variable names
    /// and arity mismatches are reported here, so a run that starts is
    /// a run that finishes.
    pub fn bind(&self, table: &VariableTable<'_>) -> ProcessingResult<()> {
        for spec in &self.checks {
            let expected = match &spec.kind {
                CheckKind::Finite | CheckKind::ValidDate { .. } => 1,
                CheckKind::ValidLocation => 2,
                CheckKind::ValidRange(RangeSpec::Flat { .. }) => 1,
                CheckKind::ValidRange(RangeSpec::DepthBanded { .. }) => 2,
                CheckKind::Spike(SpikeSpec::Single { .. }) => 1,
                CheckKind::Spike(SpikeSpec::TwoRegime { .. }) => 2,
                CheckKind::GradientFlatline(_) => 2,
            };
            if spec.variables.len() != expected {
                return Err(ProcessingError::InvalidConfig(
                    "check declaration has the wrong number of variables",
                ));
            }
            for name in &spec.variables {
                if !table.contains(name) {
                    return Err(ProcessingError::UnknownVariable { name: name.clone() });
                }
            }
        }
        Ok(())
    }

    /// Bind and run every check, combining flags worst-wins per
    /// variable.
    pub fn run(&self, table: &VariableTable<'_>) -> ProcessingResult<QcReport> {
        self.bind(table)?;

        let mut report = QcReport::default();
        for spec in &self.checks {
            let primary = table.get(&spec.variables[0])?;
            let new_flags = match &spec.kind {
                CheckKind::Finite => checks::check_finite(primary, spec.flag),
                CheckKind::ValidDate { min, max } => {
                    checks::check_valid_date(primary, (*min, *max), spec.flag)
                }
                CheckKind::ValidLocation => {
                    let lon = table.get(&spec.variables[1])?;
                    checks::check_valid_location(primary, lon, spec.flag)?
                }
                CheckKind::ValidRange(range) => {
                    let depth = match spec.variables.get(1) {
                        Some(name) => Some(table.get(name)?),
                        None => None,
                    };
                    checks::check_valid_range(primary, depth, range, spec.flag)?
                }
                CheckKind::Spike(spike) => {
                    let divider = match spec.variables.get(1) {
                        Some(name) => Some(table.get(name)?),
                        None => None,
                    };
                    checks::check_spike(primary, divider, spike, spec.flag)?
                }
                CheckKind::GradientFlatline(grad) => {
                    let depth = table.get(&spec.variables[1])?;
                    checks::check_gradient_flatline(primary, depth, grad, spec.flag)?
                }
            };

            // Grouped checks flag every variable they read
            let targets: &[String] = match spec.kind {
                CheckKind::ValidLocation => &spec.variables,
                _ => &spec.variables[..1],
            };
            for name in targets {
                let entry = report
                    .flags
                    .entry(name.clone())
                    .or_insert_with(|| alloc::vec![QcFlag::Good; new_flags.len()]);
                combine_flags(entry, &new_flags)?;
            }
        }
        Ok(report)
    }
}
