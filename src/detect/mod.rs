//! Cyclone detection: criterion cascade, circulation strength,
//! de-duplication and the temporal relaxation mask.
//!
//! The per-step entry point is [`scan_grid`], which walks every grid cell,
//! applies the fixed-order criterion cascade and returns the surviving
//! [`Detection`] records. [`deduplicate`] then merges near-duplicate
//! vortices and [`RelaxMask::from_detections`] derives the eligibility
//! mask consumed by the next step.

mod criteria;
mod dedup;
mod ocs;
mod relax;

pub use criteria::scan_grid;
pub use dedup::deduplicate;
pub use ocs::{circulation_strength, OCS_WEIGHTS};
pub use relax::RelaxMask;

use thiserror::Error;

/// Hard cap on the number of vortices per time step.
pub const NVMAX: usize = 1000;

/// Error type for the detection pass.
#[derive(Debug, Error)]
pub enum DetectError {
    /// More than [`NVMAX`] vortices fired at one time step.
    #[error("vortex capacity exceeded at time step {step}: more than {NVMAX} detections")]
    Capacity {
        /// Time index at which the overflow happened.
        step: usize,
    },
}

/// One detected vortex at one time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Zonal index of the pressure-minimum centre.
    pub ips: usize,
    /// Meridional index of the pressure-minimum centre.
    pub jps: usize,
    /// Zonal index of the maximum 10 m wind.
    pub iwmax: usize,
    /// Meridional index of the maximum 10 m wind.
    pub jwmax: usize,
    /// Central MSLP (Pa).
    pub pmin: f64,
    /// Relative vorticity at the centre (1/s).
    pub vort: f64,
    /// Maximum 10 m wind speed (m/s).
    pub wmax: f64,
    /// Warm-core anomaly sum `tanom700 + tanom500 + tanom300` (K).
    pub tsum: f64,
    /// Upper-minus-lower anomaly `tanom300 - tanom850` (K).
    pub tdiff: f64,
    /// Circulation strength (m/s).
    pub ocs: f64,
}
