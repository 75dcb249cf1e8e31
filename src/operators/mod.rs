//! Derived-field operators.
//!
//! Per-step computations over the full grid:
//!
//! - [`relative_vorticity`]: 4th-order centred curl of the horizontal wind
//!   at 850 hPa
//! - [`compute_anomalies`]: box-mean temperature, wind-speed and MSLP
//!   fields and the anomalies derived from them
//!
//! Both are pure functions of the [`FieldFrame`](crate::fields::FieldFrame)
//! and may run data-parallel over grid cells (`parallel` feature).

mod anomaly;
mod vorticity;

pub use anomaly::compute_anomalies;
#[cfg(feature = "parallel")]
pub use anomaly::compute_anomalies_parallel;
pub use vorticity::relative_vorticity;

use thiserror::Error;

/// Error type for derived-field computation.
#[derive(Debug, Error)]
pub enum NumericError {
    /// A box mean evaluated to NaN or infinity.
    #[error("non-finite {field} mean at cell ({i}, {j})")]
    NonFiniteMean {
        /// Which mean went bad.
        field: &'static str,
        /// Zonal index of the offending cell.
        i: usize,
        /// Meridional index of the offending cell.
        j: usize,
    },
}
