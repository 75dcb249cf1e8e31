//! I/O collaborators around the detection core.
//!
//! This module provides:
//! - **Field reader**: the [`FieldReader`] contract the engine pulls
//!   gridded fields through, with an in-memory implementation for tests
//!   and synthetic runs and a NetCDF implementation (requires the
//!   `netcdf` feature)
//! - **Detection output**: fixed-width text lines, one per detection
//! - **Relaxation state**: persistence of the relaxation mask between
//!   invocations
//!
//! # Detection Line Format
//!
//! ```text
//! 2005 08 01 0600   150.000  -15.000   99012.40   -2.1435e-4   23.10    5.82    1.95   12.40  151.000  -14.000
//! ```
//!
//! Columns: timestamp, centre longitude/latitude (degrees), central MSLP
//! (hPa), centre vorticity (1/s), maximum 10 m wind (m/s), warm-core sum
//! (K), upper-lower anomaly difference (K), circulation strength (m/s),
//! wind-maximum longitude/latitude (degrees).

mod reader;
mod relax_state;
mod writer;

#[cfg(feature = "netcdf")]
mod netcdf_reader;

pub use reader::{FieldReader, GridDims, InMemoryReader, ReaderError, StepFields};
pub use relax_state::{load_relax_state, read_relax_state, write_relax_state, RelaxStateError};
pub use writer::{format_detection_line, step_timestamp, DetectionWriter, WriterError};

#[cfg(feature = "netcdf")]
pub use netcdf_reader::NetCdfReader;
