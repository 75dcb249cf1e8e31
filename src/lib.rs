//! # tcdetect
//!
//! A tropical-cyclone detection engine for gridded reanalysis and
//! climate-model output.
//!
//! This crate provides the core building blocks for per-step detection:
//! - Grid geometry: per-cell search half-widths and metric spacings
//! - Derived fields: 4th-order relative vorticity, warm-core anomalies,
//!   box-mean winds and MSLP
//! - A fixed-order criterion cascade with temporal relaxation
//! - Circulation strength on a weighted 5x5 stencil
//! - De-duplication of near-coincident vortices
//! - I/O collaborators: field readers (in-memory, NetCDF), fixed-width
//!   detection output, relaxation-state persistence
//!
//! Vortex tracking across time steps is out of scope; the engine emits
//! per-step detections for a downstream stitcher.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tcdetect::{Engine, NetCdfReader};
//!
//! let config = tcdetect::read_namelist_file(Path::new("detect.nml"))?;
//! let reader = NetCdfReader::open("era5_2005.nc")?;
//! let mut engine = Engine::new(config, reader)?;
//! let (summary, steps) = engine.run_collect()?;
//! println!("{} detections in {} steps", summary.detections, summary.steps);
//! ```

pub mod config;
pub mod detect;
pub mod engine;
pub mod fields;
pub mod grid;
pub mod io;
pub mod operators;

// Re-export main types for convenience
pub use config::{parse_namelist, read_namelist_file, ConfigError, Configuration};
pub use detect::{
    circulation_strength, deduplicate, scan_grid, DetectError, Detection, RelaxMask, NVMAX,
    OCS_WEIGHTS,
};
pub use engine::{Engine, EngineError, RunSummary, StepContext, StepRecord};
pub use fields::{BoolField2, DerivedFrame, Field2, Field3, FieldFrame};
pub use grid::{GeometryError, GeometryTable, Grid, PressureLevels, EARTH_RADIUS};
pub use io::{
    format_detection_line, load_relax_state, read_relax_state, step_timestamp,
    write_relax_state, DetectionWriter, FieldReader, GridDims, InMemoryReader, ReaderError,
    RelaxStateError, StepFields, WriterError,
};
pub use operators::{compute_anomalies, relative_vorticity, NumericError};

#[cfg(feature = "parallel")]
pub use operators::compute_anomalies_parallel;

#[cfg(feature = "netcdf")]
pub use io::NetCdfReader;
