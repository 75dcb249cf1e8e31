//! The detection engine and per-step driver.
//!
//! [`Engine`] owns the per-run state: configuration, grid, geometry table,
//! the field reader and the relaxation mask carried between steps.
//! [`StepContext`] owns the per-step state: the raw fields and the derived
//! fields computed from them. One call to [`Engine::step`] runs the full
//! pipeline for one time index:
//!
//! 1. fetch fields (converting MSLP to Pa if configured)
//! 2. compute vorticity and anomaly fields
//! 3. scan the grid through the criterion cascade
//! 4. merge near-duplicate vortices
//! 5. derive the relaxation mask for the next step

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ConfigError, Configuration};
use crate::detect::{deduplicate, scan_grid, DetectError, Detection, RelaxMask};
use crate::fields::{DerivedFrame, FieldFrame};
use crate::grid::{GeometryError, GeometryTable, Grid};
use crate::io::{FieldReader, ReaderError, RelaxStateError, WriterError};
use crate::operators::{relative_vorticity, NumericError};

/// Top-level error type for an engine run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Grid or geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Field-reader error
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// Non-finite derived field
    #[error(transparent)]
    Numeric(#[from] NumericError),

    /// Detection-pass error
    #[error(transparent)]
    Detect(#[from] DetectError),

    /// Output-writer error
    #[error(transparent)]
    Writer(#[from] WriterError),

    /// Relaxation-state persistence error
    #[error(transparent)]
    State(#[from] RelaxStateError),
}

/// Per-step state: raw fields plus the derived fields computed from them.
///
/// Read-only once constructed; the criterion cascade only consumes it.
pub struct StepContext {
    /// Raw input fields for this step.
    pub frame: FieldFrame,
    /// Vorticity, anomalies and box means.
    pub derived: DerivedFrame,
}

impl StepContext {
    /// Compute the derived fields for a loaded frame.
    pub fn new(
        frame: FieldFrame,
        grid: &Grid,
        geom: &GeometryTable,
    ) -> Result<Self, NumericError> {
        #[cfg(feature = "parallel")]
        let mut derived = crate::operators::compute_anomalies_parallel(&frame, grid, geom)?;
        #[cfg(not(feature = "parallel"))]
        let mut derived = crate::operators::compute_anomalies(&frame, grid, geom)?;
        derived.vort = relative_vorticity(&frame, grid, geom);
        Ok(Self { frame, derived })
    }
}

/// Detections for one time index.
#[derive(Clone, Debug)]
pub struct StepRecord {
    /// Time index.
    pub index: usize,
    /// Surviving detections, in row-major centre order.
    pub detections: Vec<Detection>,
}

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Number of time steps processed.
    pub steps: usize,
    /// Total detections across all steps.
    pub detections: usize,
    /// Wall-clock time in seconds.
    pub wall_time: f64,
}

/// The detection engine.
///
/// Constructed once per run from a [`Configuration`] and a reader; step
/// `k + 1` depends on step `k` only through the relaxation mask.
pub struct Engine<R: FieldReader> {
    config: Configuration,
    grid: Grid,
    geom: GeometryTable,
    reader: R,
    relax: RelaxMask,
}

impl<R: FieldReader> Engine<R> {
    /// Build the engine: validate the configuration, resolve the grid and
    /// the privileged pressure levels, and precompute the geometry table.
    pub fn new(config: Configuration, reader: R) -> Result<Self, EngineError> {
        config.validate()?;
        let dims = reader.dims();
        if config.narch >= dims.ntimes {
            return Err(ConfigError::Constraint(format!(
                "narch ({}) past the end of the archive ({} steps)",
                config.narch, dims.ntimes
            ))
            .into());
        }
        let grid = Grid::new(
            reader.lon().to_vec(),
            reader.lat().to_vec(),
            reader.levels().to_vec(),
        )?;
        let geom = GeometryTable::compute(&grid, config.radius)?;
        let relax = RelaxMask::new(grid.nlon(), grid.nlat());
        debug!(
            nlon = grid.nlon(),
            nlat = grid.nlat(),
            nlevs = grid.nlevs(),
            ntimes = dims.ntimes,
            radius = config.radius,
            "engine initialised"
        );
        Ok(Self {
            config,
            grid,
            geom,
            reader,
            relax,
        })
    }

    /// The grid in use.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The precomputed geometry table.
    pub fn geometry(&self) -> &GeometryTable {
        &self.geom
    }

    /// The active configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The relaxation mask that the next step will see.
    pub fn relax_mask(&self) -> &RelaxMask {
        &self.relax
    }

    /// Replace the relaxation mask, e.g. with persisted state from a
    /// prior run.
    pub fn set_relax_mask(&mut self, mask: RelaxMask) {
        self.relax = mask;
    }

    /// Run the full pipeline for one time index and return the surviving
    /// detections. Updates the relaxation mask for the following step.
    pub fn step(&mut self, t: usize) -> Result<Vec<Detection>, EngineError> {
        let mut frame = FieldFrame::load(&self.reader, t)?;
        if self.config.convert_pascals {
            frame.convert_mslp_to_pascals();
        }
        let ctx = StepContext::new(frame, &self.grid, &self.geom)?;
        let raw = scan_grid(
            &self.config,
            &self.grid,
            &self.geom,
            &ctx.frame,
            &ctx.derived,
            &self.relax,
            t,
        )?;
        let detections = deduplicate(raw, &self.geom, self.config.dedup_abs_vort);
        self.relax = RelaxMask::from_detections(&detections, &self.geom);
        info!(
            step = t,
            detections = detections.len(),
            relaxed_cells = self.relax.count(),
            "step complete"
        );
        Ok(detections)
    }

    /// Process the configured `[farch, narch]` range, handing each step's
    /// detections to `sink` as soon as they are final.
    pub fn run_with<F>(&mut self, mut sink: F) -> Result<RunSummary, EngineError>
    where
        F: FnMut(&StepRecord) -> Result<(), WriterError>,
    {
        let started = Instant::now();
        let mut total = 0;
        let (farch, narch) = (self.config.farch, self.config.narch);
        for t in farch..=narch {
            let detections = self.step(t)?;
            total += detections.len();
            sink(&StepRecord {
                index: t,
                detections,
            })?;
        }
        Ok(RunSummary {
            steps: narch - farch + 1,
            detections: total,
            wall_time: started.elapsed().as_secs_f64(),
        })
    }

    /// Process the configured range, collecting every step's detections.
    pub fn run_collect(&mut self) -> Result<(RunSummary, Vec<StepRecord>), EngineError> {
        let mut records = Vec::new();
        let summary = self.run_with(|record| {
            records.push(record.clone());
            Ok(())
        })?;
        Ok((summary, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field2, Field3};
    use crate::io::{InMemoryReader, StepFields};

    fn uniform_reader(nsteps: usize) -> InMemoryReader {
        let nlon = 41;
        let nlat = 31;
        let lon: Vec<f64> = (0..nlon).map(|k| 130.0 + k as f64).collect();
        let lat: Vec<f64> = (0..nlat).map(|k| -15.0 + k as f64).collect();
        let mut reader = InMemoryReader::new(lon, lat, vec![850.0, 700.0, 500.0, 300.0]);
        for _ in 0..nsteps {
            let mut temp = Field3::zeros(nlon, nlat, 4);
            for k in 0..4 {
                for j in 0..nlat {
                    for i in 0..nlon {
                        temp.set(k, i, j, 280.0);
                    }
                }
            }
            reader.push_step(StepFields {
                u: Field3::zeros(nlon, nlat, 4),
                v: Field3::zeros(nlon, nlat, 4),
                temp,
                psl: Field2::constant(nlon, nlat, 1010.0), // hPa before conversion
                u10: Field2::zeros(nlon, nlat),
                tsu: None,
                zs: None,
            });
        }
        reader
    }

    #[test]
    fn test_uniform_run_finds_nothing() {
        let mut config = Configuration::default();
        config.narch = 2;
        let mut engine = Engine::new(config, uniform_reader(3)).unwrap();
        let (summary, records) = engine.run_collect().unwrap();
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.detections, 0);
        assert!(records.iter().all(|r| r.detections.is_empty()));
        assert!(!engine.relax_mask().any());
    }

    #[test]
    fn test_narch_past_archive_rejected() {
        let mut config = Configuration::default();
        config.narch = 5;
        let result = Engine::new(config, uniform_reader(3));
        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn test_missing_level_rejected() {
        let lon: Vec<f64> = (0..10).map(|k| k as f64).collect();
        let lat: Vec<f64> = (0..10).map(|k| k as f64).collect();
        let mut reader = InMemoryReader::new(lon, lat, vec![850.0, 700.0, 500.0]);
        reader.push_step(StepFields {
            u: Field3::zeros(10, 10, 3),
            v: Field3::zeros(10, 10, 3),
            temp: Field3::zeros(10, 10, 3),
            psl: Field2::constant(10, 10, 1010.0),
            u10: Field2::zeros(10, 10),
            tsu: None,
            zs: None,
        });
        let result = Engine::new(Configuration::default(), reader);
        assert!(matches!(
            result,
            Err(EngineError::Geometry(GeometryError::MissingPressureLevel(_)))
        ));
    }
}
