//! The field-reader contract and the in-memory implementation.

use thiserror::Error;

use crate::fields::{Field2, Field3};

/// Error type for field readers.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// A requested variable is not known to the reader
    #[error("missing variable: {0}")]
    MissingVariable(String),

    /// Time index past the end of the archive
    #[error("time index {t} out of range (archive holds {ntimes} steps)")]
    TimeOutOfRange { t: usize, ntimes: usize },

    /// A variable's shape disagrees with the grid
    #[error("shape mismatch for '{name}': expected {expected}, got {got}")]
    ShapeMismatch {
        name: String,
        expected: String,
        got: String,
    },
}

/// Grid dimensions as reported by a reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    /// Number of zonal points.
    pub nlon: usize,
    /// Number of meridional points.
    pub nlat: usize,
    /// Number of pressure levels.
    pub nlevs: usize,
    /// Number of time steps in the archive.
    pub ntimes: usize,
}

/// Supplier of gridded fields by name and time index.
///
/// 2D names: `psl`, `u10`, and optionally `tsu`, `zs`. 3D names: `temp`,
/// `u`, `v`. Returned arrays are `[lat][lon]` (plus a leading level axis
/// for 3D) and must match [`FieldReader::dims`].
pub trait FieldReader {
    /// Grid and archive dimensions.
    fn dims(&self) -> GridDims;

    /// Longitude coordinate (degrees).
    fn lon(&self) -> &[f64];

    /// Latitude coordinate (degrees).
    fn lat(&self) -> &[f64];

    /// Pressure-level coordinate (hPa).
    fn levels(&self) -> &[f64];

    /// Whether the reader can supply the named variable.
    fn has_variable(&self, name: &str) -> bool;

    /// Read a 2D field at time index `t`.
    fn read_2d(&self, name: &str, t: usize) -> Result<Field2, ReaderError>;

    /// Read a 3D field at time index `t`.
    fn read_3d(&self, name: &str, t: usize) -> Result<Field3, ReaderError>;
}

/// One time step of synthetic input fields.
#[derive(Clone, Debug)]
pub struct StepFields {
    /// Zonal wind on pressure levels (m/s).
    pub u: Field3,
    /// Meridional wind on pressure levels (m/s).
    pub v: Field3,
    /// Temperature on pressure levels (K).
    pub temp: Field3,
    /// Mean-sea-level pressure (Pa, or hPa with `convert_pascals`).
    pub psl: Field2,
    /// 10 m wind speed (m/s).
    pub u10: Field2,
    /// Skin temperature (K).
    pub tsu: Option<Field2>,
    /// Surface topography height (m).
    pub zs: Option<Field2>,
}

/// A [`FieldReader`] backed by owned arrays.
///
/// Used by tests and synthetic-case drivers; steps are appended in time
/// order with [`InMemoryReader::push_step`].
#[derive(Clone, Debug)]
pub struct InMemoryReader {
    lon: Vec<f64>,
    lat: Vec<f64>,
    levels: Vec<f64>,
    steps: Vec<StepFields>,
}

impl InMemoryReader {
    /// Create an empty reader over the given coordinates.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, levels: Vec<f64>) -> Self {
        Self {
            lon,
            lat,
            levels,
            steps: Vec::new(),
        }
    }

    /// Append one time step.
    pub fn push_step(&mut self, step: StepFields) {
        self.steps.push(step);
    }

    /// Append one time step, builder style.
    pub fn with_step(mut self, step: StepFields) -> Self {
        self.steps.push(step);
        self
    }

    fn step(&self, t: usize) -> Result<&StepFields, ReaderError> {
        self.steps.get(t).ok_or(ReaderError::TimeOutOfRange {
            t,
            ntimes: self.steps.len(),
        })
    }

    fn check_2d(&self, name: &str, field: &Field2) -> Result<(), ReaderError> {
        if field.nlon() != self.lon.len() || field.nlat() != self.lat.len() {
            return Err(ReaderError::ShapeMismatch {
                name: name.to_string(),
                expected: format!("{} x {}", self.lat.len(), self.lon.len()),
                got: format!("{} x {}", field.nlat(), field.nlon()),
            });
        }
        Ok(())
    }

    fn check_3d(&self, name: &str, field: &Field3) -> Result<(), ReaderError> {
        if field.nlon() != self.lon.len()
            || field.nlat() != self.lat.len()
            || field.nlevs() != self.levels.len()
        {
            return Err(ReaderError::ShapeMismatch {
                name: name.to_string(),
                expected: format!(
                    "{} x {} x {}",
                    self.levels.len(),
                    self.lat.len(),
                    self.lon.len()
                ),
                got: format!("{} x {} x {}", field.nlevs(), field.nlat(), field.nlon()),
            });
        }
        Ok(())
    }
}

impl FieldReader for InMemoryReader {
    fn dims(&self) -> GridDims {
        GridDims {
            nlon: self.lon.len(),
            nlat: self.lat.len(),
            nlevs: self.levels.len(),
            ntimes: self.steps.len(),
        }
    }

    fn lon(&self) -> &[f64] {
        &self.lon
    }

    fn lat(&self) -> &[f64] {
        &self.lat
    }

    fn levels(&self) -> &[f64] {
        &self.levels
    }

    fn has_variable(&self, name: &str) -> bool {
        match name {
            "psl" | "u10" | "temp" | "u" | "v" => !self.steps.is_empty(),
            "tsu" => self.steps.first().is_some_and(|s| s.tsu.is_some()),
            "zs" => self.steps.first().is_some_and(|s| s.zs.is_some()),
            _ => false,
        }
    }

    fn read_2d(&self, name: &str, t: usize) -> Result<Field2, ReaderError> {
        let step = self.step(t)?;
        let field = match name {
            "psl" => &step.psl,
            "u10" => &step.u10,
            "tsu" => step
                .tsu
                .as_ref()
                .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?,
            "zs" => step
                .zs
                .as_ref()
                .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?,
            _ => return Err(ReaderError::MissingVariable(name.to_string())),
        };
        self.check_2d(name, field)?;
        Ok(field.clone())
    }

    fn read_3d(&self, name: &str, t: usize) -> Result<Field3, ReaderError> {
        let step = self.step(t)?;
        let field = match name {
            "u" => &step.u,
            "v" => &step.v,
            "temp" => &step.temp,
            _ => return Err(ReaderError::MissingVariable(name.to_string())),
        };
        self.check_3d(name, field)?;
        Ok(field.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_reader() -> InMemoryReader {
        let lon: Vec<f64> = (0..6).map(|k| k as f64).collect();
        let lat: Vec<f64> = (0..5).map(|k| k as f64).collect();
        let levels = vec![850.0, 700.0, 500.0, 300.0];
        let step = StepFields {
            u: Field3::zeros(6, 5, 4),
            v: Field3::zeros(6, 5, 4),
            temp: Field3::zeros(6, 5, 4),
            psl: Field2::constant(6, 5, 101_000.0),
            u10: Field2::zeros(6, 5),
            tsu: None,
            zs: None,
        };
        InMemoryReader::new(lon, lat, levels).with_step(step)
    }

    #[test]
    fn test_dims() {
        let reader = small_reader();
        assert_eq!(
            reader.dims(),
            GridDims {
                nlon: 6,
                nlat: 5,
                nlevs: 4,
                ntimes: 1
            }
        );
    }

    #[test]
    fn test_read_known_fields() {
        let reader = small_reader();
        assert_eq!(reader.read_2d("psl", 0).unwrap().at(3, 2), 101_000.0);
        assert_eq!(reader.read_3d("u", 0).unwrap().at(0, 3, 2), 0.0);
    }

    #[test]
    fn test_optional_fields_absent() {
        let reader = small_reader();
        assert!(!reader.has_variable("tsu"));
        assert!(!reader.has_variable("zs"));
        assert!(matches!(
            reader.read_2d("tsu", 0),
            Err(ReaderError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_unknown_variable() {
        let reader = small_reader();
        assert!(matches!(
            reader.read_2d("slp", 0),
            Err(ReaderError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_time_out_of_range() {
        let reader = small_reader();
        assert!(matches!(
            reader.read_2d("psl", 3),
            Err(ReaderError::TimeOutOfRange { t: 3, ntimes: 1 })
        ));
    }

    #[test]
    fn test_shape_mismatch_detected() {
        let mut reader = small_reader();
        reader.push_step(StepFields {
            u: Field3::zeros(6, 5, 4),
            v: Field3::zeros(6, 5, 4),
            temp: Field3::zeros(6, 5, 4),
            psl: Field2::constant(4, 5, 101_000.0), // wrong nlon
            u10: Field2::zeros(6, 5),
            tsu: None,
            zs: None,
        });
        assert!(matches!(
            reader.read_2d("psl", 1),
            Err(ReaderError::ShapeMismatch { .. })
        ));
    }
}
