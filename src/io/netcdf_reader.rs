//! NetCDF-backed field reader (requires the `netcdf` feature).

use std::path::Path;

use crate::fields::{Field2, Field3};
use crate::io::{FieldReader, GridDims, ReaderError};

/// Aliases tried per logical variable name, in order.
const VARIABLE_ALIASES: &[(&str, &[&str])] = &[
    ("psl", &["psl", "prmsl", "slp", "msl"]),
    ("u10", &["u10", "si10", "sfcwind", "wnd10m"]),
    ("tsu", &["tsu", "ts", "skt", "sst"]),
    ("zs", &["zs", "orog", "topo", "zsfc"]),
    ("temp", &["temp", "ta", "t", "air"]),
    ("u", &["u", "ua", "uwnd"]),
    ("v", &["v", "va", "vwnd"]),
];

const LON_ALIASES: &[&str] = &["lon", "longitude"];
const LAT_ALIASES: &[&str] = &["lat", "latitude"];
const LEVEL_ALIASES: &[&str] = &["lev", "level", "plev", "pressure"];

/// Reader over a single NetCDF archive holding all input variables.
///
/// Coordinate vectors are cached at open time; field variables are read
/// one time slice at a time. Variable names are resolved against common
/// reanalysis aliases (`psl`/`prmsl`/`msl`, `temp`/`ta`/`air`, ...), and
/// pressure levels stored in Pa are converted to hPa.
pub struct NetCdfReader {
    file: netcdf::File,
    lon: Vec<f64>,
    lat: Vec<f64>,
    levels: Vec<f64>,
    ntimes: usize,
}

impl NetCdfReader {
    /// Open an archive and resolve its coordinates.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let file = netcdf::open(path)?;

        let lon = read_coord(&file, LON_ALIASES)?;
        let lat = read_coord(&file, LAT_ALIASES)?;
        let mut levels = read_coord(&file, LEVEL_ALIASES)?;
        if levels.iter().cloned().fold(f64::MIN, f64::max) > 10_000.0 {
            // Stored in Pa.
            for l in &mut levels {
                *l /= 100.0;
            }
        }

        let time_var = file
            .variable("time")
            .ok_or_else(|| ReaderError::MissingVariable("time".to_string()))?;
        let time: Vec<f64> = time_var.get_values(..)?;
        let ntimes = time.len();

        Ok(Self {
            file,
            lon,
            lat,
            levels,
            ntimes,
        })
    }

    fn resolve(&self, name: &str) -> Option<netcdf::Variable<'_>> {
        let aliases = VARIABLE_ALIASES
            .iter()
            .find(|(logical, _)| *logical == name)
            .map(|(_, aliases)| *aliases)?;
        aliases.iter().find_map(|alias| self.file.variable(alias))
    }

    fn check_time(&self, t: usize) -> Result<(), ReaderError> {
        if t >= self.ntimes {
            return Err(ReaderError::TimeOutOfRange {
                t,
                ntimes: self.ntimes,
            });
        }
        Ok(())
    }
}

fn read_coord(file: &netcdf::File, aliases: &[&str]) -> Result<Vec<f64>, ReaderError> {
    for alias in aliases {
        if let Some(var) = file.variable(alias) {
            let values: Vec<f64> = var.get_values(..)?;
            return Ok(values);
        }
    }
    Err(ReaderError::MissingVariable(aliases.join("/")))
}

impl FieldReader for NetCdfReader {
    fn dims(&self) -> GridDims {
        GridDims {
            nlon: self.lon.len(),
            nlat: self.lat.len(),
            nlevs: self.levels.len(),
            ntimes: self.ntimes,
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
        self.resolve(name).is_some()
    }

    fn read_2d(&self, name: &str, t: usize) -> Result<Field2, ReaderError> {
        self.check_time(t)?;
        let var = self
            .resolve(name)
            .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?;
        let nlat = self.lat.len();
        let nlon = self.lon.len();
        let values: Vec<f64> = var.get_values((t..t + 1, 0..nlat, 0..nlon))?;
        Field2::from_vec(nlon, nlat, values).ok_or_else(|| ReaderError::ShapeMismatch {
            name: name.to_string(),
            expected: format!("{nlat} x {nlon}"),
            got: "flat slice of different length".to_string(),
        })
    }

    fn read_3d(&self, name: &str, t: usize) -> Result<Field3, ReaderError> {
        self.check_time(t)?;
        let var = self
            .resolve(name)
            .ok_or_else(|| ReaderError::MissingVariable(name.to_string()))?;
        let nlevs = self.levels.len();
        let nlat = self.lat.len();
        let nlon = self.lon.len();
        let values: Vec<f64> = var.get_values((t..t + 1, 0..nlevs, 0..nlat, 0..nlon))?;
        Field3::from_vec(nlon, nlat, nlevs, values).ok_or_else(|| ReaderError::ShapeMismatch {
            name: name.to_string(),
            expected: format!("{nlevs} x {nlat} x {nlon}"),
            got: "flat slice of different length".to_string(),
        })
    }
}
