//! Grid description and per-run geometry precomputation.
//!
//! The detection engine works on a regular latitude/longitude grid with a
//! small set of privileged pressure levels (850, 700, 500 and 300 hPa).
//! [`Grid`] holds the immutable coordinate vectors and the indices of those
//! levels; [`GeometryTable`] holds per-cell metric spacings and search
//! half-widths derived from a physical radius.

mod geometry;

pub use geometry::{GeometryTable, EARTH_RADIUS};

use thiserror::Error;

/// Error type for grid construction and geometry precomputation.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// A privileged pressure level is absent from the level coordinate.
    #[error("pressure level {0} hPa not found in level coordinate")]
    MissingPressureLevel(f64),

    /// Grid too small to carry the finite-difference stencils.
    #[error("grid too small: {nlon} x {nlat} (need at least 3 x 3)")]
    GridTooSmall { nlon: usize, nlat: usize },

    /// A metric spacing came out non-positive or non-finite.
    #[error("degenerate grid spacing at cell ({i}, {j})")]
    DegenerateSpacing { i: usize, j: usize },
}

/// Indices of the four privileged pressure levels in the level coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PressureLevels {
    /// Index of the 850 hPa level.
    pub i850: usize,
    /// Index of the 700 hPa level.
    pub i700: usize,
    /// Index of the 500 hPa level.
    pub i500: usize,
    /// Index of the 300 hPa level.
    pub i300: usize,
}

/// Immutable per-run grid description.
#[derive(Clone, Debug)]
pub struct Grid {
    /// Longitudes in degrees, length `nlon`.
    pub lon: Vec<f64>,
    /// Latitudes in degrees, length `nlat`.
    pub lat: Vec<f64>,
    /// Pressure levels in hPa, length `nlevs`.
    pub levels: Vec<f64>,
    /// Privileged pressure-level indices.
    pub plev: PressureLevels,
}

impl Grid {
    /// Build a grid from coordinate vectors, resolving the privileged
    /// pressure levels.
    ///
    /// # Errors
    /// - [`GeometryError::GridTooSmall`] if either horizontal dimension is
    ///   below 3
    /// - [`GeometryError::MissingPressureLevel`] if 850, 700, 500 or
    ///   300 hPa is absent from `levels`
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, levels: Vec<f64>) -> Result<Self, GeometryError> {
        if lon.len() < 3 || lat.len() < 3 {
            return Err(GeometryError::GridTooSmall {
                nlon: lon.len(),
                nlat: lat.len(),
            });
        }
        let plev = PressureLevels {
            i850: find_level(&levels, 850.0)?,
            i700: find_level(&levels, 700.0)?,
            i500: find_level(&levels, 500.0)?,
            i300: find_level(&levels, 300.0)?,
        };
        Ok(Self {
            lon,
            lat,
            levels,
            plev,
        })
    }

    /// Number of zonal points.
    #[inline]
    pub fn nlon(&self) -> usize {
        self.lon.len()
    }

    /// Number of meridional points.
    #[inline]
    pub fn nlat(&self) -> usize {
        self.lat.len()
    }

    /// Number of pressure levels.
    #[inline]
    pub fn nlevs(&self) -> usize {
        self.levels.len()
    }

    /// Whether meridional index `j` lies in the Northern Hemisphere.
    ///
    /// The equator counts as northern, matching the vorticity sign
    /// convention.
    #[inline]
    pub fn is_northern(&self, j: usize) -> bool {
        self.lat[j] >= 0.0
    }
}

/// Locate a pressure level by value (hPa).
fn find_level(levels: &[f64], target: f64) -> Result<usize, GeometryError> {
    levels
        .iter()
        .position(|&l| (l - target).abs() < 1e-3)
        .ok_or(GeometryError::MissingPressureLevel(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree_range(start: f64, n: usize) -> Vec<f64> {
        (0..n).map(|k| start + k as f64).collect()
    }

    #[test]
    fn test_grid_resolves_pressure_levels() {
        let grid = Grid::new(
            degree_range(0.0, 10),
            degree_range(-5.0, 10),
            vec![1000.0, 850.0, 700.0, 500.0, 300.0, 200.0],
        )
        .unwrap();
        assert_eq!(grid.plev.i850, 1);
        assert_eq!(grid.plev.i700, 2);
        assert_eq!(grid.plev.i500, 3);
        assert_eq!(grid.plev.i300, 4);
    }

    #[test]
    fn test_grid_missing_level() {
        let result = Grid::new(
            degree_range(0.0, 10),
            degree_range(-5.0, 10),
            vec![850.0, 700.0, 500.0],
        );
        assert!(matches!(
            result,
            Err(GeometryError::MissingPressureLevel(l)) if (l - 300.0).abs() < 1e-9
        ));
    }

    #[test]
    fn test_grid_too_small() {
        let result = Grid::new(
            vec![0.0, 1.0],
            degree_range(0.0, 10),
            vec![850.0, 700.0, 500.0, 300.0],
        );
        assert!(matches!(result, Err(GeometryError::GridTooSmall { .. })));
    }

    #[test]
    fn test_hemisphere_convention() {
        let grid = Grid::new(
            degree_range(0.0, 5),
            vec![-2.0, -1.0, 0.0, 1.0, 2.0],
            vec![850.0, 700.0, 500.0, 300.0],
        )
        .unwrap();
        assert!(!grid.is_northern(0));
        assert!(grid.is_northern(2));
        assert!(grid.is_northern(4));
    }
}
