//! Per-cell search half-widths and metric spacings.

use crate::fields::Field2;
use crate::grid::{GeometryError, Grid};

/// Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6.37122e6;

/// Per-cell search geometry, computed once at startup.
///
/// For every interior cell the table carries the metric spacings `dx`, `dy`
/// and the search half-widths in grid points:
///
/// - wind box: `nxwidth`, `nywidth` (each rounded from `radius / spacing`
///   and forced even)
/// - temperature box: `nxtwidth = 2 * nxwidth`, `nytwidth = nxwidth`
///   (anisotropic, wider zonally)
///
/// Boundary rows and columns inherit the values of their nearest interior
/// neighbour.
#[derive(Clone, Debug)]
pub struct GeometryTable {
    nlon: usize,
    nlat: usize,
    nxwidth: Vec<usize>,
    nywidth: Vec<usize>,
    dx: Field2,
    dy: Field2,
}

impl GeometryTable {
    /// Precompute the table for a grid and a physical search radius (m).
    ///
    /// # Errors
    /// [`GeometryError::DegenerateSpacing`] if any interior spacing is
    /// non-positive or non-finite.
    pub fn compute(grid: &Grid, radius: f64) -> Result<Self, GeometryError> {
        let nlon = grid.nlon();
        let nlat = grid.nlat();
        let mut nxwidth = vec![0usize; nlon * nlat];
        let mut nywidth = vec![0usize; nlon * nlat];
        let mut dx = Field2::zeros(nlon, nlat);
        let mut dy = Field2::zeros(nlon, nlat);

        for j in 1..nlat - 1 {
            let dlat = 0.5 * (grid.lat[j + 1] - grid.lat[j - 1]).to_radians();
            let cell_dy = EARTH_RADIUS * dlat;
            let coslat = grid.lat[j].to_radians().cos();
            for i in 1..nlon - 1 {
                let dlon = 0.5 * (grid.lon[i + 1] - grid.lon[i - 1]).to_radians();
                let cell_dx = EARTH_RADIUS * coslat * dlon;
                if !(cell_dx.is_finite() && cell_dy.is_finite()) || cell_dx <= 0.0 || cell_dy <= 0.0
                {
                    return Err(GeometryError::DegenerateSpacing { i, j });
                }
                dx.set(i, j, cell_dx);
                dy.set(i, j, cell_dy);
                nxwidth[j * nlon + i] = round_up_to_even(radius / cell_dx);
                nywidth[j * nlon + i] = round_up_to_even(radius / cell_dy);
            }
        }

        // Boundary cells inherit from the nearest interior neighbour.
        for j in 0..nlat {
            let jc = j.clamp(1, nlat - 2);
            for i in 0..nlon {
                let ic = i.clamp(1, nlon - 2);
                if ic == i && jc == j {
                    continue;
                }
                nxwidth[j * nlon + i] = nxwidth[jc * nlon + ic];
                nywidth[j * nlon + i] = nywidth[jc * nlon + ic];
                dx.set(i, j, dx.at(ic, jc));
                dy.set(i, j, dy.at(ic, jc));
            }
        }

        Ok(Self {
            nlon,
            nlat,
            nxwidth,
            nywidth,
            dx,
            dy,
        })
    }

    /// Zonal wind half-width at `(i, j)` in grid points.
    #[inline]
    pub fn nxwidth(&self, i: usize, j: usize) -> usize {
        self.nxwidth[j * self.nlon + i]
    }

    /// Meridional wind half-width at `(i, j)` in grid points.
    #[inline]
    pub fn nywidth(&self, i: usize, j: usize) -> usize {
        self.nywidth[j * self.nlon + i]
    }

    /// Zonal temperature half-width: twice the wind half-width.
    #[inline]
    pub fn nxtwidth(&self, i: usize, j: usize) -> usize {
        2 * self.nxwidth(i, j)
    }

    /// Meridional temperature half-width: equal to the zonal wind
    /// half-width.
    #[inline]
    pub fn nytwidth(&self, i: usize, j: usize) -> usize {
        self.nxwidth(i, j)
    }

    /// Zonal metric spacing at `(i, j)` in metres.
    #[inline]
    pub fn dx(&self, i: usize, j: usize) -> f64 {
        self.dx.at(i, j)
    }

    /// Meridional metric spacing at `(i, j)` in metres.
    #[inline]
    pub fn dy(&self, i: usize, j: usize) -> f64 {
        self.dy.at(i, j)
    }

    /// Number of zonal points.
    #[inline]
    pub fn nlon(&self) -> usize {
        self.nlon
    }

    /// Number of meridional points.
    #[inline]
    pub fn nlat(&self) -> usize {
        self.nlat
    }
}

/// Round to nearest integer, then bump odd results up by one.
fn round_up_to_even(x: f64) -> usize {
    let r = x.round().max(0.0) as usize;
    if r % 2 == 1 {
        r + 1
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_degree_grid(lat0: f64, nlat: usize) -> Grid {
        let lon: Vec<f64> = (0..20).map(|k| 100.0 + k as f64).collect();
        let lat: Vec<f64> = (0..nlat).map(|k| lat0 + k as f64).collect();
        Grid::new(lon, lat, vec![850.0, 700.0, 500.0, 300.0]).unwrap()
    }

    #[test]
    fn test_widths_are_even() {
        let grid = one_degree_grid(-30.0, 61);
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        for j in 0..geom.nlat() {
            for i in 0..geom.nlon() {
                assert_eq!(geom.nxwidth(i, j) % 2, 0, "nxwidth odd at ({i}, {j})");
                assert_eq!(geom.nywidth(i, j) % 2, 0, "nywidth odd at ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_widths_match_rounded_radius() {
        let grid = one_degree_grid(-30.0, 61);
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        for j in 1..geom.nlat() - 1 {
            for i in 1..geom.nlon() - 1 {
                let expected = (300_000.0 / geom.dx(i, j)).round() as usize;
                let expected = if expected % 2 == 1 {
                    expected + 1
                } else {
                    expected
                };
                assert_eq!(geom.nxwidth(i, j), expected);
            }
        }
    }

    #[test]
    fn test_temperature_box_anisotropy() {
        let grid = one_degree_grid(-20.0, 41);
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        let (i, j) = (10, 20);
        assert_eq!(geom.nxtwidth(i, j), 2 * geom.nxwidth(i, j));
        assert_eq!(geom.nytwidth(i, j), geom.nxwidth(i, j));
    }

    #[test]
    fn test_boundary_inherits_interior() {
        let grid = one_degree_grid(-20.0, 41);
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        let nlon = geom.nlon();
        let nlat = geom.nlat();
        assert_eq!(geom.nxwidth(0, 5), geom.nxwidth(1, 5));
        assert_eq!(geom.nxwidth(nlon - 1, 5), geom.nxwidth(nlon - 2, 5));
        assert_eq!(geom.nywidth(7, 0), geom.nywidth(7, 1));
        assert_eq!(geom.nywidth(7, nlat - 1), geom.nywidth(7, nlat - 2));
        // Corner inherits the interior corner.
        assert_eq!(geom.dx(0, 0), geom.dx(1, 1));
    }

    #[test]
    fn test_zonal_width_grows_poleward() {
        // dx shrinks with cos(lat), so the zonal half-width cannot shrink
        // moving away from the equator.
        let grid = one_degree_grid(0.0, 71);
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        assert!(geom.nxwidth(10, 65) >= geom.nxwidth(10, 5));
    }

    #[test]
    fn test_degenerate_grid_rejected() {
        // Descending latitudes give a negative dy.
        let lon: Vec<f64> = (0..10).map(|k| k as f64).collect();
        let lat: Vec<f64> = (0..10).map(|k| 10.0 - k as f64).collect();
        let grid = Grid::new(lon, lat, vec![850.0, 700.0, 500.0, 300.0]).unwrap();
        let result = GeometryTable::compute(&grid, 300_000.0);
        assert!(matches!(
            result,
            Err(GeometryError::DegenerateSpacing { .. })
        ));
    }

    #[test]
    fn test_round_up_to_even() {
        assert_eq!(round_up_to_even(2.8), 4); // rounds to 3, bumped to 4
        assert_eq!(round_up_to_even(3.6), 4);
        assert_eq!(round_up_to_even(4.2), 4);
        assert_eq!(round_up_to_even(0.2), 0);
        assert_eq!(round_up_to_even(0.8), 2);
    }
}
