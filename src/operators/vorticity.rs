//! Relative vorticity at 850 hPa.

use crate::fields::{Field2, FieldFrame};
use crate::grid::{GeometryTable, Grid};

/// 4th-order centred finite-difference curl of the horizontal wind at
/// 850 hPa.
///
/// The stencil spans two cells on each side, so values are computed on
/// `3 <= i <= nlon - 3`, `3 <= j <= nlat - 3`; cells outside that range
/// stay zero and never pass the vorticity criterion downstream.
pub fn relative_vorticity(frame: &FieldFrame, grid: &Grid, geom: &GeometryTable) -> Field2 {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let k850 = grid.plev.i850;
    let mut vort = Field2::zeros(nlon, nlat);

    if nlon < 6 || nlat < 6 {
        return vort;
    }

    for j in 3..=nlat - 3 {
        for i in 3..=nlon - 3 {
            let dx = geom.dx(i, j);
            let dy = geom.dy(i, j);
            let dvdx = central_4th(
                frame.v.at(k850, i + 1, j),
                frame.v.at(k850, i - 1, j),
                frame.v.at(k850, i + 2, j),
                frame.v.at(k850, i - 2, j),
                dx,
            );
            let dudy = central_4th(
                frame.u.at(k850, i, j + 1),
                frame.u.at(k850, i, j - 1),
                frame.u.at(k850, i, j + 2),
                frame.u.at(k850, i, j - 2),
                dy,
            );
            vort.set(i, j, dvdx - dudy);
        }
    }
    vort
}

/// `(2/3)(f[+1] - f[-1])/d - (1/12)(f[+2] - f[-2])/d`
#[inline]
fn central_4th(fp1: f64, fm1: f64, fp2: f64, fm2: f64, d: f64) -> f64 {
    (2.0 / 3.0) * (fp1 - fm1) / d - (1.0 / 12.0) * (fp2 - fm2) / d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field2, Field3};
    use crate::grid::GeometryTable;

    fn test_grid() -> (Grid, GeometryTable) {
        let lon: Vec<f64> = (0..21).map(|k| 140.0 + k as f64).collect();
        let lat: Vec<f64> = (0..21).map(|k| -10.0 + k as f64).collect();
        let grid = Grid::new(lon, lat, vec![850.0, 700.0, 500.0, 300.0]).unwrap();
        let geom = GeometryTable::compute(&grid, 300_000.0).unwrap();
        (grid, geom)
    }

    fn frame_with_winds(grid: &Grid, u850: &Field2, v850: &Field2) -> FieldFrame {
        let nlon = grid.nlon();
        let nlat = grid.nlat();
        let mut u = Field3::zeros(nlon, nlat, 4);
        let mut v = Field3::zeros(nlon, nlat, 4);
        for j in 0..nlat {
            for i in 0..nlon {
                u.set(grid.plev.i850, i, j, u850.at(i, j));
                v.set(grid.plev.i850, i, j, v850.at(i, j));
            }
        }
        FieldFrame {
            u,
            v,
            t: Field3::zeros(nlon, nlat, 4),
            pmsl: Field2::constant(nlon, nlat, 101_000.0),
            u10: Field2::zeros(nlon, nlat),
            zs: None,
            tsu: None,
        }
    }

    #[test]
    fn test_uniform_flow_has_zero_vorticity() {
        let (grid, geom) = test_grid();
        let u850 = Field2::constant(grid.nlon(), grid.nlat(), 8.0);
        let v850 = Field2::constant(grid.nlon(), grid.nlat(), -3.0);
        let frame = frame_with_winds(&grid, &u850, &v850);
        let vort = relative_vorticity(&frame, &grid, &geom);
        for j in 0..grid.nlat() {
            for i in 0..grid.nlon() {
                assert!(vort.at(i, j).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_linear_shear_recovered_exactly() {
        // v grows linearly with i, so dv/dx = slope / dx and the 4th-order
        // stencil is exact.
        let (grid, geom) = test_grid();
        let slope = 2.0;
        let mut v850 = Field2::zeros(grid.nlon(), grid.nlat());
        for j in 0..grid.nlat() {
            for i in 0..grid.nlon() {
                v850.set(i, j, slope * i as f64);
            }
        }
        let u850 = Field2::zeros(grid.nlon(), grid.nlat());
        let frame = frame_with_winds(&grid, &u850, &v850);
        let vort = relative_vorticity(&frame, &grid, &geom);

        let (i, j) = (10, 10);
        let expected = slope / geom.dx(i, j);
        assert!(
            (vort.at(i, j) - expected).abs() < 1e-9 * expected.abs(),
            "vort={}, expected={}",
            vort.at(i, j),
            expected
        );
    }

    #[test]
    fn test_cyclonic_northern_flow_is_positive() {
        // Counter-clockwise rotation around the domain centre.
        let (grid, geom) = test_grid();
        let (ic, jc) = (10i64, 15i64);
        let mut u850 = Field2::zeros(grid.nlon(), grid.nlat());
        let mut v850 = Field2::zeros(grid.nlon(), grid.nlat());
        for j in 0..grid.nlat() {
            for i in 0..grid.nlon() {
                let x = i as i64 - ic;
                let y = j as i64 - jc;
                u850.set(i, j, -0.5 * y as f64);
                v850.set(i, j, 0.5 * x as f64);
            }
        }
        let frame = frame_with_winds(&grid, &u850, &v850);
        let vort = relative_vorticity(&frame, &grid, &geom);
        // jc = 15 sits at lat +5, Northern Hemisphere.
        assert!(grid.is_northern(15));
        assert!(vort.at(10, 15) > 0.0);
    }

    #[test]
    fn test_stencil_margin_left_at_zero() {
        let (grid, geom) = test_grid();
        let mut v850 = Field2::zeros(grid.nlon(), grid.nlat());
        for j in 0..grid.nlat() {
            for i in 0..grid.nlon() {
                v850.set(i, j, i as f64);
            }
        }
        let u850 = Field2::zeros(grid.nlon(), grid.nlat());
        let frame = frame_with_winds(&grid, &u850, &v850);
        let vort = relative_vorticity(&frame, &grid, &geom);
        let n = grid.nlon();
        for j in 0..grid.nlat() {
            assert_eq!(vort.at(0, j), 0.0);
            assert_eq!(vort.at(2, j), 0.0);
            assert_eq!(vort.at(n - 1, j), 0.0);
            assert_eq!(vort.at(n - 2, j), 0.0);
        }
    }
}
