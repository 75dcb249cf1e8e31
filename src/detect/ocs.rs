//! Circulation strength on a 5x5 stencil around the pressure centre.

use crate::fields::FieldFrame;
use crate::grid::Grid;

/// Tangential-wind weights, indexed `[di + 2][dj + 2]`.
pub const OCS_WEIGHTS: [[f64; 5]; 5] = [
    [0.000, 0.031, 0.055, 0.031, 0.000],
    [0.030, 0.078, 0.056, 0.078, 0.030],
    [0.053, 0.057, 0.000, 0.057, 0.053],
    [0.030, 0.078, 0.056, 0.078, 0.030],
    [0.000, 0.031, 0.055, 0.031, 0.000],
];

/// Weighted tangential-wind sum around the centre `(ips, jps)`.
///
/// Each stencil point projects its 850 hPa wind onto the local tangential
/// direction, scaled down to the surface by the ratio of 10 m wind speed
/// to 850 hPa wind speed. The hemisphere sign convention makes cyclonic
/// tangential flow contribute positively on both sides of the equator.
///
/// The caller must keep the stencil inside the grid (`2 <= ips < nlon - 2`
/// and likewise for `jps`); the bounds criterion upstream guarantees this.
pub fn circulation_strength(frame: &FieldFrame, grid: &Grid, ips: usize, jps: usize) -> f64 {
    debug_assert!(ips >= 2 && ips + 2 < grid.nlon());
    debug_assert!(jps >= 2 && jps + 2 < grid.nlat());

    let k850 = grid.plev.i850;
    let northern = grid.is_northern(jps);
    let mut ocs = 0.0;

    for dj in -2i64..=2 {
        for di in -2i64..=2 {
            if di == 0 && dj == 0 {
                continue;
            }
            let i = (ips as i64 + di) as usize;
            let j = (jps as i64 + dj) as usize;
            let dist = ((di * di + dj * dj) as f64).sqrt();
            let cos_theta = di as f64 / dist;
            let sin_theta = dj as f64 / dist;

            let u850 = frame.u.at(k850, i, j);
            let v850 = frame.v.at(k850, i, j);
            let umag850 = u850.hypot(v850);
            if umag850 == 0.0 {
                continue;
            }
            let ratio = frame.u10.at(i, j) / umag850;
            let utan = ratio
                * (u850 * sin_theta - v850 * cos_theta)
                * OCS_WEIGHTS[(di + 2) as usize][(dj + 2) as usize];

            if northern {
                ocs -= utan;
            } else {
                ocs += utan;
            }
        }
    }
    ocs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Field2, Field3};

    fn grid_with_lats(lats: Vec<f64>) -> Grid {
        let lon: Vec<f64> = (0..9).map(|k| 100.0 + k as f64).collect();
        Grid::new(lon, lats, vec![850.0, 700.0, 500.0, 300.0]).unwrap()
    }

    /// Rotating flow around the domain centre: `spin > 0` is
    /// counter-clockwise (Northern-Hemisphere cyclonic).
    fn rotating_frame(grid: &Grid, ic: usize, jc: usize, spin: f64) -> FieldFrame {
        let nlon = grid.nlon();
        let nlat = grid.nlat();
        let k850 = grid.plev.i850;
        let mut u = Field3::zeros(nlon, nlat, 4);
        let mut v = Field3::zeros(nlon, nlat, 4);
        let mut u10 = Field2::zeros(nlon, nlat);
        for j in 0..nlat {
            for i in 0..nlon {
                let x = i as f64 - ic as f64;
                let y = j as f64 - jc as f64;
                let uu = -spin * y;
                let vv = spin * x;
                u.set(k850, i, j, uu);
                v.set(k850, i, j, vv);
                u10.set(i, j, uu.hypot(vv));
            }
        }
        FieldFrame {
            u,
            v,
            t: Field3::zeros(nlon, nlat, 4),
            pmsl: Field2::constant(nlon, nlat, 101_000.0),
            u10,
            zs: None,
            tsu: None,
        }
    }

    #[test]
    fn test_weights_total() {
        let total: f64 = OCS_WEIGHTS.iter().flatten().sum();
        assert!((total - 0.998).abs() < 1e-9, "weight total {total}");
    }

    #[test]
    fn test_northern_cyclone_positive() {
        let grid = grid_with_lats((0..9).map(|k| 11.0 + k as f64).collect());
        let frame = rotating_frame(&grid, 4, 4, 1.0);
        let ocs = circulation_strength(&frame, &grid, 4, 4);
        assert!(ocs > 0.0, "ocs = {ocs}");
    }

    #[test]
    fn test_northern_anticyclone_negative() {
        let grid = grid_with_lats((0..9).map(|k| 11.0 + k as f64).collect());
        let frame = rotating_frame(&grid, 4, 4, -1.0);
        let ocs = circulation_strength(&frame, &grid, 4, 4);
        assert!(ocs < 0.0, "ocs = {ocs}");
    }

    #[test]
    fn test_hemisphere_symmetry() {
        // A Southern-Hemisphere cyclone (clockwise) and its Northern
        // mirror produce the same circulation strength.
        let sh_grid = grid_with_lats((0..9).map(|k| -19.0 + k as f64).collect());
        let nh_grid = grid_with_lats((0..9).map(|k| 11.0 + k as f64).collect());
        let sh_frame = rotating_frame(&sh_grid, 4, 4, -1.0);
        let nh_frame = rotating_frame(&nh_grid, 4, 4, 1.0);
        let sh = circulation_strength(&sh_frame, &sh_grid, 4, 4);
        let nh = circulation_strength(&nh_frame, &nh_grid, 4, 4);
        assert!((sh - nh).abs() < 1e-12, "sh = {sh}, nh = {nh}");
        assert!(sh > 0.0);
    }

    #[test]
    fn test_calm_stencil_point_skipped() {
        let grid = grid_with_lats((0..9).map(|k| 11.0 + k as f64).collect());
        let mut frame = rotating_frame(&grid, 4, 4, 1.0);
        // Zero out one stencil point entirely; the sum must stay finite.
        frame.u.set(grid.plev.i850, 5, 4, 0.0);
        frame.v.set(grid.plev.i850, 5, 4, 0.0);
        let ocs = circulation_strength(&frame, &grid, 4, 4);
        assert!(ocs.is_finite());
        assert!(ocs > 0.0);
    }
}
