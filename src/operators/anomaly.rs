//! Box-mean temperature, wind-speed and MSLP fields and their anomalies.

use tracing::warn;

use crate::fields::{DerivedFrame, Field2, FieldFrame};
use crate::grid::{GeometryTable, Grid};
use crate::operators::NumericError;

/// Compute the anomaly and mean fields for one time step.
///
/// For each cell the temperature-search box (half-widths `nxtwidth`,
/// `nytwidth`) supplies means at 850/700/500/300 hPa, and the wind-search
/// box (half-widths `nxwidth`, `nywidth`) supplies mean wind magnitude at
/// 850 and 300 hPa and mean MSLP. Both boxes keep their full cell count at
/// the domain edge by sliding inward rather than shrinking.
///
/// The returned frame has its `vort` field zeroed; the vorticity operator
/// fills it separately.
///
/// # Errors
/// [`NumericError::NonFiniteMean`] if any box mean is NaN or infinite.
pub fn compute_anomalies(
    frame: &FieldFrame,
    grid: &Grid,
    geom: &GeometryTable,
) -> Result<DerivedFrame, NumericError> {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let (mag850, mag300) = wind_magnitudes(frame, grid);
    let mut derived = DerivedFrame::zeros(nlon, nlat);

    for j in 0..nlat {
        let row = anomaly_row(frame, grid, geom, &mag850, &mag300, j)?;
        store_row(&mut derived, &row, j);
    }
    Ok(derived)
}

/// Data-parallel variant of [`compute_anomalies`], row-per-task.
#[cfg(feature = "parallel")]
pub fn compute_anomalies_parallel(
    frame: &FieldFrame,
    grid: &Grid,
    geom: &GeometryTable,
) -> Result<DerivedFrame, NumericError> {
    use rayon::prelude::*;

    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let (mag850, mag300) = wind_magnitudes(frame, grid);

    let rows: Vec<RowAnomalies> = (0..nlat)
        .into_par_iter()
        .map(|j| anomaly_row(frame, grid, geom, &mag850, &mag300, j))
        .collect::<Result<_, _>>()?;

    let mut derived = DerivedFrame::zeros(nlon, nlat);
    for (j, row) in rows.iter().enumerate() {
        store_row(&mut derived, row, j);
    }
    Ok(derived)
}

/// Per-cell wind magnitude at the 850 and 300 hPa levels.
fn wind_magnitudes(frame: &FieldFrame, grid: &Grid) -> (Field2, Field2) {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let (k850, k300) = (grid.plev.i850, grid.plev.i300);
    let mut mag850 = Field2::zeros(nlon, nlat);
    let mut mag300 = Field2::zeros(nlon, nlat);
    for j in 0..nlat {
        for i in 0..nlon {
            mag850.set(i, j, frame.u.at(k850, i, j).hypot(frame.v.at(k850, i, j)));
            mag300.set(i, j, frame.u.at(k300, i, j).hypot(frame.v.at(k300, i, j)));
        }
    }
    (mag850, mag300)
}

/// One grid row of anomaly output.
struct RowAnomalies {
    tanom850: Vec<f64>,
    tanom300: Vec<f64>,
    tanomdiff: Vec<f64>,
    tanomsum: Vec<f64>,
    wspdchek: Vec<f64>,
    pmslanom: Vec<f64>,
}

fn store_row(derived: &mut DerivedFrame, row: &RowAnomalies, j: usize) {
    for i in 0..row.tanom850.len() {
        derived.tanom850.set(i, j, row.tanom850[i]);
        derived.tanom300.set(i, j, row.tanom300[i]);
        derived.tanomdiff.set(i, j, row.tanomdiff[i]);
        derived.tanomsum.set(i, j, row.tanomsum[i]);
        derived.wspdchek.set(i, j, row.wspdchek[i]);
        derived.pmslanom.set(i, j, row.pmslanom[i]);
    }
}

fn anomaly_row(
    frame: &FieldFrame,
    grid: &Grid,
    geom: &GeometryTable,
    mag850: &Field2,
    mag300: &Field2,
    j: usize,
) -> Result<RowAnomalies, NumericError> {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let plev = grid.plev;
    let mut row = RowAnomalies {
        tanom850: vec![0.0; nlon],
        tanom300: vec![0.0; nlon],
        tanomdiff: vec![0.0; nlon],
        tanomsum: vec![0.0; nlon],
        wspdchek: vec![0.0; nlon],
        pmslanom: vec![0.0; nlon],
    };

    for i in 0..nlon {
        // Temperature box.
        let (imin, imax) = slide_box(i, geom.nxtwidth(i, j), nlon);
        let (jmin, jmax) = slide_box(j, geom.nytwidth(i, j), nlat);
        let count = (imax - imin + 1) * (jmax - jmin + 1);
        if count == 0 {
            warn!(i, j, "empty temperature box, keeping prior anomaly values");
            continue;
        }
        let mut sum850 = 0.0;
        let mut sum700 = 0.0;
        let mut sum500 = 0.0;
        let mut sum300 = 0.0;
        for jj in jmin..=jmax {
            for ii in imin..=imax {
                sum850 += frame.t.at(plev.i850, ii, jj);
                sum700 += frame.t.at(plev.i700, ii, jj);
                sum500 += frame.t.at(plev.i500, ii, jj);
                sum300 += frame.t.at(plev.i300, ii, jj);
            }
        }
        let n = count as f64;
        let (mean850, mean700, mean500, mean300) =
            (sum850 / n, sum700 / n, sum500 / n, sum300 / n);
        for (name, m) in [
            ("t850", mean850),
            ("t700", mean700),
            ("t500", mean500),
            ("t300", mean300),
        ] {
            if !m.is_finite() {
                return Err(NumericError::NonFiniteMean { field: name, i, j });
            }
        }
        let a850 = frame.t.at(plev.i850, i, j) - mean850;
        let a700 = frame.t.at(plev.i700, i, j) - mean700;
        let a500 = frame.t.at(plev.i500, i, j) - mean500;
        let a300 = frame.t.at(plev.i300, i, j) - mean300;
        row.tanom850[i] = a850;
        row.tanom300[i] = a300;
        row.tanomdiff[i] = a300 - a850;
        row.tanomsum[i] = a700 + a500 + a300;

        // Wind box.
        let (imin, imax) = slide_box(i, geom.nxwidth(i, j), nlon);
        let (jmin, jmax) = slide_box(j, geom.nywidth(i, j), nlat);
        let count = (imax - imin + 1) * (jmax - jmin + 1);
        if count == 0 {
            warn!(i, j, "empty wind box, keeping prior mean values");
            continue;
        }
        let mut sum_w850 = 0.0;
        let mut sum_w300 = 0.0;
        let mut sum_pmsl = 0.0;
        for jj in jmin..=jmax {
            for ii in imin..=imax {
                sum_w850 += mag850.at(ii, jj);
                sum_w300 += mag300.at(ii, jj);
                sum_pmsl += frame.pmsl.at(ii, jj);
            }
        }
        let n = count as f64;
        let (mean_w850, mean_w300, mean_pmsl) = (sum_w850 / n, sum_w300 / n, sum_pmsl / n);
        for (name, m) in [
            ("wind850", mean_w850),
            ("wind300", mean_w300),
            ("mslp", mean_pmsl),
        ] {
            if !m.is_finite() {
                return Err(NumericError::NonFiniteMean { field: name, i, j });
            }
        }
        row.wspdchek[i] = mean_w850 - mean_w300;
        row.pmslanom[i] = frame.pmsl.at(i, j) - mean_pmsl;
    }

    Ok(row)
}

/// Inclusive `[min, max]` search window of half-width `half` around
/// `center`, slid inward at the domain edge so the cell count stays at
/// `2 * half + 1` wherever the axis is long enough.
fn slide_box(center: usize, half: usize, n: usize) -> (usize, usize) {
    let n1 = n as i64 - 1;
    let h = half as i64;
    let c = center as i64;
    let max = (c + h).min(n1).max(2 * h).clamp(0, n1);
    let min = (c - h).max(0).min(n1 - 2 * h).clamp(0, n1);
    (min as usize, max as usize)
}
