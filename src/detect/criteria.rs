//! The fixed-order criterion cascade.

use tracing::debug;

use crate::config::Configuration;
use crate::detect::{circulation_strength, DetectError, Detection, RelaxMask, NVMAX};
use crate::fields::{DerivedFrame, FieldFrame};
use crate::grid::{GeometryTable, Grid};

/// Pressure minima are only considered below this MSLP (Pa).
const PMIN_SCAN_THRESHOLD: f64 = 100_500.0;

/// Minimum skin temperature for the location test (K).
const SST_THRESHOLD: f64 = 299.15;

/// Maximum topography height for the location test (m).
const TOPO_THRESHOLD: f64 = 0.5;

/// Poleward limit of the unrelaxed search (degrees).
const TROPICS_LIMIT: f64 = 30.0;

/// Scan every grid cell and return the detections for one time step.
///
/// Cells outside `|lat| <= 30` are skipped unless the relaxation mask
/// covers them; cells whose wind box extends past the grid edge are
/// skipped outright. The cascade at each remaining cell runs vorticity,
/// pressure minimum, rotation, MSLP anomaly, bounds, maximum wind,
/// location, warm core, upper anomaly, shear and circulation strength, in
/// that order; any failed test suppresses the cell.
///
/// A candidate whose centre falls within one grid point of an already
/// recorded detection is dropped. Exceeding [`NVMAX`] detections aborts
/// the step.
pub fn scan_grid(
    config: &Configuration,
    grid: &Grid,
    geom: &GeometryTable,
    frame: &FieldFrame,
    derived: &DerivedFrame,
    relax: &RelaxMask,
    step: usize,
) -> Result<Vec<Detection>, DetectError> {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let mut detections: Vec<Detection> = Vec::new();

    for j in 0..nlat {
        for i in 0..nlon {
            let relaxed = relax.at(i, j);
            if grid.lat[j].abs() > TROPICS_LIMIT && !relaxed {
                continue;
            }
            let nxw = geom.nxwidth(i, j);
            let nyw = geom.nywidth(i, j);
            if i < nxw || i + nxw >= nlon || j < nyw || j + nyw >= nlat {
                continue;
            }

            let Some(det) = evaluate_cell(config, grid, geom, frame, derived, i, j, relaxed)
            else {
                continue;
            };

            // Near-duplicate centre: an earlier detection within one grid
            // point wins.
            if detections
                .iter()
                .any(|d| d.ips.abs_diff(det.ips) <= 1 && d.jps.abs_diff(det.jps) <= 1)
            {
                continue;
            }
            if detections.len() >= NVMAX {
                return Err(DetectError::Capacity { step });
            }
            detections.push(det);
        }
    }
    Ok(detections)
}

/// Run the cascade at one candidate cell.
#[allow(clippy::too_many_arguments)]
fn evaluate_cell(
    config: &Configuration,
    grid: &Grid,
    geom: &GeometryTable,
    frame: &FieldFrame,
    derived: &DerivedFrame,
    i: usize,
    j: usize,
    relaxed: bool,
) -> Option<Detection> {
    let nlon = grid.nlon();
    let nlat = grid.nlat();
    let nxw = geom.nxwidth(i, j);
    let nyw = geom.nywidth(i, j);
    let probe = config.debug && i == config.id && j == config.jd;

    // 1. Vorticity, flipped so cyclonic rotation is positive in both
    //    hemispheres.
    let vort_cell = derived.vort.at(i, j);
    let vtest = if grid.is_northern(j) {
        vort_cell
    } else {
        -vort_cell
    };
    if probe {
        debug!(i, j, vort = vort_cell, vtest, relaxed, "probe: vorticity test");
    }
    if vtest <= config.vortcrit {
        return None;
    }

    // 2. Pressure minimum within the wind box, then a strict-minimum
    //    check against the eight neighbours.
    let (ips, jps, psmin) = find_pressure_minimum(frame, i, j, nxw, nyw)?;
    for dj in -1i64..=1 {
        for di in -1i64..=1 {
            if di == 0 && dj == 0 {
                continue;
            }
            let ii = ips as i64 + di;
            let jj = jps as i64 + dj;
            if ii < 0 || jj < 0 || ii >= nlon as i64 || jj >= nlat as i64 {
                continue;
            }
            if frame.pmsl.at(ii as usize, jj as usize) < psmin {
                return None;
            }
        }
    }
    if probe {
        debug!(ips, jps, psmin, "probe: pressure minimum");
    }

    // 3. Low-level rotation across the centre.
    if ips < 2 || ips + 2 >= nlon || jps < 2 || jps + 2 >= nlat {
        return None;
    }
    let k850 = grid.plev.i850;
    let u_south = frame.u.at(k850, ips, jps - 2);
    let u_north = frame.u.at(k850, ips, jps + 2);
    let v_west = frame.v.at(k850, ips - 2, jps);
    let v_east = frame.v.at(k850, ips + 2, jps);
    if u_south * u_north >= 0.0 || v_west * v_east >= 0.0 {
        return None;
    }

    // 4. MSLP anomaly at the centre.
    if derived.pmslanom.at(ips, jps) > -config.pmslcrit * 100.0 {
        return None;
    }

    // 5. Centre far enough from the grid edge for the remaining stencils.
    if ips < 3 || ips > nlon - 3 || jps < 3 || jps > nlat - 3 {
        return None;
    }

    // 6. Maximum 10 m wind in the box around the centre, truncated at the
    //    grid edge.
    let (mut wmax, mut iwmax, mut jwmax) = find_wind_maximum(frame, ips, jps, nxw, nyw);
    if wmax < config.wind_threshold(relaxed) {
        return None;
    }

    // 7. Location: warm sea surface, negligible topography. Skipped when
    //    disabled, when the surface fields are absent, or under
    //    relaxation.
    if config.use_location_checks && !relaxed {
        if let (Some(tsu), Some(zs)) = (&frame.tsu, &frame.zs) {
            if tsu.at(ips, jps) < SST_THRESHOLD || zs.at(ips, jps) > TOPO_THRESHOLD {
                return None;
            }
        }
    }

    // 8. Warm-core anomaly sum.
    let tsum = derived.tanomsum.at(ips, jps);
    if tsum <= config.tcrit && !relaxed {
        return None;
    }

    // 9. Upper-level warm anomaly.
    let ttest = if config.t300flag {
        derived.tanom850.at(ips, jps)
    } else {
        config.t300crit
    };
    if derived.tanom300.at(ips, jps) < ttest && !relaxed {
        return None;
    }

    // 10. Vertical wind-speed shear.
    if derived.wspdchek.at(ips, jps) < config.wchkcrit && !relaxed {
        return None;
    }

    // 11. Circulation strength.
    let ocs = circulation_strength(frame, grid, ips, jps);
    if probe {
        debug!(ips, jps, ocs, tsum, "probe: circulation strength");
    }
    if ocs < config.ocscrit && !relaxed {
        return None;
    }

    // Refine the wind maximum with a slightly enlarged box, wrapping in
    // longitude.
    for dj in -(nyw as i64 + 1)..=nyw as i64 + 1 {
        let jj = jps as i64 + dj;
        if jj < 0 || jj >= nlat as i64 {
            continue;
        }
        for di in -(nxw as i64 + 1)..=nxw as i64 + 1 {
            let ii = (ips as i64 + di).rem_euclid(nlon as i64) as usize;
            let w = frame.u10.at(ii, jj as usize);
            if w > wmax {
                wmax = w;
                iwmax = ii;
                jwmax = jj as usize;
            }
        }
    }

    Some(Detection {
        ips,
        jps,
        iwmax,
        jwmax,
        pmin: psmin,
        vort: derived.vort.at(ips, jps),
        wmax,
        tsum,
        tdiff: derived.tanomdiff.at(ips, jps),
        ocs,
    })
}

/// Deepest MSLP below the scan threshold within the wind box.
fn find_pressure_minimum(
    frame: &FieldFrame,
    i: usize,
    j: usize,
    nxw: usize,
    nyw: usize,
) -> Option<(usize, usize, f64)> {
    let mut found: Option<(usize, usize, f64)> = None;
    for jj in j - nyw..=j + nyw {
        for ii in i - nxw..=i + nxw {
            let p = frame.pmsl.at(ii, jj);
            if p < PMIN_SCAN_THRESHOLD && found.map_or(true, |(_, _, best)| p < best) {
                found = Some((ii, jj, p));
            }
        }
    }
    found
}

/// Largest 10 m wind in the box around the centre, truncated at the grid
/// edge.
fn find_wind_maximum(
    frame: &FieldFrame,
    ips: usize,
    jps: usize,
    nxw: usize,
    nyw: usize,
) -> (f64, usize, usize) {
    let nlon = frame.u10.nlon();
    let nlat = frame.u10.nlat();
    let mut wmax = f64::NEG_INFINITY;
    let (mut iwmax, mut jwmax) = (ips, jps);
    for jj in jps.saturating_sub(nyw)..=(jps + nyw).min(nlat - 1) {
        for ii in ips.saturating_sub(nxw)..=(ips + nxw).min(nlon - 1) {
            let w = frame.u10.at(ii, jj);
            if w > wmax {
                wmax = w;
                iwmax = ii;
                jwmax = jj;
            }
        }
    }
    (wmax, iwmax, jwmax)
}
