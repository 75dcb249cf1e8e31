//! Merging of near-duplicate vortices.

use crate::detect::Detection;
use crate::grid::GeometryTable;

/// Merge detections whose centres fall inside an earlier detection's wind
/// box, keeping one survivor per cluster.
///
/// The pass walks the list in emission order. For each live vortex `j`,
/// every later vortex `i` whose centre lies within `j`'s wind box (the
/// half-widths taken at `j`'s centre) is removed; before removal, if `i`
/// compares stronger than `j`, `i`'s fields are copied onto `j`'s slot so
/// the survivor carries the stronger vortex.
///
/// With `abs_vort` false the comparison uses raw signed vorticity, which
/// reproduces the reference scheme: a strongly negative Southern-
/// Hemisphere vortex compares as weak and loses the merge. Setting
/// `abs_vort` compares magnitudes instead.
///
/// The pass is a fixed point: running it on its own output changes
/// nothing.
pub fn deduplicate(
    mut detections: Vec<Detection>,
    geom: &GeometryTable,
    abs_vort: bool,
) -> Vec<Detection> {
    let n = detections.len();
    let mut alive = vec![true; n];

    for j in 0..n {
        if !alive[j] {
            continue;
        }
        for i in j + 1..n {
            if !alive[i] {
                continue;
            }
            let cj = detections[j];
            let ci = detections[i];
            let nxw = geom.nxwidth(cj.ips, cj.jps);
            let nyw = geom.nywidth(cj.ips, cj.jps);
            if ci.ips.abs_diff(cj.ips) > nxw || ci.jps.abs_diff(cj.jps) > nyw {
                continue;
            }
            let (strength_j, strength_i) = if abs_vort {
                (cj.vort.abs(), ci.vort.abs())
            } else {
                (cj.vort, ci.vort)
            };
            if strength_j < strength_i {
                detections[j] = ci;
            }
            alive[i] = false;
        }
    }

    detections
        .into_iter()
        .zip(alive)
        .filter_map(|(d, keep)| keep.then_some(d))
        .collect()
}
