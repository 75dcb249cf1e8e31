//! Temporal-persistence (relaxation) mask.

use crate::detect::Detection;
use crate::fields::BoolField2;
use crate::grid::GeometryTable;

/// Boolean eligibility mask carried from one time step to the next.
///
/// A cell marked true neighboured a detection at the previous step and is
/// evaluated under the relaxed criteria, including outside the tropics.
#[derive(Clone, Debug)]
pub struct RelaxMask {
    mask: BoolField2,
}

impl RelaxMask {
    /// All-false mask for a fresh run.
    pub fn new(nlon: usize, nlat: usize) -> Self {
        Self {
            mask: BoolField2::all_false(nlon, nlat),
        }
    }

    /// Wrap a persisted Boolean field.
    pub fn from_field(mask: BoolField2) -> Self {
        Self { mask }
    }

    /// Mask for the step following `detections`.
    ///
    /// A cell `(a, b)` is marked when some detection centre lies within
    /// the wind half-widths taken at `(a, b)` itself. Widths grow toward
    /// the poles, so the mask widens there and stays tight in the tropics.
    pub fn from_detections(detections: &[Detection], geom: &GeometryTable) -> Self {
        let nlon = geom.nlon();
        let nlat = geom.nlat();
        let mut mask = BoolField2::all_false(nlon, nlat);
        if detections.is_empty() {
            return Self { mask };
        }
        for b in 0..nlat {
            for a in 0..nlon {
                let nxw = geom.nxwidth(a, b);
                let nyw = geom.nywidth(a, b);
                let covered = detections
                    .iter()
                    .any(|d| a.abs_diff(d.ips) <= nxw && b.abs_diff(d.jps) <= nyw);
                if covered {
                    mask.set(a, b, true);
                }
            }
        }
        Self { mask }
    }

    /// Whether cell `(i, j)` is relaxed.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> bool {
        self.mask.at(i, j)
    }

    /// Mark or clear a single cell.
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        self.mask.set(i, j, value);
    }

    /// Number of zonal points.
    #[inline]
    pub fn nlon(&self) -> usize {
        self.mask.nlon()
    }

    /// Number of meridional points.
    #[inline]
    pub fn nlat(&self) -> usize {
        self.mask.nlat()
    }

    /// Number of relaxed cells.
    pub fn count(&self) -> usize {
        self.mask.count_true()
    }

    /// Whether any cell is relaxed.
    pub fn any(&self) -> bool {
        self.mask.any()
    }

    /// The underlying Boolean field, for persistence.
    pub fn as_field(&self) -> &BoolField2 {
        &self.mask
    }
}
