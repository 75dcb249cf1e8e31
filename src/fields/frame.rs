//! Per-step field containers.

use crate::fields::{Field2, Field3};
use crate::io::{FieldReader, ReaderError};

/// Raw input fields for a single time index.
///
/// Created on step entry, discarded on step exit. All values are SI
/// (Pa, m/s, K, m); if the reader delivers MSLP in hPa the caller applies
/// the conversion via [`FieldFrame::convert_mslp_to_pascals`].
#[derive(Clone, Debug)]
pub struct FieldFrame {
    /// Zonal wind on pressure levels (m/s).
    pub u: Field3,
    /// Meridional wind on pressure levels (m/s).
    pub v: Field3,
    /// Temperature on pressure levels (K).
    pub t: Field3,
    /// Mean-sea-level pressure (Pa).
    pub pmsl: Field2,
    /// 10 m wind speed (m/s).
    pub u10: Field2,
    /// Surface topography height (m), if the reader provides it.
    pub zs: Option<Field2>,
    /// Skin temperature (K), if the reader provides it.
    pub tsu: Option<Field2>,
}

impl FieldFrame {
    /// Pull all fields for time index `t` from the reader.
    ///
    /// The optional surface fields (`tsu`, `zs`) are loaded only when the
    /// reader exposes them.
    pub fn load<R: FieldReader + ?Sized>(reader: &R, t: usize) -> Result<Self, ReaderError> {
        let u = reader.read_3d("u", t)?;
        let v = reader.read_3d("v", t)?;
        let temp = reader.read_3d("temp", t)?;
        let pmsl = reader.read_2d("psl", t)?;
        let u10 = reader.read_2d("u10", t)?;
        let tsu = if reader.has_variable("tsu") {
            Some(reader.read_2d("tsu", t)?)
        } else {
            None
        };
        let zs = if reader.has_variable("zs") {
            Some(reader.read_2d("zs", t)?)
        } else {
            None
        };
        Ok(Self {
            u,
            v,
            t: temp,
            pmsl,
            u10,
            zs,
            tsu,
        })
    }

    /// Multiply MSLP by 100 (hPa to Pa).
    pub fn convert_mslp_to_pascals(&mut self) {
        self.pmsl.scale(100.0);
    }
}

/// Derived 2D fields for a single time step.
///
/// Produced by the vorticity and anomaly operators; read-only afterwards.
#[derive(Clone, Debug)]
pub struct DerivedFrame {
    /// Relative vorticity at 850 hPa (1/s).
    pub vort: Field2,
    /// Temperature anomaly at 850 hPa (K).
    pub tanom850: Field2,
    /// Temperature anomaly at 300 hPa (K).
    pub tanom300: Field2,
    /// `tanom300 - tanom850` (K).
    pub tanomdiff: Field2,
    /// `tanom700 + tanom500 + tanom300` (K).
    pub tanomsum: Field2,
    /// Mean 850 hPa wind speed minus mean 300 hPa wind speed (m/s).
    pub wspdchek: Field2,
    /// MSLP minus the box-mean MSLP (Pa).
    pub pmslanom: Field2,
}

impl DerivedFrame {
    /// Create a zero-filled frame for an `nlon x nlat` grid.
    pub fn zeros(nlon: usize, nlat: usize) -> Self {
        Self {
            vort: Field2::zeros(nlon, nlat),
            tanom850: Field2::zeros(nlon, nlat),
            tanom300: Field2::zeros(nlon, nlat),
            tanomdiff: Field2::zeros(nlon, nlat),
            tanomsum: Field2::zeros(nlon, nlat),
            wspdchek: Field2::zeros(nlon, nlat),
            pmslanom: Field2::zeros(nlon, nlat),
        }
    }
}
