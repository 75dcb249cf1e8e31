//! Gridded field storage.
//!
//! Fields are stored as flat, row-major arrays indexed by `(i, j)` where
//! `i` is the zonal (longitude) index and `j` the meridional (latitude)
//! index; 3D fields carry a leading pressure-level axis. The per-step
//! containers are:
//!
//! - [`FieldFrame`]: the raw input fields for one time index
//! - [`DerivedFrame`]: vorticity, anomalies and box means computed from it

mod frame;

pub use frame::{DerivedFrame, FieldFrame};

/// A 2D scalar field on the detection grid.
///
/// Data is stored flat in row-major order: the value at zonal index `i`,
/// meridional index `j` lives at `j * nlon + i`.
#[derive(Clone, Debug)]
pub struct Field2 {
    nlon: usize,
    nlat: usize,
    data: Vec<f64>,
}

impl Field2 {
    /// Create a zero-filled field.
    pub fn zeros(nlon: usize, nlat: usize) -> Self {
        Self {
            nlon,
            nlat,
            data: vec![0.0; nlon * nlat],
        }
    }

    /// Create a field filled with a constant value.
    pub fn constant(nlon: usize, nlat: usize, value: f64) -> Self {
        Self {
            nlon,
            nlat,
            data: vec![value; nlon * nlat],
        }
    }

    /// Wrap an existing row-major buffer.
    ///
    /// Returns `None` if the buffer length does not match `nlon * nlat`.
    pub fn from_vec(nlon: usize, nlat: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != nlon * nlat {
            return None;
        }
        Some(Self { nlon, nlat, data })
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

    /// Value at `(i, j)`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nlon && j < self.nlat);
        self.data[j * self.nlon + i]
    }

    /// Set the value at `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert!(i < self.nlon && j < self.nlat);
        self.data[j * self.nlon + i] = value;
    }

    /// Multiply every value in place.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }

    /// The raw row-major buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the raw row-major buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// A 3D scalar field: pressure level x latitude x longitude.
#[derive(Clone, Debug)]
pub struct Field3 {
    nlon: usize,
    nlat: usize,
    nlevs: usize,
    data: Vec<f64>,
}

impl Field3 {
    /// Create a zero-filled field.
    pub fn zeros(nlon: usize, nlat: usize, nlevs: usize) -> Self {
        Self {
            nlon,
            nlat,
            nlevs,
            data: vec![0.0; nlon * nlat * nlevs],
        }
    }

    /// Wrap an existing buffer laid out as `[level][lat][lon]`.
    ///
    /// Returns `None` if the buffer length does not match the shape.
    pub fn from_vec(nlon: usize, nlat: usize, nlevs: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != nlon * nlat * nlevs {
            return None;
        }
        Some(Self {
            nlon,
            nlat,
            nlevs,
            data,
        })
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

    /// Number of pressure levels.
    #[inline]
    pub fn nlevs(&self) -> usize {
        self.nlevs
    }

    /// Value at level `k`, cell `(i, j)`.
    #[inline]
    pub fn at(&self, k: usize, i: usize, j: usize) -> f64 {
        debug_assert!(k < self.nlevs && i < self.nlon && j < self.nlat);
        self.data[(k * self.nlat + j) * self.nlon + i]
    }

    /// Set the value at level `k`, cell `(i, j)`.
    #[inline]
    pub fn set(&mut self, k: usize, i: usize, j: usize, value: f64) {
        debug_assert!(k < self.nlevs && i < self.nlon && j < self.nlat);
        self.data[(k * self.nlat + j) * self.nlon + i] = value;
    }

    /// The raw buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// A 2D Boolean field with the same layout as [`Field2`].
#[derive(Clone, Debug)]
pub struct BoolField2 {
    nlon: usize,
    nlat: usize,
    data: Vec<bool>,
}

impl BoolField2 {
    /// Create an all-false field.
    pub fn all_false(nlon: usize, nlat: usize) -> Self {
        Self {
            nlon,
            nlat,
            data: vec![false; nlon * nlat],
        }
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

    /// Value at `(i, j)`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.nlon && j < self.nlat);
        self.data[j * self.nlon + i]
    }

    /// Set the value at `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        debug_assert!(i < self.nlon && j < self.nlat);
        self.data[j * self.nlon + i] = value;
    }

    /// Number of true cells.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    /// Whether any cell is true.
    pub fn any(&self) -> bool {
        self.data.iter().any(|&b| b)
    }

    /// The raw row-major buffer.
    pub fn as_slice(&self) -> &[bool] {
        &self.data
    }
}
