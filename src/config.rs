//! Run configuration and namelist-style parsing.
//!
//! The engine is configured by a flat `key = value` text file in the spirit
//! of a Fortran namelist. Keys are case-insensitive, `#` and `!` start
//! comments, and booleans accept `true`/`false` as well as the namelist
//! forms `.true.`/`.false.`/`t`/`f`.
//!
//! # File Format
//!
//! ```text
//! ! detection thresholds
//! vortcrit = 3.5e-5
//! wspcrit  = 15.0
//! t300flag = .true.
//! radius   = 300000.0
//! farch    = 0
//! narch    = 27
//! start_date = 2005-08-01 00:00
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Error type for configuration parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown key in the namelist
    #[error("unknown configuration key '{key}' at line {line}")]
    UnknownKey { line: usize, key: String },

    /// Malformed line (no `=` separator)
    #[error("malformed line {line}: expected 'key = value'")]
    MalformedLine { line: usize },

    /// Value failed to parse for its key
    #[error("invalid value for '{key}' at line {line}: {value}")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    /// A value violates a range constraint
    #[error("configuration constraint violated: {0}")]
    Constraint(String),
}

/// Detection thresholds and run controls.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Warm-core temperature-anomaly sum threshold (K).
    pub tcrit: f64,
    /// Unsigned relative-vorticity magnitude threshold (1/s).
    pub vortcrit: f64,
    /// 10 m maximum-wind threshold (m/s).
    pub wspcrit: f64,
    /// Vertical wind-speed shear threshold (m/s).
    pub wchkcrit: f64,
    /// Circulation-strength threshold (m/s).
    pub ocscrit: f64,
    /// 300 hPa anomaly threshold, used when `t300flag` is false (K).
    pub t300crit: f64,
    /// If true, the 300 hPa anomaly must exceed the 850 hPa anomaly;
    /// otherwise it must exceed `t300crit`.
    pub t300flag: bool,
    /// MSLP anomaly threshold (hPa); the centre anomaly must be at or
    /// below `-pmslcrit * 100` Pa.
    pub pmslcrit: f64,
    /// Physical search radius (m).
    pub radius: f64,
    /// Multiply MSLP by 100 on read (reader delivers hPa).
    pub convert_pascals: bool,
    /// First time index to process.
    pub farch: usize,
    /// Last time index to process (inclusive).
    pub narch: usize,
    /// Emit per-cell diagnostics for the probe cell.
    pub debug: bool,
    /// Zonal index of the diagnostic probe cell.
    pub id: usize,
    /// Meridional index of the diagnostic probe cell.
    pub jd: usize,
    /// Factor applied to `wspcrit` for relaxed candidates. The observed
    /// behaviour of the reference scheme is 1.0; 0.8 was suggested in its
    /// comments but never active.
    pub wsp_relax_factor: f64,
    /// Compare `|vort|` instead of raw vorticity when merging duplicate
    /// vortices. Off by default to match the reference scheme, where
    /// strongly negative Southern-Hemisphere vorticity loses the merge.
    pub dedup_abs_vort: bool,
    /// Enable the skin-temperature/topography location test when those
    /// fields are present.
    pub use_location_checks: bool,
    /// Timestamp of time index 0.
    pub start_date: NaiveDateTime,
    /// Hours between consecutive time indices.
    pub step_hours: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            tcrit: 0.0,
            vortcrit: 3.5e-5,
            wspcrit: 15.0,
            wchkcrit: 5.0,
            ocscrit: 5.0,
            t300crit: 0.5,
            t300flag: true,
            pmslcrit: 0.5,
            radius: 300_000.0,
            convert_pascals: true,
            farch: 0,
            narch: 0,
            debug: false,
            id: 0,
            jd: 0,
            wsp_relax_factor: 1.0,
            dedup_abs_vort: false,
            use_location_checks: false,
            start_date: default_start_date(),
            step_hours: 6.0,
        }
    }
}

impl Configuration {
    /// The 10 m wind threshold applied to a candidate cell.
    #[inline]
    pub fn wind_threshold(&self, relaxed: bool) -> f64 {
        if relaxed {
            self.wsp_relax_factor * self.wspcrit
        } else {
            self.wspcrit
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius <= 0.0 {
            return Err(ConfigError::Constraint("radius must be positive".into()));
        }
        if self.narch < self.farch {
            return Err(ConfigError::Constraint(format!(
                "narch ({}) must not precede farch ({})",
                self.narch, self.farch
            )));
        }
        if self.step_hours <= 0.0 {
            return Err(ConfigError::Constraint(
                "step_hours must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_start_date() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Parse a namelist from a string.
///
/// Unlisted keys keep their [`Default`] values. Unknown keys are an error.
pub fn parse_namelist(content: &str) -> Result<Configuration, ConfigError> {
    let mut config = Configuration::default();

    for (line_num, raw) in content.lines().enumerate() {
        let line = line_num + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        let (key, value) = text
            .split_once('=')
            .ok_or(ConfigError::MalformedLine { line })?;
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "tcrit" => config.tcrit = parse_f64(line, &key, value)?,
            "vortcrit" => config.vortcrit = parse_f64(line, &key, value)?,
            "wspcrit" => config.wspcrit = parse_f64(line, &key, value)?,
            "wchkcrit" => config.wchkcrit = parse_f64(line, &key, value)?,
            "ocscrit" => config.ocscrit = parse_f64(line, &key, value)?,
            "t300crit" => config.t300crit = parse_f64(line, &key, value)?,
            "t300flag" => config.t300flag = parse_bool(line, &key, value)?,
            "pmslcrit" => config.pmslcrit = parse_f64(line, &key, value)?,
            "radius" => config.radius = parse_f64(line, &key, value)?,
            "convert_pascals" => config.convert_pascals = parse_bool(line, &key, value)?,
            "farch" => config.farch = parse_usize(line, &key, value)?,
            "narch" => config.narch = parse_usize(line, &key, value)?,
            "debug" => config.debug = parse_bool(line, &key, value)?,
            "id" => config.id = parse_usize(line, &key, value)?,
            "jd" => config.jd = parse_usize(line, &key, value)?,
            "wsp_relax_factor" => config.wsp_relax_factor = parse_f64(line, &key, value)?,
            "dedup_abs_vort" => config.dedup_abs_vort = parse_bool(line, &key, value)?,
            "use_location_checks" => config.use_location_checks = parse_bool(line, &key, value)?,
            "start_date" => {
                config.start_date = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M")
                    .map_err(|_| ConfigError::InvalidValue {
                        line,
                        key: key.clone(),
                        value: value.to_string(),
                    })?
            }
            "step_hours" => config.step_hours = parse_f64(line, &key, value)?,
            _ => return Err(ConfigError::UnknownKey { line, key }),
        }
    }

    config.validate()?;
    Ok(config)
}

/// Read and parse a namelist file.
pub fn read_namelist_file(path: &Path) -> Result<Configuration, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_namelist(&content)
}

fn strip_comment(line: &str) -> &str {
    let cut = line
        .find(['#', '!'])
        .unwrap_or(line.len());
    &line[..cut]
}

fn parse_f64(line: usize, key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(line: usize, key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        line,
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(line: usize, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | ".true." | "t" | "1" => Ok(true),
        "false" | ".false." | "f" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference() {
        let c = Configuration::default();
        assert_eq!(c.tcrit, 0.0);
        assert!((c.vortcrit - 3.5e-5).abs() < 1e-12);
        assert_eq!(c.wspcrit, 15.0);
        assert_eq!(c.wchkcrit, 5.0);
        assert_eq!(c.t300crit, 0.5);
        assert!(c.t300flag);
        assert!(c.convert_pascals);
        assert_eq!(c.wsp_relax_factor, 1.0);
        assert!(!c.dedup_abs_vort);
    }

    #[test]
    fn test_parse_basic() {
        let c = parse_namelist(
            "vortcrit = 4.0e-5\nwspcrit = 17\nt300flag = .false.\nnarch = 10\n",
        )
        .unwrap();
        assert!((c.vortcrit - 4.0e-5).abs() < 1e-12);
        assert_eq!(c.wspcrit, 17.0);
        assert!(!c.t300flag);
        assert_eq!(c.narch, 10);
    }

    #[test]
    fn test_parse_comments_and_blank_lines() {
        let c = parse_namelist(
            "! thresholds\n\n# more\nwchkcrit = 6.0  ! inline comment\n",
        )
        .unwrap();
        assert_eq!(c.wchkcrit, 6.0);
    }

    #[test]
    fn test_parse_start_date() {
        let c = parse_namelist("start_date = 2005-08-01 06:00\nstep_hours = 6\n").unwrap();
        assert_eq!(
            c.start_date,
            chrono::NaiveDate::from_ymd_opt(2005, 8, 1)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap()
        );
        assert_eq!(c.step_hours, 6.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = parse_namelist("vortcrit = 1e-5\nnosuchkey = 3\n");
        assert!(matches!(
            result,
            Err(ConfigError::UnknownKey { line: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let result = parse_namelist("wspcrit = fast\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { line: 1, .. })
        ));
    }

    #[test]
    fn test_malformed_line() {
        let result = parse_namelist("wspcrit 15\n");
        assert!(matches!(result, Err(ConfigError::MalformedLine { line: 1 })));
    }

    #[test]
    fn test_range_constraints() {
        assert!(matches!(
            parse_namelist("radius = -1.0\n"),
            Err(ConfigError::Constraint(_))
        ));
        assert!(matches!(
            parse_namelist("farch = 5\nnarch = 2\n"),
            Err(ConfigError::Constraint(_))
        ));
    }

    #[test]
    fn test_wind_threshold_relaxation_factor() {
        let mut c = Configuration::default();
        assert_eq!(c.wind_threshold(false), 15.0);
        assert_eq!(c.wind_threshold(true), 15.0);
        c.wsp_relax_factor = 0.8;
        assert!((c.wind_threshold(true) - 12.0).abs() < 1e-12);
    }
}
