//! Fixed-width text output, one line per detection.

use std::io::Write;

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

use crate::detect::Detection;
use crate::grid::Grid;

/// Error type for detection output.
#[derive(Debug, Error)]
pub enum WriterError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Timestamp of a time index given the archive base time and stride.
pub fn step_timestamp(start: NaiveDateTime, step_hours: f64, step: usize) -> NaiveDateTime {
    let minutes = (step_hours * 60.0).round() as i64 * step as i64;
    start + Duration::minutes(minutes)
}

/// Format one detection as a fixed-width line.
///
/// Columns: `YYYY MM DD HHMM`, centre longitude and latitude (degrees),
/// central MSLP (hPa), vorticity (1/s), maximum wind (m/s), warm-core sum
/// (K), anomaly difference (K), circulation strength (m/s), wind-maximum
/// longitude and latitude (degrees).
pub fn format_detection_line(stamp: NaiveDateTime, grid: &Grid, d: &Detection) -> String {
    format!(
        "{} {:9.3} {:8.3} {:9.2} {:13.4e} {:7.2} {:7.2} {:7.2} {:7.2} {:9.3} {:8.3}",
        stamp.format("%Y %m %d %H%M"),
        grid.lon[d.ips],
        grid.lat[d.jps],
        d.pmin / 100.0,
        d.vort,
        d.wmax,
        d.tsum,
        d.tdiff,
        d.ocs,
        grid.lon[d.iwmax],
        grid.lat[d.jwmax],
    )
}

/// Writer emitting detection lines to any [`Write`] sink.
pub struct DetectionWriter<W: Write> {
    out: W,
    start: NaiveDateTime,
    step_hours: f64,
}

impl<W: Write> DetectionWriter<W> {
    /// Create a writer over a sink with the archive's time base.
    pub fn new(out: W, start: NaiveDateTime, step_hours: f64) -> Self {
        Self {
            out,
            start,
            step_hours,
        }
    }

    /// Write all detections for one time step.
    pub fn write_step(
        &mut self,
        step: usize,
        grid: &Grid,
        detections: &[Detection],
    ) -> Result<(), WriterError> {
        let stamp = step_timestamp(self.start, self.step_hours, step);
        for d in detections {
            writeln!(self.out, "{}", format_detection_line(stamp, grid, d))?;
        }
        Ok(())
    }

    /// Flush and hand back the sink.
    pub fn into_inner(mut self) -> Result<W, WriterError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 8, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn test_grid() -> Grid {
        let lon: Vec<f64> = (0..31).map(|k| 140.0 + k as f64).collect();
        let lat: Vec<f64> = (0..31).map(|k| -25.0 + k as f64).collect();
        Grid::new(lon, lat, vec![850.0, 700.0, 500.0, 300.0]).unwrap()
    }

    fn test_detection() -> Detection {
        Detection {
            ips: 10,
            jps: 10,
            iwmax: 11,
            jwmax: 9,
            pmin: 99_012.0,
            vort: -2.1e-4,
            wmax: 23.1,
            tsum: 5.82,
            tdiff: 1.95,
            ocs: 12.4,
        }
    }

    #[test]
    fn test_step_timestamp() {
        let stamp = step_timestamp(base_time(), 6.0, 3);
        assert_eq!(stamp.format("%Y %m %d %H%M").to_string(), "2005 08 01 1800");
        let next_day = step_timestamp(base_time(), 6.0, 5);
        assert_eq!(
            next_day.format("%Y %m %d %H%M").to_string(),
            "2005 08 02 0600"
        );
    }

    #[test]
    fn test_line_contents() {
        let grid = test_grid();
        let line = format_detection_line(base_time(), &grid, &test_detection());
        assert!(line.starts_with("2005 08 01 0000"));
        assert!(line.contains("150.000"), "line: {line}");
        assert!(line.contains("-15.000"), "line: {line}");
        // PMIN is reported in hPa.
        assert!(line.contains("990.12"), "line: {line}");
        assert!(line.contains("23.10"), "line: {line}");
    }

    #[test]
    fn test_write_step_emits_one_line_per_detection() {
        let grid = test_grid();
        let mut writer = DetectionWriter::new(Vec::new(), base_time(), 6.0);
        writer
            .write_step(0, &grid, &[test_detection(), test_detection()])
            .unwrap();
        let buffer = writer.into_inner().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_empty_step_writes_nothing() {
        let grid = test_grid();
        let mut writer = DetectionWriter::new(Vec::new(), base_time(), 6.0);
        writer.write_step(0, &grid, &[]).unwrap();
        let buffer = writer.into_inner().unwrap();
        assert!(buffer.is_empty());
    }
}
