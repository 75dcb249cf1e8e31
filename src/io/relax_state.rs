//! Persistence of the relaxation mask between invocations.
//!
//! # File Format
//!
//! ```text
//! # tcdetect relaxation state
//! 360 180
//! 000011000...
//! 000111100...
//! ```
//!
//! The header line carries `nlon nlat`; each following line is one
//! latitude row of `0`/`1` cells, southernmost row first. Presence of the
//! file signals "continue from a prior run"; absence means fresh
//! initialisation.

use std::fs;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::detect::RelaxMask;
use crate::fields::BoolField2;

/// Error type for relaxation-state files.
#[derive(Debug, Error)]
pub enum RelaxStateError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error with line number
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// State dimensions disagree with the grid
    #[error("state dimensions {got_nlon} x {got_nlat} do not match grid {nlon} x {nlat}")]
    ShapeMismatch {
        nlon: usize,
        nlat: usize,
        got_nlon: usize,
        got_nlat: usize,
    },
}

/// Write the mask to a state file.
pub fn write_relax_state(path: &Path, mask: &RelaxMask) -> Result<(), RelaxStateError> {
    let mut out = fs::File::create(path)?;
    writeln!(out, "# tcdetect relaxation state")?;
    writeln!(out, "{} {}", mask.nlon(), mask.nlat())?;
    let mut row = String::with_capacity(mask.nlon());
    for j in 0..mask.nlat() {
        row.clear();
        for i in 0..mask.nlon() {
            row.push(if mask.at(i, j) { '1' } else { '0' });
        }
        writeln!(out, "{row}")?;
    }
    out.flush()?;
    Ok(())
}

/// Read a mask from a state file.
pub fn read_relax_state(path: &Path) -> Result<RelaxMask, RelaxStateError> {
    let content = fs::read_to_string(path)?;
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let (header_line, header) = lines.next().ok_or(RelaxStateError::Parse {
        line: 1,
        message: "missing header".to_string(),
    })?;
    let mut parts = header.split_whitespace();
    let nlon: usize = parse_dim(parts.next(), header_line + 1)?;
    let nlat: usize = parse_dim(parts.next(), header_line + 1)?;

    let mut mask = BoolField2::all_false(nlon, nlat);
    let mut j = 0;
    for (line_num, line) in lines {
        let row = line.trim();
        if j >= nlat {
            return Err(RelaxStateError::Parse {
                line: line_num + 1,
                message: format!("more than {nlat} rows"),
            });
        }
        if row.len() != nlon {
            return Err(RelaxStateError::Parse {
                line: line_num + 1,
                message: format!("expected {nlon} cells, got {}", row.len()),
            });
        }
        for (i, c) in row.chars().enumerate() {
            match c {
                '0' => {}
                '1' => mask.set(i, j, true),
                _ => {
                    return Err(RelaxStateError::Parse {
                        line: line_num + 1,
                        message: format!("unexpected cell character '{c}'"),
                    })
                }
            }
        }
        j += 1;
    }
    if j != nlat {
        return Err(RelaxStateError::Parse {
            line: 0,
            message: format!("expected {nlat} rows, got {j}"),
        });
    }
    Ok(RelaxMask::from_field(mask))
}

/// Load the mask if the state file exists, otherwise start fresh.
///
/// A present file with mismatched dimensions is an error rather than a
/// silent reset.
pub fn load_relax_state(
    path: &Path,
    nlon: usize,
    nlat: usize,
) -> Result<RelaxMask, RelaxStateError> {
    if !path.exists() {
        return Ok(RelaxMask::new(nlon, nlat));
    }
    let mask = read_relax_state(path)?;
    if mask.nlon() != nlon || mask.nlat() != nlat {
        return Err(RelaxStateError::ShapeMismatch {
            nlon,
            nlat,
            got_nlon: mask.nlon(),
            got_nlat: mask.nlat(),
        });
    }
    Ok(mask)
}

fn parse_dim(part: Option<&str>, line: usize) -> Result<usize, RelaxStateError> {
    part.and_then(|p| p.parse().ok())
        .ok_or(RelaxStateError::Parse {
            line,
            message: "expected 'nlon nlat' header".to_string(),
        })
}
