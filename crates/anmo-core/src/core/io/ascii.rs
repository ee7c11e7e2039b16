//! Plain-text matrix files.
//!
//! ```text
//! # <header>
//! # <rows> <cols> (0)
//! v00 v01 ...
//! v10 v11 ...
//! ```
//!
//! Values use the shortest representation that parses back to the same
//! `f64`, so a written matrix reads back bit for bit.

use nalgebra::DMatrix;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AsciiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Missing matrix dimension line")]
    MissingDimensions,
    #[error("Invalid matrix dimension line: '{0}'")]
    InvalidDimensions(String),
    #[error("Invalid value '{value}' on data line {line}")]
    InvalidValue { line: usize, value: String },
    #[error("Expected {expected} values, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// Writes `matrix` to `writer` with `header` as the leading comment.
/// Newlines in the header are folded into spaces so it stays one line.
pub fn write_matrix_to(
    writer: &mut impl Write,
    matrix: &DMatrix<f64>,
    header: &str,
) -> Result<(), AsciiError> {
    writeln!(writer, "# {}", header.replace(['\n', '\r'], " "))?;
    writeln!(writer, "# {} {} (0)", matrix.nrows(), matrix.ncols())?;
    for row in matrix.row_iter() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `matrix` to the file at `path`, replacing it if present.
pub fn write_ascii_matrix<P: AsRef<Path>>(
    path: P,
    matrix: &DMatrix<f64>,
    header: &str,
) -> Result<(), AsciiError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_matrix_to(&mut writer, matrix, header)
}

/// Reads a matrix written by [`write_matrix_to`]. Comment lines other than
/// the dimension line are ignored.
pub fn read_matrix_from(reader: &mut impl BufRead) -> Result<DMatrix<f64>, AsciiError> {
    let mut dims: Option<(usize, usize)> = None;
    let mut values = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix('#') {
            if dims.is_none() && comment.trim_end().ends_with("(0)") {
                dims = Some(parse_dimensions(comment)?);
            }
            continue;
        }
        for token in trimmed.split_whitespace() {
            values.push(token.parse::<f64>().map_err(|_| AsciiError::InvalidValue {
                line: line_num + 1,
                value: token.into(),
            })?);
        }
    }

    let (rows, cols) = dims.ok_or(AsciiError::MissingDimensions)?;
    if values.len() != rows * cols {
        return Err(AsciiError::SizeMismatch {
            expected: rows * cols,
            found: values.len(),
        });
    }
    Ok(DMatrix::from_row_slice(rows, cols, &values))
}

pub fn read_ascii_matrix<P: AsRef<Path>>(path: P) -> Result<DMatrix<f64>, AsciiError> {
    let file = File::open(path)?;
    read_matrix_from(&mut BufReader::new(file))
}

fn parse_dimensions(comment: &str) -> Result<(usize, usize), AsciiError> {
    let invalid = || AsciiError::InvalidDimensions(comment.trim().to_string());
    let mut tokens = comment.split_whitespace();
    let rows = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
    let cols = tokens.next().and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
    Ok((rows, cols))
}
