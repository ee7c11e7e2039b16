//! Tinker XYZ models and Tinker ARC trajectories.
//!
//! A Tinker XYZ frame is a header line (`<natoms> [title]`), an optional
//! periodic-box line of six reals, and one line per atom:
//! `<serial> <name> <x> <y> <z> <type> [bonded serial ...]`.
//! An ARC trajectory is a plain concatenation of such frames.

use super::traits::{ModelFile, Trajectory, TrajectoryError};
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Structure, StructureError};
use nalgebra::Point3;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TinkerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error in frame {frame}, line {line}: {kind}")]
    Parse {
        frame: usize,
        line: usize,
        kind: TinkerParseErrorKind,
    },
    #[error("Frame {frame} has {found} atoms, expected {expected}")]
    AtomCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },
    #[error("Bond to unknown atom serial {serial}")]
    UnknownBondPartner { serial: usize },
    #[error("File contains no frames")]
    Empty,
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error)]
pub enum TinkerParseErrorKind {
    #[error("Invalid header (value: '{0}')")]
    InvalidHeader(String),
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
    #[error("Unexpected end of file after {found} of {expected} atoms")]
    UnexpectedEof { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct TinkerAtomRecord {
    serial: usize,
    name: String,
    position: Point3<f64>,
    bonded: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct TinkerFrame {
    atoms: Vec<TinkerAtomRecord>,
    bytes: u64,
}

fn parse_error(frame: usize, line: usize, kind: TinkerParseErrorKind) -> TinkerError {
    TinkerError::Parse { frame, line, kind }
}

fn parse_float(
    token: Option<&str>,
    field: &'static str,
    frame: usize,
    line: usize,
) -> Result<f64, TinkerError> {
    let token =
        token.ok_or_else(|| parse_error(frame, line, TinkerParseErrorKind::MissingField(field)))?;
    token.parse().map_err(|_| {
        parse_error(
            frame,
            line,
            TinkerParseErrorKind::InvalidFloat {
                field,
                value: token.into(),
            },
        )
    })
}

fn parse_int(
    token: Option<&str>,
    field: &'static str,
    frame: usize,
    line: usize,
) -> Result<usize, TinkerError> {
    let token =
        token.ok_or_else(|| parse_error(frame, line, TinkerParseErrorKind::MissingField(field)))?;
    token.parse().map_err(|_| {
        parse_error(
            frame,
            line,
            TinkerParseErrorKind::InvalidInt {
                field,
                value: token.into(),
            },
        )
    })
}

fn is_box_line(line: &str) -> bool {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    tokens.len() == 6
        && tokens[0].parse::<usize>().is_err()
        && tokens.iter().all(|t| t.parse::<f64>().is_ok())
}

/// Reads one frame. Returns `Ok(None)` when the reader is exhausted before a
/// header line is found.
fn read_frame_from(
    reader: &mut impl BufRead,
    frame: usize,
) -> Result<Option<TinkerFrame>, TinkerError> {
    let mut bytes = 0u64;
    let mut line = String::new();

    let header = loop {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        bytes += n as u64;
        if !line.trim().is_empty() {
            break line.trim().to_string();
        }
    };

    let count_token = header.split_whitespace().next().unwrap_or("");
    let natoms: usize = count_token
        .parse()
        .map_err(|_| parse_error(frame, 1, TinkerParseErrorKind::InvalidHeader(header.clone())))?;

    let mut atoms = Vec::with_capacity(natoms);
    let mut line_no = 1;
    while atoms.len() < natoms {
        line.clear();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            return Err(parse_error(
                frame,
                line_no,
                TinkerParseErrorKind::UnexpectedEof {
                    expected: natoms,
                    found: atoms.len(),
                },
            ));
        }
        bytes += n as u64;
        line_no += 1;

        if atoms.is_empty() && is_box_line(&line) {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let serial = parse_int(tokens.next(), "serial", frame, line_no)?;
        let name = tokens
            .next()
            .ok_or_else(|| parse_error(frame, line_no, TinkerParseErrorKind::MissingField("name")))?
            .to_string();
        let x = parse_float(tokens.next(), "x", frame, line_no)?;
        let y = parse_float(tokens.next(), "y", frame, line_no)?;
        let z = parse_float(tokens.next(), "z", frame, line_no)?;
        parse_int(tokens.next(), "type", frame, line_no)?;
        let bonded = tokens
            .map(|t| parse_int(Some(t), "bond", frame, line_no))
            .collect::<Result<Vec<_>, _>>()?;

        atoms.push(TinkerAtomRecord {
            serial,
            name,
            position: Point3::new(x, y, z),
            bonded,
        });
    }

    Ok(Some(TinkerFrame { atoms, bytes }))
}

/// Reader for single-frame Tinker XYZ models.
///
/// Tinker files carry no residue records: every atom gets `resid` equal to
/// its serial and an empty `resname`. The bonded-serial columns become the
/// structure's connectivity.
pub struct TinkerXyzFile;

impl TinkerXyzFile {
    fn build_structure(frame: TinkerFrame) -> Result<Structure, TinkerError> {
        let by_serial: HashMap<usize, usize> = frame
            .atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (a.serial, i))
            .collect();

        let mut bonds = Vec::new();
        for (i, record) in frame.atoms.iter().enumerate() {
            for &partner in &record.bonded {
                let j = *by_serial
                    .get(&partner)
                    .ok_or(TinkerError::UnknownBondPartner { serial: partner })?;
                bonds.push((i, j));
            }
        }

        let atoms = frame
            .atoms
            .into_iter()
            .enumerate()
            .map(|(i, r)| Atom::new(i, r.serial, &r.name, r.position).with_residue("", r.serial as isize))
            .collect();

        Ok(Structure::with_bonds(atoms, bonds)?)
    }
}

impl ModelFile for TinkerXyzFile {
    type Error = TinkerError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let frame = read_frame_from(reader, 0)?.ok_or(TinkerError::Empty)?;
        Self::build_structure(frame)
    }
}

/// A Tinker ARC trajectory.
///
/// Frame offsets are indexed once when the file is opened, so seeking is a
/// single file seek.
#[derive(Debug)]
pub struct TinkerArc {
    path: PathBuf,
    reader: BufReader<File>,
    offsets: Vec<u64>,
    natoms: usize,
    cursor: usize,
    frame: Option<Vec<Point3<f64>>>,
}

impl TinkerArc {
    /// Opens an ARC file and indexes its frames.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, malformed frames, an empty file, or frames whose
    /// atom count differs from the first frame.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TinkerError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);

        let mut offsets = Vec::new();
        let mut offset = 0u64;
        let mut natoms = None;
        while let Some(frame) = read_frame_from(&mut reader, offsets.len())? {
            let expected = *natoms.get_or_insert(frame.atoms.len());
            if frame.atoms.len() != expected {
                return Err(TinkerError::AtomCountMismatch {
                    frame: offsets.len(),
                    expected,
                    found: frame.atoms.len(),
                });
            }
            offsets.push(offset);
            offset += frame.bytes;
        }

        let natoms = natoms.ok_or(TinkerError::Empty)?;
        reader.seek(SeekFrom::Start(0))?;
        debug!(
            "Indexed {} frames of {} atoms in {:?}",
            offsets.len(),
            natoms,
            &path
        );

        Ok(Self {
            path,
            reader,
            offsets,
            natoms,
            cursor: 0,
            frame: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Trajectory for TinkerArc {
    fn frame_count(&self) -> usize {
        self.offsets.len()
    }

    fn atom_count(&self) -> usize {
        self.natoms
    }

    fn seek_frame(&mut self, index: usize) -> Result<(), TrajectoryError> {
        let offset = *self
            .offsets
            .get(index)
            .ok_or(TrajectoryError::FrameOutOfRange {
                index,
                frames: self.offsets.len(),
            })?;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.cursor = index;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<bool, TrajectoryError> {
        if self.cursor >= self.offsets.len() {
            return Ok(false);
        }
        let frame = read_frame_from(&mut self.reader, self.cursor)?.ok_or(
            TrajectoryError::FrameOutOfRange {
                index: self.cursor,
                frames: self.offsets.len(),
            },
        )?;
        self.frame = Some(frame.atoms.into_iter().map(|a| a.position).collect());
        self.cursor += 1;
        Ok(true)
    }

    fn current_frame(&self) -> Option<&[Point3<f64>]> {
        self.frame.as_deref()
    }
}
