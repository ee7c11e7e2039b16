use super::traits::ModelFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Structure, StructureError};
use nalgebra::Point3;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error(transparent)]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
    #[error("CONECT line requires at least two atoms")]
    InvalidConectFormat,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_int_field<T: std::str::FromStr>(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<T, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float_field(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

/// Reader for PDB models (ATOM/HETATM and CONECT records).
///
/// Only the first model is read: parsing stops at the first `ENDMDL` or `END`.
/// The structure has connectivity only if the file contains CONECT records.
pub struct PdbFile;

impl ModelFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut atoms = Vec::new();
        let mut by_serial: HashMap<usize, usize> = HashMap::new();
        let mut seen_serials = HashSet::new();
        let mut conect: Vec<(usize, usize)> = Vec::new();
        let mut has_conect = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let serial: usize = parse_int_field(&line, line_num, 6, 11)?;
                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let resname = slice_and_trim(&line, 17, 20);
                    let resid: isize = parse_int_field(&line, line_num, 22, 26)?;
                    let x = parse_float_field(&line, line_num, 30, 38)?;
                    let y = parse_float_field(&line, line_num, 38, 46)?;
                    let z = parse_float_field(&line, line_num, 46, 54)?;

                    if !seen_serials.insert(serial) {
                        return Err(PdbError::Inconsistency(format!(
                            "Duplicate atom serial: {}",
                            serial
                        )));
                    }

                    let index = atoms.len();
                    by_serial.insert(serial, index);
                    atoms.push(
                        Atom::new(index, serial, name, Point3::new(x, y, z))
                            .with_residue(resname, resid),
                    );
                }
                "CONECT" => {
                    has_conect = true;
                    let base: usize = parse_int_field(&line, line_num, 6, 11)?;
                    let partners = [11, 16, 21, 26]
                        .iter()
                        .map(|&start| (start, slice_and_trim(&line, start, start + 5)))
                        .filter(|(_, s)| !s.is_empty())
                        .map(|(start, _)| parse_int_field::<usize>(&line, line_num, start, start + 5))
                        .collect::<Result<Vec<_>, _>>()?;
                    if partners.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::InvalidConectFormat,
                        });
                    }
                    conect.extend(partners.into_iter().map(|p| (base, p)));
                }
                "ENDMDL" | "END" => break,
                _ => {}
            }
        }

        if atoms.is_empty() {
            return Err(PdbError::MissingRecord("ATOM/HETATM".into()));
        }

        if !has_conect {
            return Ok(Structure::new(atoms));
        }

        let bonds = conect
            .into_iter()
            .map(|(a, b)| match (by_serial.get(&a), by_serial.get(&b)) {
                (Some(&i), Some(&j)) => Ok((i, j)),
                _ => Err(PdbError::Inconsistency(format!(
                    "CONECT references unknown atom serial in bond {}-{}",
                    a, b
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Structure::with_bonds(atoms, bonds)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DIPEPTIDE: &str = "\
REMARK   test model
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  C   ALA A   1      13.149   5.919  -5.194  1.00  0.00           C
ATOM      4  N   GLY A   2      13.730   5.839  -3.998  1.00  0.00           N
ATOM      5  CA  GLY A   2      15.172   5.685  -3.919  1.00  0.00           C
END
";

    #[test]
    fn read_from_parses_atom_records() {
        let s = PdbFile::read_from(&mut Cursor::new(DIPEPTIDE)).unwrap();

        assert_eq!(s.len(), 5);
        let ca = &s.atoms()[4];
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.resname, "GLY");
        assert_eq!(ca.resid, 2);
        assert_eq!(ca.serial, 5);
        assert_eq!(ca.index, 4);
        assert!((ca.position.x - 15.172).abs() < 1e-12);
        assert!((ca.position.z + 3.919).abs() < 1e-12);
    }

    #[test]
    fn structure_without_conect_has_no_connectivity() {
        let s = PdbFile::read_from(&mut Cursor::new(DIPEPTIDE)).unwrap();
        assert!(!s.has_bonds());
    }

    #[test]
    fn conect_records_become_bonds() {
        let input = DIPEPTIDE.replace(
            "END\n",
            "CONECT    1    2\nCONECT    2    1    3\nCONECT    3    4\nEND\n",
        );
        let s = PdbFile::read_from(&mut Cursor::new(input)).unwrap();

        assert!(s.has_bonds());
        assert!(s.is_bound(0, 1));
        assert!(s.is_bound(1, 2));
        assert!(s.is_bound(3, 2));
        assert!(!s.is_bound(3, 4));
    }

    #[test]
    fn conect_to_unknown_serial_is_inconsistent() {
        let input = DIPEPTIDE.replace("END\n", "CONECT    1   99\n");
        let err = PdbFile::read_from(&mut Cursor::new(input)).unwrap_err();
        assert!(matches!(err, PdbError::Inconsistency(_)));
    }

    #[test]
    fn short_atom_line_is_rejected() {
        let err = PdbFile::read_from(&mut Cursor::new("ATOM      1  N   ALA A   1\n")).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            }
        ));
    }

    #[test]
    fn invalid_coordinate_reports_columns() {
        let input = DIPEPTIDE.replace("11.104", "1x.104");
        let err = PdbFile::read_from(&mut Cursor::new(input)).unwrap_err();
        match err {
            PdbError::Parse {
                line: 2,
                kind: PdbParseErrorKind::InvalidFloat { columns, .. },
            } => assert_eq!(columns, "31-38"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_serials_are_rejected() {
        let input = DIPEPTIDE.replace("ATOM      2", "ATOM      1");
        let err = PdbFile::read_from(&mut Cursor::new(input)).unwrap_err();
        assert!(matches!(err, PdbError::Inconsistency(_)));
    }

    #[test]
    fn file_without_atoms_is_missing_records() {
        let err = PdbFile::read_from(&mut Cursor::new("REMARK nothing\n")).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
    }

    #[test]
    fn reading_stops_after_first_model() {
        let input = format!(
            "MODEL        1\n{}ENDMDL\nMODEL        2\n{}ENDMDL\n",
            DIPEPTIDE.replace("END\n", ""),
            DIPEPTIDE.replace("END\n", "")
        );
        let s = PdbFile::read_from(&mut Cursor::new(input)).unwrap();
        assert_eq!(s.len(), 5);
    }
}
