use super::traits::{StructureFile, slice_and_trim};
use crate::core::models::molecule::{Atom, BondOrder, Molecule, MoleculeError};
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: SdfParseErrorKind },
    #[error("Record starting on line {0} ends before its atom and bond blocks are complete")]
    TruncatedRecord(usize),
    #[error("Invalid connectivity on line {line}: {source}")]
    Connectivity {
        line: usize,
        #[source]
        source: MoleculeError,
    },
}

#[derive(Debug, Error)]
pub enum SdfParseErrorKind {
    #[error("Invalid counts line '{0}'")]
    InvalidCounts(String),
    #[error("Invalid atom line '{0}'")]
    InvalidAtom(String),
    #[error("Invalid bond line '{0}'")]
    InvalidBond(String),
    #[error("Only V2000 connection tables are supported")]
    UnsupportedVersion,
}

/// Reader for MDL molfiles and SD files (V2000 connection tables).
pub struct SdfFile;

impl StructureFile for SdfFile {
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error> {
        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        let mut molecules = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() {
            if lines[cursor..].iter().all(|l| l.trim().is_empty()) {
                break;
            }
            let (molecule, next) = parse_record(&lines, cursor)?;
            molecules.push(molecule);
            cursor = next;
        }

        Ok(molecules)
    }
}

fn parse_record(lines: &[String], start: usize) -> Result<(Molecule, usize), SdfError> {
    let line_at = |i: usize| lines.get(i).ok_or(SdfError::TruncatedRecord(start + 1));

    let name = line_at(start)?.trim();
    let counts_idx = start + 3;
    let counts = line_at(counts_idx)?;
    if counts.contains("V3000") {
        return Err(SdfError::Parse {
            line: counts_idx + 1,
            kind: SdfParseErrorKind::UnsupportedVersion,
        });
    }
    let invalid_counts = || SdfError::Parse {
        line: counts_idx + 1,
        kind: SdfParseErrorKind::InvalidCounts(counts.clone()),
    };
    let num_atoms: usize = slice_and_trim(counts, 0, 3)
        .parse()
        .map_err(|_| invalid_counts())?;
    let num_bonds: usize = slice_and_trim(counts, 3, 6)
        .parse()
        .map_err(|_| invalid_counts())?;

    let mut molecule = Molecule::new(name);

    for i in 0..num_atoms {
        let idx = counts_idx + 1 + i;
        let line = line_at(idx)?;
        let atom = parse_atom_line(line).ok_or_else(|| SdfError::Parse {
            line: idx + 1,
            kind: SdfParseErrorKind::InvalidAtom(line.clone()),
        })?;
        molecule.add_atom(atom);
    }

    for i in 0..num_bonds {
        let idx = counts_idx + 1 + num_atoms + i;
        let line = line_at(idx)?;
        let (a, b, order) = parse_bond_line(line).ok_or_else(|| SdfError::Parse {
            line: idx + 1,
            kind: SdfParseErrorKind::InvalidBond(line.clone()),
        })?;
        if order == BondOrder::Aromatic {
            for atom in [a, b] {
                if let Some(atom) = molecule.atom_mut(atom) {
                    atom.aromatic = true;
                }
            }
        }
        molecule
            .add_bond(a, b, order)
            .map_err(|source| SdfError::Connectivity {
                line: idx + 1,
                source,
            })?;
    }

    let mut cursor = counts_idx + 1 + num_atoms + num_bonds;
    let mut charges_reset = false;
    while let Some(line) = lines.get(cursor) {
        cursor += 1;
        if line.starts_with("$$$$") {
            break;
        }
        if line.starts_with("M  CHG") {
            // The first CHG line supersedes every charge from the atom block.
            if !charges_reset {
                for i in 0..molecule.atom_count() {
                    if let Some(atom) = molecule.atom_mut(i) {
                        atom.formal_charge = 0;
                    }
                }
                charges_reset = true;
            }
            let fields: Vec<&str> = line[6..].split_whitespace().collect();
            for pair in fields.get(1..).unwrap_or(&[]).chunks(2) {
                if let [index, charge] = pair {
                    if let (Ok(index), Ok(charge)) = (index.parse::<usize>(), charge.parse::<i8>())
                    {
                        if let Some(atom) = index.checked_sub(1).and_then(|i| molecule.atom_mut(i)) {
                            atom.formal_charge = charge;
                        }
                    }
                }
            }
        }
    }

    Ok((molecule, cursor))
}

fn parse_atom_line(line: &str) -> Option<Atom> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 {
        return None;
    }
    let x = fields[0].parse().ok()?;
    let y = fields[1].parse().ok()?;
    let z = fields[2].parse().ok()?;
    let charge = match fields.get(5).and_then(|c| c.parse::<u8>().ok()) {
        Some(code @ 1..=3) => 4 - code as i8,
        Some(code @ 5..=7) => 4 - code as i8,
        _ => 0,
    };
    Some(Atom::new(fields[3], Point3::new(x, y, z)).with_charge(charge))
}

fn parse_bond_line(line: &str) -> Option<(usize, usize, BondOrder)> {
    let a: usize = slice_and_trim(line, 0, 3).parse().ok()?;
    let b: usize = slice_and_trim(line, 3, 6).parse().ok()?;
    let order = slice_and_trim(line, 6, 9).parse().ok()?;
    Some((a.checked_sub(1)?, b.checked_sub(1)?, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ACETATE: &str = "\
acetate
  test

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000    1.1000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000   -1.1000    0.0000 O   0  5  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  END
> <ID>
42

$$$$
";

    fn read(content: &str) -> Result<Vec<Molecule>, SdfError> {
        SdfFile::read_from(&mut Cursor::new(content))
    }

    #[test]
    fn reads_single_record_with_atom_block_charges() {
        let mols = read(ACETATE).unwrap();
        assert_eq!(mols.len(), 1);
        let mol = &mols[0];
        assert_eq!(mol.name, "acetate");
        assert_eq!(mol.atom_count(), 4);
        assert_eq!(mol.bonds().len(), 3);
        assert_eq!(mol.atoms()[3].formal_charge, -1);
        assert_eq!(mol.atoms()[1].position, Point3::new(1.5, 0.0, 0.0));
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn reads_multiple_records_as_separate_molecules() {
        let content = format!("{ACETATE}{ACETATE}");
        let mols = read(&content).unwrap();
        assert_eq!(mols.len(), 2);
    }

    #[test]
    fn charge_property_lines_override_atom_block() {
        let content = ACETATE.replace("M  END", "M  CHG  1   3  -1\nM  END");
        let mols = read(&content).unwrap();
        assert_eq!(mols[0].atoms()[2].formal_charge, -1);
        assert_eq!(mols[0].atoms()[3].formal_charge, 0);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let content: String = ACETATE.lines().take(6).collect::<Vec<_>>().join("\n");
        assert!(matches!(read(&content), Err(SdfError::TruncatedRecord(1))));
    }

    #[test]
    fn malformed_counts_line_is_a_parse_error() {
        let content = ACETATE.replace("  4  3  0", " xx  3  0");
        assert!(matches!(
            read(&content),
            Err(SdfError::Parse {
                line: 4,
                kind: SdfParseErrorKind::InvalidCounts(_)
            })
        ));
    }

    #[test]
    fn v3000_tables_are_rejected() {
        let content = ACETATE.replace("V2000", "V3000");
        assert!(matches!(
            read(&content),
            Err(SdfError::Parse {
                kind: SdfParseErrorKind::UnsupportedVersion,
                ..
            })
        ));
    }

    #[test]
    fn bond_to_missing_atom_is_a_connectivity_error() {
        let content = ACETATE.replace("  2  4  1  0", "  2  9  1  0");
        assert!(matches!(read(&content), Err(SdfError::Connectivity { line: 11, .. })));
    }
}
