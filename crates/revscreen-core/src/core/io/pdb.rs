use super::traits::{StructureFile, slice_and_trim};
use crate::core::models::molecule::{Atom, BondOrder, Molecule};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

/// Scale applied to summed covalent radii when connectivity has to be inferred.
const BOND_INFERENCE_TOLERANCE: f64 = 1.15;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: invalid {field} '{value}'")]
    Parse {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Reader for PDB coordinate files. Each `MODEL` block is one record; files without
/// `MODEL` records yield a single molecule.
pub struct PdbFile;

#[derive(Default)]
struct RecordBuilder {
    molecule: Molecule,
    serials: HashMap<usize, usize>,
    conect: Vec<(usize, usize)>,
}

impl RecordBuilder {
    fn finish(mut self) -> Molecule {
        let mut has_conect = false;
        for (a, b) in self.conect {
            if let (Some(&ia), Some(&ib)) = (self.serials.get(&a), self.serials.get(&b)) {
                has_conect = true;
                // CONECT lists each bond from both ends.
                let _ = self.molecule.add_bond(ia, ib, BondOrder::Single);
            }
        }
        if !has_conect {
            self.molecule
                .infer_bonds_from_distances(BOND_INFERENCE_TOLERANCE);
        }
        self.molecule
    }

    fn is_empty(&self) -> bool {
        self.molecule.is_empty()
    }
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error> {
        let mut records: Vec<RecordBuilder> = Vec::new();
        let mut current = RecordBuilder::default();
        let mut shared_conect = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            match slice_and_trim(&line, 0, 6) {
                "ATOM" | "HETATM" => {
                    let (serial, atom) = parse_atom(&line, line_num)?;
                    let index = current.molecule.add_atom(atom);
                    current.serials.insert(serial, index);
                }
                "CONECT" => {
                    let parse = |start: usize, end: usize| slice_and_trim(&line, start, end).parse::<usize>().ok();
                    if let Some(origin) = parse(6, 11) {
                        for (start, end) in [(11, 16), (16, 21), (21, 26), (26, 31)] {
                            if let Some(target) = parse(start, end) {
                                shared_conect.push((origin, target));
                            }
                        }
                    }
                }
                "ENDMDL" => {
                    if !current.is_empty() {
                        records.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            }
        }
        if !current.is_empty() {
            records.push(current);
        }

        Ok(records
            .into_iter()
            .map(|mut record| {
                record.conect = shared_conect.clone();
                record.finish()
            })
            .collect())
    }
}

fn parse_atom(line: &str, line_num: usize) -> Result<(usize, Atom), PdbError> {
    let field = |name: &'static str, start: usize, end: usize| -> Result<f64, PdbError> {
        let value = slice_and_trim(line, start, end);
        value.parse().map_err(|_| PdbError::Parse {
            line: line_num,
            field: name,
            value: value.to_string(),
        })
    };
    let serial_str = slice_and_trim(line, 6, 11);
    let serial = serial_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        field: "serial",
        value: serial_str.to_string(),
    })?;
    let position = Point3::new(field("x", 30, 38)?, field("y", 38, 46)?, field("z", 46, 54)?);

    let element = match slice_and_trim(line, 76, 78) {
        "" => slice_and_trim(line, 12, 16)
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(String::from)
            .unwrap_or_default(),
        symbol => symbol.to_string(),
    };
    let charge = parse_charge(slice_and_trim(line, 78, 80));

    Ok((serial, Atom::new(&element, position).with_charge(charge)))
}

fn parse_charge(field: &str) -> i8 {
    let (digits, sign) = match field.chars().last() {
        Some('+') => (&field[..field.len() - 1], 1),
        Some('-') => (&field[..field.len() - 1], -1),
        _ => return 0,
    };
    let magnitude = if digits.is_empty() {
        1
    } else {
        digits.parse::<i8>().unwrap_or(0)
    };
    sign * magnitude
}
