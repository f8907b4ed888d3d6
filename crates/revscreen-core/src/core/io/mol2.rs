use super::traits::StructureFile;
use crate::core::models::molecule::{Atom, BondOrder, Molecule, MoleculeError};
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Invalid connectivity on line {line}: {source}")]
    Connectivity {
        line: usize,
        #[source]
        source: MoleculeError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Molecule,
    Atom,
    Bond,
    Other,
}

/// Reader for Tripos MOL2 files. Each `@<TRIPOS>MOLECULE` block is one record.
pub struct Mol2File;

impl StructureFile for Mol2File {
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error> {
        let mut molecules = Vec::new();
        let mut current: Option<Molecule> = None;
        let mut id_map: HashMap<String, usize> = HashMap::new();
        let mut section = Section::Other;
        let mut awaiting_name = false;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if let Some(tag) = trimmed.strip_prefix("@<TRIPOS>") {
                section = match tag {
                    "MOLECULE" => {
                        if let Some(done) = current.take() {
                            molecules.push(done);
                        }
                        current = Some(Molecule::new(""));
                        id_map.clear();
                        awaiting_name = true;
                        Section::Molecule
                    }
                    "ATOM" => Section::Atom,
                    "BOND" => Section::Bond,
                    _ => Section::Other,
                };
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some(molecule) = current.as_mut() else {
                continue;
            };

            match section {
                Section::Molecule if awaiting_name => {
                    molecule.name = trimmed.to_string();
                    awaiting_name = false;
                }
                Section::Atom => {
                    let (id, atom) = parse_atom(trimmed).ok_or_else(|| Mol2Error::Parse {
                        line: line_num,
                        message: format!("invalid atom record '{}'", trimmed),
                    })?;
                    let index = molecule.add_atom(atom);
                    id_map.insert(id, index);
                }
                Section::Bond => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    if fields.len() < 4 {
                        return Err(Mol2Error::Parse {
                            line: line_num,
                            message: format!("invalid bond record '{}'", trimmed),
                        });
                    }
                    let lookup = |id: &str| {
                        id_map.get(id).copied().ok_or_else(|| Mol2Error::Parse {
                            line: line_num,
                            message: format!("bond references unknown atom id '{}'", id),
                        })
                    };
                    let a = lookup(fields[1])?;
                    let b = lookup(fields[2])?;
                    let order = match fields[3] {
                        "2" => BondOrder::Double,
                        "3" => BondOrder::Triple,
                        "ar" => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    molecule
                        .add_bond(a, b, order)
                        .map_err(|source| Mol2Error::Connectivity {
                            line: line_num,
                            source,
                        })?;
                }
                _ => {}
            }
        }

        if let Some(done) = current.take() {
            molecules.push(done);
        }
        Ok(molecules)
    }
}

fn parse_atom(line: &str) -> Option<(String, Atom)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }
    let x = fields[2].parse().ok()?;
    let y = fields[3].parse().ok()?;
    let z = fields[4].parse().ok()?;
    let sybyl = fields[5];
    let (element, subtype) = sybyl.split_once('.').unwrap_or((sybyl, ""));

    let mut atom = Atom::new(element, Point3::new(x, y, z));
    match subtype {
        "ar" => atom.aromatic = true,
        "4" if atom.element == "N" => atom.formal_charge = 1,
        "co2" if atom.element == "O" => atom.formal_charge = -1,
        _ => {}
    }
    Some((fields[0].to_string(), atom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const METHYLAMMONIUM: &str = "\
@<TRIPOS>MOLECULE
methylammonium
 2 1 0 0 0
SMALL
USER_CHARGES

@<TRIPOS>ATOM
      1 C1          0.0000    0.0000    0.0000 C.3     1  LIG1        0.0000
      2 N1          1.4700    0.0000    0.0000 N.4     1  LIG1        1.0000
@<TRIPOS>BOND
     1     1     2    1
";

    #[test]
    fn reads_atoms_bonds_and_sybyl_charges() {
        let mols = Mol2File::read_from(&mut Cursor::new(METHYLAMMONIUM)).unwrap();
        assert_eq!(mols.len(), 1);
        let mol = &mols[0];
        assert_eq!(mol.name, "methylammonium");
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.atoms()[1].element, "N");
        assert_eq!(mol.atoms()[1].formal_charge, 1);
        assert_eq!(mol.atoms()[1].position, Point3::new(1.47, 0.0, 0.0));
        assert!(mol.bond_between(0, 1).is_some());
    }

    #[test]
    fn each_molecule_block_is_a_separate_record() {
        let content = format!("{METHYLAMMONIUM}{METHYLAMMONIUM}");
        let mols = Mol2File::read_from(&mut Cursor::new(content)).unwrap();
        assert_eq!(mols.len(), 2);
        assert_eq!(mols[1].atom_count(), 2);
    }

    #[test]
    fn aromatic_types_set_the_aromatic_flag() {
        let content = METHYLAMMONIUM.replace("C.3 ", "C.ar");
        let mols = Mol2File::read_from(&mut Cursor::new(content)).unwrap();
        assert!(mols[0].atoms()[0].aromatic);
    }

    #[test]
    fn unknown_atom_id_in_bond_is_an_error() {
        let content = METHYLAMMONIUM.replace("     1     1     2    1", "     1     1     7    1");
        let result = Mol2File::read_from(&mut Cursor::new(content));
        assert!(matches!(result, Err(Mol2Error::Parse { line: 11, .. })));
    }
}
