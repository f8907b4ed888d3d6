use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Valence contribution of the bond. Aromatic bonds count as one; the extra
    /// pi electron is accounted for on the atom (see [`Molecule::implicit_hydrogens`]).
    pub fn valence(&self) -> u8 {
        match self {
            Self::Single | Self::Aromatic => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Typical bond length between two heavy atoms, in Angstroms.
    pub fn typical_length(&self) -> f64 {
        match self {
            Self::Single => 1.52,
            Self::Double => 1.34,
            Self::Triple => 1.20,
            Self::Aromatic => 1.40,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: String,                // Capitalized element symbol (e.g., "C", "Cl")
    pub formal_charge: i8,              // Formal charge in units of e
    pub aromatic: bool,                 // Aromaticity flag from the source notation
    pub explicit_hydrogens: Option<u8>, // Hydrogen count fixed by the source (bracket atoms)
    pub position: Point3<f64>,          // Cartesian coordinates in Angstroms
}

impl Atom {
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: normalize_element(element),
            formal_charge: 0,
            aromatic: false,
            explicit_hydrogens: None,
            position,
        }
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == "H"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize,     // Index of the first atom
    pub atom2: usize,     // Index of the second atom
    pub order: BondOrder, // Bond order
}

impl Bond {
    pub fn other(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Bond references atom index {index}, but the molecule has {count} atoms")]
    AtomOutOfRange { index: usize, count: usize },
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("Expected {expected} coordinates but got {actual}")]
    CoordinateCount { expected: usize, actual: usize },
}

/// A small molecule as an attributed graph with 3D coordinates.
///
/// Molecules parsed from line notations carry placeholder coordinates (the origin)
/// until a conformer is assigned with [`Molecule::set_positions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    pub name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<usize>>, // Per atom, indices into `bonds`
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) -> Result<(), MoleculeError> {
        let count = self.atoms.len();
        for index in [a, b] {
            if index >= count {
                return Err(MoleculeError::AtomOutOfRange { index, count });
            }
        }
        if a == b {
            return Err(MoleculeError::SelfBond(a));
        }
        if self.bond_between(a, b).is_some() {
            return Err(MoleculeError::DuplicateBond(a, b));
        }
        self.bonds.push(Bond {
            atom1: a,
            atom2: b,
            order,
        });
        let bond_index = self.bonds.len() - 1;
        self.adjacency[a].push(bond_index);
        self.adjacency[b].push(bond_index);
        Ok(())
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub(crate) fn atom_mut(&mut self, index: usize) -> Option<&mut Atom> {
        self.atoms.get_mut(index)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<&Bond> {
        self.adjacency
            .get(a)?
            .iter()
            .map(|&i| &self.bonds[i])
            .find(|bond| bond.other(a) == Some(b))
    }

    /// Iterates over `(neighbor_index, bond_order)` pairs of an atom.
    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
        self.adjacency
            .get(atom)
            .into_iter()
            .flatten()
            .filter_map(move |&i| {
                let bond = &self.bonds[i];
                bond.other(atom).map(|n| (n, bond.order))
            })
    }

    pub fn heavy_degree(&self, atom: usize) -> usize {
        self.neighbors(atom)
            .filter(|&(n, _)| !self.atoms[n].is_hydrogen())
            .count()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    pub fn set_positions(&mut self, positions: &[Point3<f64>]) -> Result<(), MoleculeError> {
        if positions.len() != self.atoms.len() {
            return Err(MoleculeError::CoordinateCount {
                expected: self.atoms.len(),
                actual: positions.len(),
            });
        }
        for (atom, &p) in self.atoms.iter_mut().zip(positions) {
            atom.position = p;
        }
        Ok(())
    }

    /// Hydrogens implied by the atom's default valence and not present as explicit atoms.
    pub fn implicit_hydrogens(&self, atom: usize) -> u8 {
        let Some(a) = self.atoms.get(atom) else {
            return 0;
        };
        if let Some(h) = a.explicit_hydrogens {
            return h;
        }
        let mut used: i16 = self.neighbors(atom).map(|(_, o)| o.valence() as i16).sum();
        if a.aromatic {
            used += 1;
        }
        let charge = a.formal_charge as i16;
        default_valences(&a.element)
            .iter()
            .map(|&v| match a.element.as_str() {
                "C" => v as i16 - charge.abs(),
                "B" => v as i16 - charge,
                _ => v as i16 + charge,
            })
            .find(|&v| v >= used)
            .map(|v| (v - used).clamp(0, u8::MAX as i16) as u8)
            .unwrap_or(0)
    }

    /// Total hydrogen count on an atom: explicit hydrogen neighbors plus implicit ones.
    pub fn hydrogen_count(&self, atom: usize) -> u8 {
        let explicit = self
            .neighbors(atom)
            .filter(|&(n, _)| self.atoms[n].is_hydrogen())
            .count() as u8;
        explicit.saturating_add(self.implicit_hydrogens(atom))
    }

    /// Adds single bonds between atoms closer than the sum of their covalent radii
    /// (scaled by `tolerance`). Used for formats that do not carry connectivity.
    pub fn infer_bonds_from_distances(&mut self, tolerance: f64) {
        let n = self.atoms.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (ai, aj) = (&self.atoms[i], &self.atoms[j]);
                if ai.is_hydrogen() && aj.is_hydrogen() {
                    continue;
                }
                let cutoff =
                    (covalent_radius(&ai.element) + covalent_radius(&aj.element)) * tolerance;
                let d = nalgebra::distance(&ai.position, &aj.position);
                if d > 0.4 && d <= cutoff {
                    // Indices are in range and the pair is visited once.
                    let _ = self.add_bond(i, j, BondOrder::Single);
                }
            }
        }
    }
}

/// Capitalizes an element symbol: `cl` and `CL` both become `Cl`.
pub fn normalize_element(symbol: &str) -> String {
    let mut chars = symbol.trim().chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

fn default_valences(element: &str) -> &'static [u8] {
    match element {
        "B" => &[3],
        "C" => &[4],
        "N" => &[3, 5],
        "O" => &[2],
        "P" => &[3, 5],
        "S" => &[2, 4, 6],
        "F" | "Cl" | "Br" | "I" => &[1],
        _ => &[],
    }
}

fn covalent_radius(element: &str) -> f64 {
    match element {
        "H" => 0.31,
        "B" => 0.84,
        "C" => 0.76,
        "N" => 0.71,
        "O" => 0.66,
        "F" => 0.57,
        "P" => 1.07,
        "S" => 1.05,
        "Cl" => 1.02,
        "Br" => 1.20,
        "I" => 1.39,
        _ => 1.20,
    }
}
