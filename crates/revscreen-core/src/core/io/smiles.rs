//! A SMILES reader covering the notation found in compound libraries: the organic
//! subset, aromatic atoms, bracket atoms, branches, ring closures and dot-separated
//! fragments. Stereochemistry is accepted but ignored.

use crate::core::models::molecule::{Atom, BondOrder, Molecule, MoleculeError};
use nalgebra::Point3;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SmilesError {
    #[error("SMILES string is empty")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("Unterminated bracket atom starting at position {0}")]
    UnterminatedBracket(usize),
    #[error("Invalid bracket atom '[{0}]'")]
    InvalidBracketAtom(String),
    #[error("Unbalanced parenthesis at position {0}")]
    UnbalancedParenthesis(usize),
    #[error("Bond or ring closure at position {0} has no preceding atom")]
    DanglingBond(usize),
    #[error("Ring closure {0} is never closed")]
    UnclosedRing(u32),
    #[error("Conflicting bond orders for ring closure {0}")]
    ConflictingRingBond(u32),
    #[error("Invalid bond: {0}")]
    Bond(#[from] MoleculeError),
}

const BRACKET_TWO_LETTER: &[&str] = &[
    "He", "Li", "Be", "Ne", "Na", "Mg", "Al", "Si", "Cl", "Ar", "Ca", "Sc", "Ti", "Cr", "Mn", "Fe",
    "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Zr", "Mo", "Ru", "Rh",
    "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "Xe", "Cs", "Ba", "Pt", "Au", "Hg", "Tl", "Pb", "Bi",
];

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    molecule: Molecule,
    previous: Option<usize>,
    branches: Vec<Option<usize>>,
    pending_bond: Option<(BondOrder, usize)>,
    rings: HashMap<u32, (usize, Option<BondOrder>)>,
    source: &'a str,
}

/// Parses a SMILES string into a [`Molecule`] whose atoms all sit at the origin.
pub fn parse_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::Empty);
    }
    Parser {
        chars: trimmed.chars().collect(),
        pos: 0,
        molecule: Molecule::new(trimmed),
        previous: None,
        branches: Vec::new(),
        pending_bond: None,
        rings: HashMap::new(),
        source: trimmed,
    }
    .run()
}

impl Parser<'_> {
    fn run(mut self) -> Result<Molecule, SmilesError> {
        while let Some(&ch) = self.chars.get(self.pos) {
            let start = self.pos;
            match ch {
                '(' => {
                    if self.previous.is_none() {
                        return Err(SmilesError::DanglingBond(start));
                    }
                    self.branches.push(self.previous);
                    self.pos += 1;
                }
                ')' => {
                    self.previous = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnbalancedParenthesis(start))?;
                    self.pos += 1;
                }
                '-' | '/' | '\\' => self.set_bond(BondOrder::Single, start)?,
                '=' => self.set_bond(BondOrder::Double, start)?,
                '#' => self.set_bond(BondOrder::Triple, start)?,
                ':' => self.set_bond(BondOrder::Aromatic, start)?,
                '.' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::UnexpectedChar { ch, pos: start });
                    }
                    self.previous = None;
                    self.pos += 1;
                }
                '0'..='9' | '%' => {
                    let label = self.ring_label()?;
                    self.ring_closure(label, start)?;
                }
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom)?;
                }
                _ => {
                    let atom = self
                        .organic_atom()
                        .ok_or(SmilesError::UnexpectedChar { ch, pos: start })?;
                    self.push_atom(atom)?;
                }
            }
        }

        if !self.branches.is_empty() {
            return Err(SmilesError::UnbalancedParenthesis(self.chars.len()));
        }
        if let Some((_, pos)) = self.pending_bond {
            return Err(SmilesError::DanglingBond(pos));
        }
        if let Some(&label) = self.rings.keys().min() {
            return Err(SmilesError::UnclosedRing(label));
        }
        if self.molecule.is_empty() {
            return Err(SmilesError::Empty);
        }
        self.molecule.name = self.source.to_string();
        Ok(self.molecule)
    }

    fn set_bond(&mut self, order: BondOrder, pos: usize) -> Result<(), SmilesError> {
        if self.previous.is_none() || self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond(pos));
        }
        self.pending_bond = Some((order, pos));
        self.pos += 1;
        Ok(())
    }

    fn ring_label(&mut self) -> Result<u32, SmilesError> {
        let ch = self.chars[self.pos];
        if ch == '%' {
            let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
            if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(SmilesError::UnexpectedChar { ch, pos: self.pos });
            }
            self.pos += 3;
            digits
                .parse()
                .map_err(|_| SmilesError::UnexpectedChar { ch, pos: self.pos })
        } else {
            self.pos += 1;
            Ok(ch.to_digit(10).unwrap_or(0))
        }
    }

    fn ring_closure(&mut self, label: u32, pos: usize) -> Result<(), SmilesError> {
        let current = self.previous.ok_or(SmilesError::DanglingBond(pos))?;
        let bond = self.pending_bond.take().map(|(order, _)| order);
        match self.rings.remove(&label) {
            Some((opening, opening_bond)) => {
                let order = match (opening_bond, bond) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(SmilesError::ConflictingRingBond(label));
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => self.default_order(opening, current),
                };
                self.molecule.add_bond(opening, current, order)?;
            }
            None => {
                self.rings.insert(label, (current, bond));
            }
        }
        Ok(())
    }

    fn push_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let index = self.molecule.add_atom(atom);
        if let Some(previous) = self.previous {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => self.default_order(previous, index),
            };
            self.molecule.add_bond(previous, index, order)?;
        }
        self.previous = Some(index);
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        let aromatic = |i: usize| self.molecule.atom(i).is_some_and(|atom| atom.aromatic);
        if aromatic(a) && aromatic(b) {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn organic_atom(&mut self) -> Option<Atom> {
        let ch = *self.chars.get(self.pos)?;
        let next = self.chars.get(self.pos + 1).copied();
        let (symbol, aromatic, width) = match (ch, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I', _) => (ch_symbol(ch), false, 1),
            ('b' | 'c' | 'n' | 'o' | 'p' | 's', _) => (ch_symbol(ch), true, 1),
            _ => return None,
        };
        self.pos += width;
        let mut atom = Atom::new(symbol, Point3::origin());
        atom.aromatic = aromatic;
        Some(atom)
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        let close = self.chars[open..]
            .iter()
            .position(|&c| c == ']')
            .map(|offset| open + offset)
            .ok_or(SmilesError::UnterminatedBracket(open))?;
        let body: String = self.chars[open + 1..close].iter().collect();
        self.pos = close + 1;
        parse_bracket_body(&body).ok_or(SmilesError::InvalidBracketAtom(body))
    }
}

fn ch_symbol(ch: char) -> &'static str {
    match ch.to_ascii_uppercase() {
        'B' => "B",
        'C' => "C",
        'N' => "N",
        'O' => "O",
        'P' => "P",
        'S' => "S",
        'F' => "F",
        _ => "I",
    }
}

fn parse_bracket_body(body: &str) -> Option<Atom> {
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;

    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }

    let first = *chars.get(i)?;
    let second = chars.get(i + 1).copied();
    let (symbol, aromatic) = if first.is_ascii_uppercase() {
        let pair: String = [Some(first), second].into_iter().flatten().collect();
        if BRACKET_TWO_LETTER.contains(&pair.as_str()) {
            i += 2;
            (pair, false)
        } else {
            i += 1;
            (first.to_string(), false)
        }
    } else if first.is_ascii_lowercase() {
        let pair: String = [Some(first), second].into_iter().flatten().collect();
        if pair == "se" || pair == "as" {
            i += 2;
            (pair, true)
        } else if matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
            i += 1;
            (first.to_string(), true)
        } else {
            return None;
        }
    } else {
        return None;
    };

    let chirality_start = i;
    while chars.get(i) == Some(&'@') {
        i += 1;
    }
    while i > chirality_start
        && chars
            .get(i)
            .is_some_and(|c| c.is_ascii_uppercase() && *c != 'H')
    {
        // Extended chirality classes such as @TH1 or @SP2.
        i += 1;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
    }

    let mut hydrogens = 0u8;
    if chars.get(i) == Some(&'H') {
        i += 1;
        hydrogens = 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > start {
            hydrogens = chars[start..i].iter().collect::<String>().parse().ok()?;
        }
    }

    let mut charge = 0i8;
    if let Some(&sign_char) = chars.get(i) {
        if sign_char == '+' || sign_char == '-' {
            let sign = if sign_char == '+' { 1 } else { -1 };
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            let magnitude = if i > start {
                chars[start..i].iter().collect::<String>().parse::<i8>().ok()?
            } else {
                let mut repeated = 1;
                while chars.get(i) == Some(&sign_char) {
                    repeated += 1;
                    i += 1;
                }
                repeated
            };
            charge = sign * magnitude;
        }
    }

    if chars.get(i) == Some(&':') {
        i += 1;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
    }
    if i != chars.len() {
        return None;
    }

    let mut atom = Atom::new(&symbol, Point3::origin()).with_charge(charge);
    atom.aromatic = aromatic;
    atom.explicit_hydrogens = Some(hydrogens);
    Some(atom)
}
