use crate::core::models::molecule::{BondOrder, Molecule};
use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};
use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::instrument;

/// Bond length used whenever a hydrogen is involved, in Angstroms.
const HYDROGEN_BOND_LENGTH: f64 = 1.09;
/// Spacing between disconnected fragments, in Angstroms.
const FRAGMENT_OFFSET: f64 = 4.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConformerError {
    #[error("Cannot generate conformers for a molecule without atoms")]
    EmptyMolecule,
    #[error("Requested conformer count must be at least 1")]
    ZeroConformers,
}

/// One set of 3D coordinates, indexed like the molecule's atoms.
pub type Conformer = Vec<Point3<f64>>;

/// Produces 3D conformers from a molecular graph.
pub trait ConformerGenerator: Send + Sync {
    fn generate(
        &self,
        molecule: &Molecule,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Conformer>, ConformerError>;
}

/// Builds conformers by growing each fragment outward along a breadth-first spanning
/// tree, choosing a random bond direction for every atom and rejecting directions that
/// bring non-bonded atoms too close.
///
/// Ring-closure bonds are not enforced, so ring geometry is only approximate.
#[derive(Debug, Clone, Copy)]
pub struct RandomWalkEmbedder {
    pub min_contact: f64,
    pub max_attempts: usize,
}

impl Default for RandomWalkEmbedder {
    fn default() -> Self {
        Self {
            min_contact: 1.8,
            max_attempts: 24,
        }
    }
}

impl ConformerGenerator for RandomWalkEmbedder {
    #[instrument(level = "trace", skip_all, fields(atoms = molecule.atom_count(), count = count))]
    fn generate(
        &self,
        molecule: &Molecule,
        count: usize,
        rng: &mut impl Rng,
    ) -> Result<Vec<Conformer>, ConformerError> {
        if molecule.is_empty() {
            return Err(ConformerError::EmptyMolecule);
        }
        if count == 0 {
            return Err(ConformerError::ZeroConformers);
        }
        Ok((0..count).map(|_| self.embed_once(molecule, rng)).collect())
    }
}

impl RandomWalkEmbedder {
    fn embed_once(&self, molecule: &Molecule, rng: &mut impl Rng) -> Conformer {
        let n = molecule.atom_count();
        let mut coords: Vec<Option<Point3<f64>>> = vec![None; n];
        let mut fragments = 0usize;

        for root in 0..n {
            if coords[root].is_some() {
                continue;
            }
            let origin = if fragments == 0 {
                Point3::origin()
            } else {
                Point3::from(random_unit_vector(rng) * FRAGMENT_OFFSET * fragments as f64)
            };
            fragments += 1;
            coords[root] = Some(origin);

            let mut queue = VecDeque::from([root]);
            while let Some(parent) = queue.pop_front() {
                let Some(parent_pos) = coords[parent] else {
                    continue;
                };
                for (child, order) in molecule.neighbors(parent) {
                    if coords[child].is_some() {
                        continue;
                    }
                    let length = bond_length(molecule, parent, child, order);
                    let position = self.place(parent_pos, length, child, parent, molecule, &coords, rng);
                    coords[child] = Some(position);
                    queue.push_back(child);
                }
            }
        }

        let coords: Vec<Point3<f64>> = coords.into_iter().map(|c| c.unwrap_or_else(Point3::origin)).collect();
        center(coords)
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        parent_pos: Point3<f64>,
        length: f64,
        child: usize,
        parent: usize,
        molecule: &Molecule,
        coords: &[Option<Point3<f64>>],
        rng: &mut impl Rng,
    ) -> Point3<f64> {
        let mut best = parent_pos + random_unit_vector(rng) * length;
        let mut best_clearance = f64::NEG_INFINITY;

        for _ in 0..self.max_attempts.max(1) {
            let candidate = parent_pos + random_unit_vector(rng) * length;
            let clearance = coords
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != parent && i != child && molecule.bond_between(i, child).is_none())
                .filter_map(|(_, c)| c.map(|p| nalgebra::distance(&p, &candidate)))
                .fold(f64::INFINITY, f64::min);

            if clearance > best_clearance {
                best = candidate;
                best_clearance = clearance;
            }
            if clearance >= self.min_contact {
                break;
            }
        }
        best
    }
}

fn bond_length(molecule: &Molecule, a: usize, b: usize, order: BondOrder) -> f64 {
    let involves_h = [a, b]
        .iter()
        .any(|&i| molecule.atom(i).is_some_and(|atom| atom.is_hydrogen()));
    if involves_h {
        HYDROGEN_BOND_LENGTH
    } else {
        order.typical_length()
    }
}

fn center(coords: Vec<Point3<f64>>) -> Conformer {
    let Some(centroid) = centroid(&coords) else {
        return coords;
    };
    coords.into_iter().map(|p| Point3::from(p - centroid)).collect()
}

pub fn centroid(coords: &[Point3<f64>]) -> Option<Point3<f64>> {
    if coords.is_empty() {
        return None;
    }
    let sum = coords.iter().fold(Vector3::<f64>::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / coords.len() as f64))
}

pub fn random_unit_vector(rng: &mut impl Rng) -> Vector3<f64> {
    loop {
        let v = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let norm = v.norm();
        if norm > 1e-3 && norm <= 1.0 {
            return v / norm;
        }
    }
}

pub fn random_rotation(rng: &mut impl Rng) -> UnitQuaternion<f64> {
    loop {
        let q = Quaternion::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let norm = q.norm();
        if norm > 1e-3 && norm <= 1.0 {
            return UnitQuaternion::from_quaternion(q);
        }
    }
}

/// Rigidly rotates a conformer about its centroid and moves the centroid to `target`.
pub fn place_at(conformer: &[Point3<f64>], target: Point3<f64>, rotation: &UnitQuaternion<f64>) -> Conformer {
    let Some(origin) = centroid(conformer) else {
        return Vec::new();
    };
    conformer
        .iter()
        .map(|p| target + rotation * (p - origin))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles::parse_smiles;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generates_requested_number_of_conformers() {
        let mol = parse_smiles("CCCCO").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let conformers = RandomWalkEmbedder::default().generate(&mol, 5, &mut rng).unwrap();
        assert_eq!(conformers.len(), 5);
        assert!(conformers.iter().all(|c| c.len() == mol.atom_count()));
    }

    #[test]
    fn tree_bonds_have_typical_lengths() {
        let mol = parse_smiles("CC=O").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let conformer = &RandomWalkEmbedder::default().generate(&mol, 1, &mut rng).unwrap()[0];
        let single = nalgebra::distance(&conformer[0], &conformer[1]);
        let double = nalgebra::distance(&conformer[1], &conformer[2]);
        assert!((single - BondOrder::Single.typical_length()).abs() < 1e-9);
        assert!((double - BondOrder::Double.typical_length()).abs() < 1e-9);
    }

    #[test]
    fn conformers_are_centered_on_the_origin() {
        let mol = parse_smiles("CC(C)(C)O").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let conformer = &RandomWalkEmbedder::default().generate(&mol, 1, &mut rng).unwrap()[0];
        let c = centroid(conformer).unwrap();
        assert!(c.coords.norm() < 1e-9);
    }

    #[test]
    fn same_seed_reproduces_the_same_conformers() {
        let mol = parse_smiles("OCCN").unwrap();
        let embedder = RandomWalkEmbedder::default();
        let a = embedder.generate(&mol, 3, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = embedder.generate(&mol, 3, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_molecules_and_zero_counts() {
        let mut rng = StdRng::seed_from_u64(0);
        let embedder = RandomWalkEmbedder::default();
        assert_eq!(
            embedder.generate(&Molecule::new("empty"), 1, &mut rng),
            Err(ConformerError::EmptyMolecule)
        );
        let mol = parse_smiles("C").unwrap();
        assert_eq!(embedder.generate(&mol, 0, &mut rng), Err(ConformerError::ZeroConformers));
    }

    #[test]
    fn place_at_moves_centroid_and_preserves_distances() {
        let conformer = vec![Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        let mut rng = StdRng::seed_from_u64(5);
        let rotation = random_rotation(&mut rng);
        let placed = place_at(&conformer, Point3::new(10.0, 5.0, -3.0), &rotation);
        let c = centroid(&placed).unwrap();
        assert!((c - Point3::new(10.0, 5.0, -3.0)).norm() < 1e-9);
        assert!((nalgebra::distance(&placed[0], &placed[1]) - 2.0).abs() < 1e-9);
    }
}
