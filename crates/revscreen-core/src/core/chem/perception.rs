use crate::core::models::feature::FeatureKind;
use crate::core::models::molecule::{BondOrder, Molecule};
use nalgebra::{Point3, Vector3};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Largest ring considered during aromatic ring perception.
const MAX_RING_SIZE: usize = 7;

/// A pharmacophoric feature of a ligand, defined on the molecular graph.
///
/// The feature's 3D location is the centroid of its atoms and therefore depends on
/// the conformer; see [`feature_points`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigandFeature {
    pub kind: FeatureKind,
    pub atoms: Vec<usize>,
}

/// A ligand feature resolved to a position in one conformer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePoint {
    pub kind: FeatureKind,
    pub position: Point3<f64>,
}

/// Assigns pharmacophoric features to the heavy atoms and aromatic rings of a molecule.
pub fn perceive_features(molecule: &Molecule) -> Vec<LigandFeature> {
    let mut features = Vec::new();
    let mut push = |kind: FeatureKind, atom: usize| {
        features.push(LigandFeature {
            kind,
            atoms: vec![atom],
        })
    };

    for (index, atom) in molecule.atoms().iter().enumerate() {
        if atom.is_hydrogen() {
            continue;
        }
        let charge = atom.formal_charge;
        let hydrogens = molecule.hydrogen_count(index);

        if charge < 0 {
            push(FeatureKind::Anion, index);
        } else if charge > 0 {
            push(FeatureKind::Cation, index);
        }

        match atom.element.as_str() {
            "O" => {
                if charge <= 0 {
                    push(FeatureKind::HBondAcceptor, index);
                }
                if hydrogens > 0 {
                    push(FeatureKind::HBondDonor, index);
                    if charge == 0 && is_carboxylic_acid_oxygen(molecule, index) {
                        push(FeatureKind::Anion, index);
                    }
                }
            }
            "N" => {
                if hydrogens > 0 {
                    push(FeatureKind::HBondDonor, index);
                }
                let amide_like = !atom.aromatic && has_conjugated_neighbor(molecule, index);
                if charge <= 0 && !(atom.aromatic && hydrogens > 0) && !amide_like {
                    push(FeatureKind::HBondAcceptor, index);
                }
                if charge == 0 && is_basic_amine(molecule, index) {
                    push(FeatureKind::Cation, index);
                }
            }
            "Cl" | "Br" | "I" => push(FeatureKind::Halogen, index),
            "S" => {
                let saturated = molecule.neighbors(index).all(|(_, o)| o == BondOrder::Single);
                if charge == 0 && saturated && molecule.heavy_degree(index) <= 2 {
                    push(FeatureKind::Hydrophobic, index);
                }
            }
            "C" => {
                let polar_neighbor = molecule.neighbors(index).any(|(n, _)| {
                    matches!(
                        molecule.atom(n).map(|a| a.element.as_str()),
                        Some("N" | "O")
                    )
                });
                if charge == 0 && !polar_neighbor {
                    push(FeatureKind::Hydrophobic, index);
                }
            }
            _ => {}
        }
    }

    for ring in find_rings(molecule, MAX_RING_SIZE) {
        if is_aromatic_ring(molecule, &ring) {
            features.push(LigandFeature {
                kind: FeatureKind::Aromatic,
                atoms: ring,
            });
        }
    }

    features
}

/// Resolves topological features to positions using one set of coordinates.
pub fn feature_points(features: &[LigandFeature], positions: &[Point3<f64>]) -> Vec<FeaturePoint> {
    features
        .iter()
        .filter_map(|feature| {
            let mut sum = Vector3::<f64>::zeros();
            for &atom in &feature.atoms {
                sum += positions.get(atom)?.coords;
            }
            let count = feature.atoms.len().max(1) as f64;
            Some(FeaturePoint {
                kind: feature.kind,
                position: Point3::from(sum / count),
            })
        })
        .collect()
}

/// Finds the smallest ring through every ring bond, up to `max_size` atoms.
///
/// Each ring is returned once, as an ordered cycle of heavy-atom indices. For fused
/// systems this yields the individual small rings, which is what aromatic
/// perception needs.
pub fn find_rings(molecule: &Molecule, max_size: usize) -> Vec<Vec<usize>> {
    let mut rings = Vec::new();
    let mut seen: HashSet<BTreeSet<usize>> = HashSet::new();
    let heavy = |i: usize| molecule.atom(i).is_some_and(|a| !a.is_hydrogen());

    for bond in molecule.bonds() {
        let (start, goal) = (bond.atom1, bond.atom2);
        if !heavy(start) || !heavy(goal) {
            continue;
        }

        let mut parent = vec![usize::MAX; molecule.atom_count()];
        let mut depth = vec![0usize; molecule.atom_count()];
        let mut queue = VecDeque::from([start]);
        parent[start] = start;

        while let Some(current) = queue.pop_front() {
            if current == goal || depth[current] + 1 >= max_size {
                continue;
            }
            for (next, _) in molecule.neighbors(current) {
                if !heavy(next) || parent[next] != usize::MAX {
                    continue;
                }
                if current == start && next == goal {
                    continue;
                }
                parent[next] = current;
                depth[next] = depth[current] + 1;
                queue.push_back(next);
            }
        }

        if parent[goal] == usize::MAX {
            continue;
        }
        let mut ring = vec![goal];
        let mut cursor = goal;
        while cursor != start {
            cursor = parent[cursor];
            ring.push(cursor);
        }
        if ring.len() < 3 || ring.len() > max_size {
            continue;
        }
        if seen.insert(ring.iter().copied().collect()) {
            rings.push(ring);
        }
    }

    rings
}

fn is_aromatic_ring(molecule: &Molecule, ring: &[usize]) -> bool {
    let atoms: Vec<_> = ring.iter().filter_map(|&i| molecule.atom(i)).collect();
    if atoms.len() != ring.len() {
        return false;
    }
    if atoms.iter().all(|a| a.aromatic) {
        return true;
    }

    let members: HashSet<usize> = ring.iter().copied().collect();
    let in_ring_double = |i: usize| {
        molecule
            .neighbors(i)
            .any(|(n, o)| o == BondOrder::Double && members.contains(&n))
    };
    let conjugated = ring.iter().filter(|&&i| in_ring_double(i)).count();

    match ring.len() {
        6 => conjugated == 6,
        5 => {
            conjugated == 4
                && ring.iter().any(|&i| {
                    !in_ring_double(i)
                        && matches!(
                            molecule.atom(i).map(|a| a.element.as_str()),
                            Some("N" | "O" | "S")
                        )
                })
        }
        _ => false,
    }
}

fn is_carboxylic_acid_oxygen(molecule: &Molecule, oxygen: usize) -> bool {
    molecule.neighbors(oxygen).any(|(carbon, order)| {
        order == BondOrder::Single
            && molecule.atom(carbon).is_some_and(|a| a.element == "C")
            && molecule.neighbors(carbon).any(|(other, o)| {
                other != oxygen
                    && o == BondOrder::Double
                    && molecule.atom(other).is_some_and(|a| a.element == "O")
            })
    })
}

/// True if any neighbor of `atom` takes part in a double, triple or aromatic bond.
fn has_conjugated_neighbor(molecule: &Molecule, atom: usize) -> bool {
    molecule.neighbors(atom).any(|(n, _)| {
        molecule.atom(n).is_some_and(|a| a.aromatic)
            || molecule.neighbors(n).any(|(_, o)| o != BondOrder::Single)
    })
}

fn is_basic_amine(molecule: &Molecule, nitrogen: usize) -> bool {
    let Some(atom) = molecule.atom(nitrogen) else {
        return false;
    };
    !atom.aromatic
        && molecule.heavy_degree(nitrogen) >= 1
        && molecule.neighbors(nitrogen).all(|(_, o)| o == BondOrder::Single)
        && !has_conjugated_neighbor(molecule, nitrogen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::smiles::parse_smiles;

    fn kinds(smiles: &str) -> Vec<FeatureKind> {
        let mol = parse_smiles(smiles).unwrap();
        let mut kinds: Vec<_> = perceive_features(&mol).into_iter().map(|f| f.kind).collect();
        kinds.sort();
        kinds
    }

    fn count(smiles: &str, kind: FeatureKind) -> usize {
        kinds(smiles).into_iter().filter(|&k| k == kind).count()
    }

    #[test]
    fn ethanol_has_hydroxyl_donor_acceptor_and_methyl_hydrophobe() {
        assert_eq!(
            kinds("CCO"),
            vec![
                FeatureKind::Hydrophobic,
                FeatureKind::HBondDonor,
                FeatureKind::HBondAcceptor
            ]
        );
    }

    #[test]
    fn benzene_has_one_aromatic_ring_feature() {
        assert_eq!(count("c1ccccc1", FeatureKind::Aromatic), 1);
        assert_eq!(count("C1=CC=CC=C1", FeatureKind::Aromatic), 1);
        assert_eq!(count("C1CCCCC1", FeatureKind::Aromatic), 0);
    }

    #[test]
    fn fused_rings_are_perceived_individually() {
        assert_eq!(count("c1ccc2ccccc2c1", FeatureKind::Aromatic), 2);
        assert_eq!(count("c1ccc2[nH]ccc2c1", FeatureKind::Aromatic), 2);
    }

    #[test]
    fn kekule_five_membered_heteroaromatics_are_aromatic() {
        assert_eq!(count("C1=CSC=C1", FeatureKind::Aromatic), 1);
        assert_eq!(count("C1=CCC=C1", FeatureKind::Aromatic), 0);
    }

    #[test]
    fn charges_and_acids_become_ionic_features() {
        assert_eq!(count("CC(=O)[O-]", FeatureKind::Anion), 1);
        assert_eq!(count("CC(=O)O", FeatureKind::Anion), 1);
        assert_eq!(count("C[NH3+]", FeatureKind::Cation), 1);
        assert_eq!(count("C[NH3+]", FeatureKind::HBondAcceptor), 0);
    }

    #[test]
    fn basic_amines_are_cations_but_amides_and_anilines_are_not() {
        assert_eq!(count("CCN(C)C", FeatureKind::Cation), 1);
        assert_eq!(count("CC(=O)NC", FeatureKind::Cation), 0);
        assert_eq!(count("CC(=O)NC", FeatureKind::HBondAcceptor), 1);
        assert_eq!(count("Nc1ccccc1", FeatureKind::Cation), 0);
    }

    #[test]
    fn pyridine_nitrogen_accepts_and_pyrrole_nitrogen_donates() {
        assert_eq!(count("c1ccncc1", FeatureKind::HBondAcceptor), 1);
        assert_eq!(count("c1cc[nH]c1", FeatureKind::HBondAcceptor), 0);
        assert_eq!(count("c1cc[nH]c1", FeatureKind::HBondDonor), 1);
    }

    #[test]
    fn heavy_halogens_are_halogen_bond_donors() {
        assert_eq!(count("CCl", FeatureKind::Halogen), 1);
        assert_eq!(count("CBr", FeatureKind::Halogen), 1);
        assert_eq!(count("CF", FeatureKind::Halogen), 0);
    }

    #[test]
    fn feature_points_use_atom_centroids() {
        let features = vec![
            LigandFeature {
                kind: FeatureKind::Aromatic,
                atoms: vec![0, 1],
            },
            LigandFeature {
                kind: FeatureKind::Cation,
                atoms: vec![5],
            },
        ];
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let points = feature_points(&features, &positions);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].position, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn find_rings_returns_each_small_ring_once() {
        let mol = parse_smiles("C1CC1C1CCCC1").unwrap();
        let mut sizes: Vec<_> = find_rings(&mol, MAX_RING_SIZE).iter().map(|r| r.len()).collect();
        sizes.sort();
        assert_eq!(sizes, vec![3, 5]);
    }
}
