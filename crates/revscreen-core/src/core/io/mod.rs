pub mod mol2;
pub mod model_file;
pub mod pdb;
pub mod sdf;
pub mod smiles;
pub mod traits;

use crate::core::models::molecule::Molecule;
use std::path::Path;
use thiserror::Error;
use traits::StructureFile;

#[derive(Debug, Error)]
pub enum StructureReadError {
    #[error("Unsupported structure file extension '{0}' (expected sdf, mol, mol2 or pdb)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Sdf(#[from] sdf::SdfError),
    #[error(transparent)]
    Mol2(#[from] mol2::Mol2Error),
    #[error(transparent)]
    Pdb(#[from] pdb::PdbError),
    #[error("Structure file contains no molecules")]
    Empty,
}

/// Reads every record of a ligand structure file, picking the format by extension.
pub fn read_structure(path: &Path) -> Result<Vec<Molecule>, StructureReadError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let molecules = match extension.as_str() {
        "sdf" | "sd" | "mol" => sdf::SdfFile::read_from_path(path)?,
        "mol2" => mol2::Mol2File::read_from_path(path)?,
        "pdb" | "ent" => pdb::PdbFile::read_from_path(path)?,
        _ => return Err(StructureReadError::UnsupportedFormat(extension)),
    };

    let molecules: Vec<Molecule> = molecules.into_iter().filter(|m| !m.is_empty()).collect();
    if molecules.is_empty() {
        return Err(StructureReadError::Empty);
    }
    Ok(molecules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn rejects_unknown_extensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ligand.xyz");
        fs::write(&path, "1\n\nC 0 0 0\n").unwrap();
        assert!(matches!(
            read_structure(&path),
            Err(StructureReadError::UnsupportedFormat(ext)) if ext == "xyz"
        ));
    }

    #[test]
    fn empty_files_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ligand.pdb");
        fs::write(&path, "END\n").unwrap();
        assert!(matches!(read_structure(&path), Err(StructureReadError::Empty)));
    }

    #[test]
    fn dispatches_on_extension_case_insensitively() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ligand.PDB");
        fs::write(
            &path,
            "HETATM    1  C1  LIG A   1       0.000   0.000   0.000  1.00  0.00           C\n",
        )
        .unwrap();
        let mols = read_structure(&path).unwrap();
        assert_eq!(mols.len(), 1);
    }
}
