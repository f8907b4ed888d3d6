use crate::core::models::molecule::Molecule;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading ligand structure file formats.
///
/// Every supported format may hold several records (multi-molecule SDF,
/// multi-model PDB). Each record is returned as its own [`Molecule`], which the
/// scorer treats as one conformer of the query.
pub trait StructureFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads every record from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Molecule>, Self::Error>;

    /// Reads every record from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Molecule>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

pub(crate) fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}
