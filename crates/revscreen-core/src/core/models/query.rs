use std::fmt;
use std::path::Path;

/// How a query payload is interpreted by the scoring capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// A SMILES line notation; conformers are generated before scoring.
    Smiles,
    /// A path to a 3D structure file scored as-is.
    StructureFile,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PayloadKind::Smiles => "SMILES",
                PayloadKind::StructureFile => "file",
            }
        )
    }
}

/// One query molecule of a screening run. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    name: String,
    payload: String,
    kind: PayloadKind,
}

impl Query {
    /// Classifies `payload` as a structure file if it names an existing path,
    /// otherwise as a SMILES string.
    pub fn classify(name: &str, payload: &str) -> Self {
        let kind = if Path::new(payload).exists() {
            PayloadKind::StructureFile
        } else {
            PayloadKind::Smiles
        };
        Self {
            name: name.to_string(),
            payload: payload.to_string(),
            kind,
        }
    }

    pub fn smiles(name: &str, smiles: &str) -> Self {
        Self {
            name: name.to_string(),
            payload: smiles.to_string(),
            kind: PayloadKind::Smiles,
        }
    }

    /// Builds a structure-file query. Callers are expected to have checked that
    /// the file exists; see [`Query::classify`] for the checked form.
    pub fn structure_file(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            payload: path.to_string(),
            kind: PayloadKind::StructureFile,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }
}
