use super::config::QuerySource;
use super::error::EngineError;
use crate::core::models::query::Query;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Name given to the query of a single-query run.
pub const SINGLE_QUERY_NAME: &str = "Query";

/// Why a batch row was dropped. Never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkipReason {
    #[error("missing name")]
    MissingName,
    #[error("no SMILES or File provided")]
    MissingPayload,
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("duplicate name (first used on line {first_line})")]
    DuplicateName { first_line: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the batch file.
    pub line: u64,
    pub name: Option<String>,
    pub reason: RowSkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedQueries {
    pub queries: Vec<Query>,
    pub skipped: Vec<SkippedRow>,
}

/// Resolves a [`QuerySource`] into the queries of a run.
///
/// Fails with [`EngineError::EmptyQuerySet`] when no valid query remains.
#[instrument(skip_all, name = "load_queries")]
pub fn load_queries(source: &QuerySource) -> Result<LoadedQueries, EngineError> {
    let loaded = match source {
        QuerySource::Single(payload) => {
            let query = Query::classify(SINGLE_QUERY_NAME, payload);
            info!("Query molecule ({}): {}", query.kind(), query.payload());
            LoadedQueries {
                queries: vec![query],
                skipped: Vec::new(),
            }
        }
        QuerySource::Batch(path) => {
            info!("Loading queries from CSV: {}", path.display());
            let reader = ReaderBuilder::new()
                .flexible(true)
                .trim(Trim::All)
                .from_path(path)
                .map_err(|source| EngineError::Csv {
                    path: path.clone(),
                    source,
                })?;
            read_batch(reader).map_err(|source| EngineError::Csv {
                path: path.clone(),
                source,
            })?
        }
    };

    if loaded.queries.is_empty() {
        return Err(EngineError::EmptyQuerySet {
            skipped: loaded.skipped.len(),
        });
    }
    info!("Found {} query molecule(s)", loaded.queries.len());
    Ok(loaded)
}

/// Parses batch rows from any CSV source. Headers are matched case-insensitively.
///
/// Query names must be unique within a run; later rows reusing a name are skipped.
pub fn read_batch<R: Read>(mut reader: csv::Reader<R>) -> Result<LoadedQueries, csv::Error> {
    let headers = reader.headers()?.clone();
    let columns = BatchColumns::locate(&headers);
    if columns.name.is_none() {
        warn!("Batch query file has no 'name' column; every row will be skipped.");
    }

    let mut loaded = LoadedQueries::default();
    let mut first_seen: HashMap<String, u64> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let parsed = columns.parse_row(&record).and_then(|query| {
            match first_seen.get(query.name()) {
                Some(&first_line) => Err((
                    Some(query.name().to_string()),
                    RowSkipReason::DuplicateName { first_line },
                )),
                None => {
                    first_seen.insert(query.name().to_string(), line);
                    Ok(query)
                }
            }
        });
        match parsed {
            Ok(query) => loaded.queries.push(query),
            Err((name, reason)) => {
                warn!("Skipping row {}: {}", line, reason);
                loaded.skipped.push(SkippedRow { line, name, reason });
            }
        }
    }
    Ok(loaded)
}

struct BatchColumns {
    name: Option<usize>,
    smiles: Option<usize>,
    file: Option<usize>,
}

impl BatchColumns {
    fn locate(headers: &StringRecord) -> Self {
        let find = |key: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(key));
        Self {
            name: find("name"),
            smiles: find("smiles"),
            file: find("file"),
        }
    }

    fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> Option<&'r str> {
        index
            .and_then(|i| record.get(i))
            .filter(|value| !value.is_empty())
    }

    fn parse_row(&self, record: &StringRecord) -> Result<Query, (Option<String>, RowSkipReason)> {
        let Some(name) = Self::field(record, self.name) else {
            return Err((None, RowSkipReason::MissingName));
        };

        let smiles = Self::field(record, self.smiles);
        let file = Self::field(record, self.file);

        match (smiles, file) {
            (Some(smiles), file) => {
                if file.is_some() {
                    warn!("Query '{}' has both SMILES and File; using SMILES.", name);
                }
                Ok(Query::smiles(name, smiles))
            }
            (None, Some(file)) => {
                if Path::new(file).exists() {
                    Ok(Query::structure_file(name, file))
                } else {
                    Err((
                        Some(name.to_string()),
                        RowSkipReason::FileNotFound(PathBuf::from(file)),
                    ))
                }
            }
            (None, None) => Err((Some(name.to_string()), RowSkipReason::MissingPayload)),
        }
    }
}
