use super::error::EngineError;
use super::stats::ScoreStatistics;
use super::worker::ScoreResult;
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub const RESULT_HEADER: [&str; 3] = ["query_name", "pharmacophore_model", "score"];

/// Flat table of ranked results, in query order and then rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<ScoreResult>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, ranked: impl IntoIterator<Item = ScoreResult>) {
        self.rows.extend(ranked);
    }

    pub fn rows(&self) -> &[ScoreResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn statistics(&self) -> Option<ScoreStatistics> {
        ScoreStatistics::from_scores(self.rows.iter().map(|r| r.score))
    }

    /// Writes the table to `path`, creating parent directories as needed.
    pub fn write_csv(&self, path: &Path) -> Result<(), EngineError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| EngineError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = fs::File::create(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_to(file).map_err(|source| EngineError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Saved {} result row(s) to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(RESULT_HEADER)?;
        for row in &self.rows {
            let model = model_field(&row.model_path);
            let score = format_score(row.score);
            writer.write_record([row.query_name.as_str(), model.as_ref(), score.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Text stored in the `pharmacophore_model` column.
///
/// The CSV is UTF-8, so a path that is not valid Unicode is written with
/// replacement characters and a warning names the affected model.
fn model_field(path: &Path) -> Cow<'_, str> {
    let text = path.to_string_lossy();
    if let Cow::Owned(_) = text {
        warn!(
            "Model path {} is not valid UTF-8; the results file stores it as '{}'.",
            path.display(),
            text
        );
    }
    text
}

/// Decimal rendering that always carries a fractional part (`3` becomes `3.0`).
pub fn format_score(score: f64) -> String {
    let text = score.to_string();
    if score.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}
