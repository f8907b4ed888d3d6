use crate::core::models::feature::FeatureKind;
use crate::core::models::hotspot::{DEFAULT_HOTSPOT_RADIUS, Hotspot};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File extension reserved for serialized pharmacophore models.
pub const MODEL_FILE_EXTENSION: &str = "pm";

#[derive(Debug, Error)]
pub enum ModelFileError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Model '{path}' defines no hotspots")]
    NoHotspots { path: String },
    #[error("Hotspot {index} in model '{path}' is invalid: {reason}")]
    InvalidHotspot {
        path: String,
        index: usize,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHotspot {
    feature: FeatureKind,
    position: [f64; 3],
    score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    radius: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModelFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default)]
    hotspots: Vec<RawHotspot>,
}

/// The on-disk form of a pharmacophore model: a named set of hotspots.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFile {
    pub name: String,
    pub source: Option<String>,
    pub hotspots: Vec<Hotspot>,
}

impl ModelFile {
    /// Loads and validates a `.pm` model. The model name defaults to the file stem.
    pub fn load(path: &Path) -> Result<Self, ModelFileError> {
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| ModelFileError::Io {
            path: display.clone(),
            source: e,
        })?;
        let raw: RawModelFile = toml::from_str(&content).map_err(|e| ModelFileError::Toml {
            path: display.clone(),
            source: e,
        })?;
        Self::from_raw(raw, path, &display)
    }

    fn from_raw(raw: RawModelFile, path: &Path, display: &str) -> Result<Self, ModelFileError> {
        if raw.hotspots.is_empty() {
            return Err(ModelFileError::NoHotspots {
                path: display.to_string(),
            });
        }

        let hotspots = raw
            .hotspots
            .into_iter()
            .enumerate()
            .map(|(index, h)| {
                let invalid = |reason| ModelFileError::InvalidHotspot {
                    path: display.to_string(),
                    index,
                    reason,
                };
                if !h.position.iter().all(|c| c.is_finite()) {
                    return Err(invalid("position must be finite"));
                }
                if !h.score.is_finite() || h.score < 0.0 {
                    return Err(invalid("score must be finite and non-negative"));
                }
                let radius = h.radius.unwrap_or(DEFAULT_HOTSPOT_RADIUS);
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(invalid("radius must be positive"));
                }
                let [x, y, z] = h.position;
                Ok(Hotspot::new(h.feature, Point3::new(x, y, z), h.score).with_radius(radius))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let name = raw.name.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(Self {
            name,
            source: raw.source,
            hotspots,
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ModelFileError> {
        let raw = RawModelFile {
            name: Some(self.name.clone()),
            source: self.source.clone(),
            hotspots: self
                .hotspots
                .iter()
                .map(|h| RawHotspot {
                    feature: h.feature,
                    position: [h.position.x, h.position.y, h.position.z],
                    score: h.score,
                    radius: Some(h.radius),
                })
                .collect(),
        };
        Ok(toml::to_string(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelFileError> {
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|e| ModelFileError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1abc.pm");
        fs::write(
            &path,
            r#"
            source = "1ABC"

            [[hotspots]]
            feature = "HBond_donor"
            position = [1.0, 2.0, 3.0]
            score = 0.9

            [[hotspots]]
            feature = "Aromatic"
            position = [0.0, 0.0, 0.0]
            score = 0.5
            radius = 2.0
            "#,
        )
        .unwrap();

        let model = ModelFile::load(&path).unwrap();
        assert_eq!(model.name, "1abc");
        assert_eq!(model.source.as_deref(), Some("1ABC"));
        assert_eq!(model.hotspots.len(), 2);
        assert_eq!(model.hotspots[0].feature, FeatureKind::HBondDonor);
        assert_eq!(model.hotspots[0].radius, DEFAULT_HOTSPOT_RADIUS);
        assert_eq!(model.hotspots[1].radius, 2.0);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = ModelFile::load(&dir.path().join("missing.pm"));
        assert!(matches!(result, Err(ModelFileError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.pm");
        fs::write(&path, "this is not toml").unwrap();
        assert!(matches!(ModelFile::load(&path), Err(ModelFileError::Toml { .. })));
    }

    #[test]
    fn load_fails_for_unknown_feature_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.pm");
        fs::write(
            &path,
            "[[hotspots]]\nfeature = \"PiStacking\"\nposition = [0.0, 0.0, 0.0]\nscore = 1.0\n",
        )
        .unwrap();
        assert!(matches!(ModelFile::load(&path), Err(ModelFileError::Toml { .. })));
    }

    #[test]
    fn load_fails_without_hotspots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.pm");
        fs::write(&path, "name = \"empty\"\n").unwrap();
        assert!(matches!(
            ModelFile::load(&path),
            Err(ModelFileError::NoHotspots { .. })
        ));
    }

    #[test]
    fn load_fails_for_negative_scores() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("neg.pm");
        fs::write(
            &path,
            "[[hotspots]]\nfeature = \"Anion\"\nposition = [0.0, 0.0, 0.0]\nscore = -1.0\n",
        )
        .unwrap();
        assert!(matches!(
            ModelFile::load(&path),
            Err(ModelFileError::InvalidHotspot { index: 0, .. })
        ));
    }

    #[test]
    fn saved_models_load_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("saved.pm");
        let model = ModelFile {
            name: "pocket".to_string(),
            source: None,
            hotspots: vec![
                Hotspot::new(FeatureKind::Cation, Point3::new(1.5, -2.0, 0.25), 0.75),
                Hotspot::new(FeatureKind::Halogen, Point3::new(0.0, 1.0, 2.0), 0.5).with_radius(1.0),
            ],
        };
        model.save(&path).unwrap();
        assert_eq!(ModelFile::load(&path).unwrap(), model);
    }
}
