use super::feature::FeatureKind;
use nalgebra::Point3;

/// Default matching tolerance around a hotspot, in Angstroms.
pub const DEFAULT_HOTSPOT_RADIUS: f64 = 1.5;

/// A single labeled feature point of a protein pharmacophore.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    /// The ligand feature category this hotspot rewards.
    pub feature: FeatureKind,
    /// Where a matching ligand feature should sit, in the model's coordinate frame.
    pub position: Point3<f64>,
    /// The hotspot's density contribution, usually in `[0, 1]`.
    pub score: f64,
    /// The Gaussian width used when scoring distance to this hotspot.
    pub radius: f64,
}

impl Hotspot {
    pub fn new(feature: FeatureKind, position: Point3<f64>, score: f64) -> Self {
        Self {
            feature,
            position,
            score,
            radius: DEFAULT_HOTSPOT_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

/// Returns the unweighted centroid of a set of hotspots, or `None` if the set is empty.
pub fn centroid(hotspots: &[Hotspot]) -> Option<Point3<f64>> {
    if hotspots.is_empty() {
        return None;
    }
    let sum = hotspots
        .iter()
        .fold(nalgebra::Vector3::<f64>::zeros(), |acc, h| acc + h.position.coords);
    Some(Point3::from(sum / hotspots.len() as f64))
}
