//! GeoJSON export of per-cell predictions.
//!
//! One `FeatureCollection` per week, one `Point` per ocean cell with
//! coordinates `[lon, lat]` and property `p`. When a port and λ are supplied
//! each feature also carries `dist_km` and `score`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::error::{HotspotError, Result};
use crate::features::{FeatureVector, WeeklyFeatureRow};
use crate::model::HotspotModel;
use crate::scorer::{clip_probability, validate_lambda, ScoredCell};
use crate::store::write_json_atomic;
use crate::week::IsoWeek;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellProperties {
    pub p: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: CellProperties,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Distance annotation applied to every exported feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortPenalty {
    pub port: LatLon,
    pub lambda: f64,
}

impl Feature {
    pub fn point(lat: f64, lon: f64, properties: CellProperties) -> Self {
        Self { geometry: Geometry::Point { coordinates: [lon, lat] }, properties }
    }

    pub fn lat_lon(&self) -> LatLon {
        let Geometry::Point { coordinates: [lon, lat] } = self.geometry;
        LatLon::new(lat, lon)
    }
}

/// Predict every complete row and wrap the result as GeoJSON, in row order.
pub fn predictions_to_geojson<M: HotspotModel + ?Sized>(
    rows: &[WeeklyFeatureRow],
    model: &M,
    penalty: Option<PortPenalty>,
) -> Result<FeatureCollection> {
    if let Some(pp) = penalty {
        validate_lambda(pp.lambda)?;
    }
    let complete: Vec<&WeeklyFeatureRow> = rows.iter().filter(|r| r.is_complete()).collect();
    if complete.is_empty() {
        return Ok(FeatureCollection::default());
    }
    let xs: Vec<FeatureVector> = complete.iter().map(|r| r.feature_vector()).collect();
    let probs = model.predict_proba(&xs)?;
    if probs.len() != xs.len() {
        return Err(HotspotError::Model(format!(
            "model '{}' returned {} probabilities for {} rows",
            model.name(),
            probs.len(),
            xs.len()
        )));
    }

    let features = complete
        .iter()
        .zip(probs)
        .map(|(r, p)| {
            let properties = match penalty {
                Some(pp) => {
                    let c = ScoredCell::new(r.lat, r.lon, p, r.latlon().distance_km(pp.port), pp.lambda);
                    CellProperties { p: c.p, dist_km: Some(c.dist_km), score: Some(c.score) }
                }
                None => CellProperties { p: clip_probability(p), dist_km: None, score: None },
            };
            Feature::point(r.lat, r.lon, properties)
        })
        .collect();
    Ok(FeatureCollection { features })
}

/// `<dir>/<week>.geojson`.
pub fn geojson_path(dir: &Path, week: IsoWeek) -> PathBuf {
    dir.join(format!("{week}.geojson"))
}

/// Write a week's collection atomically and return the path written.
pub fn write_week_geojson(dir: &Path, week: IsoWeek, fc: &FeatureCollection) -> Result<PathBuf> {
    let path = geojson_path(dir, week);
    write_json_atomic(&path, fc)?;
    tracing::info!(path = %path.display(), features = fc.features.len(), "wrote GeoJSON");
    Ok(path)
}
