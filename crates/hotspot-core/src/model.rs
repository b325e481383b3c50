//! Hotspot classifier capability.
//!
//! The scorer only needs "feature vectors in, probabilities out". Training
//! happens elsewhere; the implementations here are a rule-based model and a
//! logistic model whose coefficients are loaded from JSON.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};
use crate::features::{FeatureVector, N_FEATURES};
use crate::labels::suitability_of;

/// A calibrated binary classifier over `[sst, chl, sst_anom, month]`.
pub trait HotspotModel: Send + Sync {
    /// One probability per input row, in input order.
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}

impl<M: HotspotModel + ?Sized> HotspotModel for &M {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        (**self).predict_proba(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: HotspotModel + ?Sized> HotspotModel for Box<M> {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        (**self).predict_proba(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Noise-free habitat suitability used directly as a probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuitabilityModel;

impl HotspotModel for SuitabilityModel {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        Ok(features.iter().map(|f| suitability_of(f).clamp(0.0, 1.0)).collect())
    }

    fn name(&self) -> &str {
        "suitability"
    }
}

/// `p = σ(intercept + coefficients · x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: [f64; N_FEATURES],
}

impl LogisticModel {
    /// Read coefficients from a JSON file such as
    /// `{"intercept": -4.0, "coefficients": [0.1, 1.2, 0.8, 0.0]}`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HotspotError::io(path, e))?;
        let model: Self = serde_json::from_str(&text)?;
        if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(HotspotError::Model(format!(
                "non-finite coefficients in {}",
                path.display()
            )));
        }
        Ok(model)
    }

    fn logit(&self, x: &FeatureVector) -> f64 {
        self.intercept + self.coefficients.iter().zip(x).map(|(w, v)| w * v).sum::<f64>()
    }
}

impl HotspotModel for LogisticModel {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>> {
        Ok(features.iter().map(|x| 1.0 / (1.0 + (-self.logit(x)).exp())).collect())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}

/// Load a logistic model from `path`, or fall back to [`SuitabilityModel`].
pub fn load_model(path: Option<&Path>) -> Result<Box<dyn HotspotModel>> {
    match path {
        Some(p) => {
            let m = LogisticModel::load(p)?;
            tracing::info!(path = %p.display(), "loaded logistic hotspot model");
            Ok(Box::new(m))
        }
        None => Ok(Box::new(SuitabilityModel)),
    }
}
