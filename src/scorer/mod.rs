pub mod bootstrap;
pub mod loader;
pub mod model;

use std::sync::Arc;

use crate::config::ModelConfig;
use crate::domain::{Error, RiskScorer};
use crate::features::FeatureVector;

pub use loader::{load_model, load_or_bootstrap, provision_model, save_model};
pub use model::{FraudModel, TrainingParams, TrainingSample};

/// Scores with a loaded `FraudModel`. The model is shared read-only.
#[derive(Debug, Clone)]
pub struct ModelScorer {
    model: Arc<FraudModel>,
}

impl ModelScorer {
    pub fn new(model: FraudModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    /// Load the configured artifact, bootstrapping it if allowed.
    pub fn from_config(settings: &ModelConfig) -> Result<Self, Error> {
        let model = load_or_bootstrap(settings)
            .map_err(|e| Error::ScoringUnavailable(format!("cannot load fraud model: {}", e)))?;
        Ok(Self::new(model))
    }

    pub fn model(&self) -> &FraudModel {
        &self.model
    }
}

impl RiskScorer for ModelScorer {
    fn score(&self, features: &FeatureVector) -> Result<f64, Error> {
        if features.values().iter().any(|v| !v.is_finite()) {
            return Err(Error::ScoringUnavailable(format!(
                "non-finite feature vector {:?}",
                features.values()
            )));
        }

        let probability = self.model.predict_proba(features);
        if !probability.is_finite() {
            return Err(Error::ScoringUnavailable(
                "model produced a non-finite probability".to_string(),
            ));
        }

        Ok(probability.clamp(0.0, 1.0))
    }
}
