//! Logistic-regression fraud classifier.
//!
//! Inputs are standardised with the training means and deviations, which are
//! stored alongside the weights so inference reproduces training exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::features::{FEATURE_NAMES, FeatureVector};

const FEATURES: usize = FEATURE_NAMES.len();
const MIN_SCALE: f64 = 1e-12;
const PROBABILITY_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub is_fraud: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct TrainingParams {
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 0.5,
            l2: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudModel {
    pub feature_names: Vec<String>,
    pub means: [f64; FEATURES],
    pub scales: [f64; FEATURES],
    pub weights: [f64; FEATURES],
    pub bias: f64,
    pub training_samples: usize,
    pub trained_at: DateTime<Utc>,
}

impl FraudModel {
    /// Fit with full-batch gradient descent on the log-loss.
    pub fn fit(samples: &[TrainingSample], params: &TrainingParams) -> Result<Self, Error> {
        if samples.is_empty() {
            return Err(Error::Model("cannot fit a model without samples".to_string()));
        }

        let n = samples.len() as f64;
        let (means, scales) = standardisation(samples);

        let inputs: Vec<[f64; FEATURES]> = samples
            .iter()
            .map(|s| standardise(s.features.values(), &means, &scales))
            .collect();
        let labels: Vec<f64> = samples
            .iter()
            .map(|s| if s.is_fraud { 1.0 } else { 0.0 })
            .collect();

        // Start the bias at the log-odds of the base rate.
        let base_rate = (labels.iter().sum::<f64>() / n)
            .clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
        let mut bias = (base_rate / (1.0 - base_rate)).ln();
        let mut weights = [0.0; FEATURES];

        for _ in 0..params.epochs {
            let mut grad_w = [0.0; FEATURES];
            let mut grad_b = 0.0;

            for (x, y) in inputs.iter().zip(&labels) {
                let err = sigmoid(linear(&weights, bias, x)) - y;
                for (g, xi) in grad_w.iter_mut().zip(x) {
                    *g += err * xi;
                }
                grad_b += err;
            }

            for (w, g) in weights.iter_mut().zip(grad_w) {
                *w -= params.learning_rate * (g / n + params.l2 * *w);
            }
            bias -= params.learning_rate * grad_b / n;
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(Error::Model("training diverged".to_string()));
        }

        Ok(Self {
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            means,
            scales,
            weights,
            bias,
            training_samples: samples.len(),
            trained_at: Utc::now(),
        })
    }

    /// Probability of the positive (fraud) class.
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let x = standardise(features.values(), &self.means, &self.scales);
        sigmoid(linear(&self.weights, self.bias, &x))
    }

    /// Mean binary cross-entropy over `samples`.
    pub fn log_loss(&self, samples: &[TrainingSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let total: f64 = samples
            .iter()
            .map(|s| {
                let p = self
                    .predict_proba(&s.features)
                    .clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON);
                if s.is_fraud { -p.ln() } else { -(1.0 - p).ln() }
            })
            .sum();
        total / samples.len() as f64
    }

    /// True when the artifact was trained on the extractor's feature layout.
    pub fn matches_feature_layout(&self) -> bool {
        self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES)
    }
}

fn standardisation(samples: &[TrainingSample]) -> ([f64; FEATURES], [f64; FEATURES]) {
    let n = samples.len() as f64;
    let mut means = [0.0; FEATURES];
    for s in samples {
        for (m, v) in means.iter_mut().zip(s.features.values()) {
            *m += v / n;
        }
    }

    let mut scales = [0.0; FEATURES];
    for s in samples {
        for ((sc, v), m) in scales.iter_mut().zip(s.features.values()).zip(&means) {
            *sc += (v - m).powi(2) / n;
        }
    }
    for sc in scales.iter_mut() {
        *sc = sc.sqrt();
        if *sc < MIN_SCALE {
            *sc = 1.0;
        }
    }

    (means, scales)
}

fn standardise(
    values: &[f64; FEATURES],
    means: &[f64; FEATURES],
    scales: &[f64; FEATURES],
) -> [f64; FEATURES] {
    let mut out = [0.0; FEATURES];
    for i in 0..FEATURES {
        out[i] = (values[i] - means[i]) / scales[i];
    }
    out
}

fn linear(weights: &[f64; FEATURES], bias: f64, x: &[f64; FEATURES]) -> f64 {
    weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + bias
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
