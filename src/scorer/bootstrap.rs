//! Synthetic training data for the bootstrap model.
//!
//! The labels are independent of the features, so the resulting model carries
//! no real signal. It only exists so the pipeline can run end to end.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::ModelConfig;
use crate::domain::Error;
use crate::features::{DEVICE_RISK_MAX, DEVICE_RISK_MIN, FeatureVector};
use crate::scorer::model::{FraudModel, TrainingParams, TrainingSample};

/// Share of the samples held out to report a validation loss.
pub const HOLDOUT_FRACTION: f64 = 0.2;
const SPLIT_SEED: u64 = 42;

pub fn synthesize<R: Rng>(rng: &mut R, count: usize, fraud_rate: f64) -> Vec<TrainingSample> {
    let fraud_rate = fraud_rate.clamp(0.0, 1.0);
    (0..count)
        .map(|_| TrainingSample {
            features: FeatureVector::new(
                f64::from(rng.gen_range(1000u32..=9999)),
                rng.gen_range(10.0..5000.0),
                f64::from(rng.gen_range(1u8..=4)),
                rng.gen_range(DEVICE_RISK_MIN..DEVICE_RISK_MAX),
            ),
            is_fraud: rng.gen_bool(fraud_rate),
        })
        .collect()
}

/// Train a model on freshly synthesized data, holding out a fixed split.
pub fn train_bootstrap_model(settings: &ModelConfig) -> Result<FraudModel, Error> {
    if settings.bootstrap_samples == 0 {
        return Err(Error::Model("bootstrap_samples must be positive".to_string()));
    }
    if !settings.fraud_rate.is_finite() {
        return Err(Error::Model(format!(
            "fraud_rate must be finite, got {}",
            settings.fraud_rate
        )));
    }

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        samples = settings.bootstrap_samples,
        fraud_rate = settings.fraud_rate,
        "Generating synthetic training data"
    );
    let mut samples = synthesize(&mut rng, settings.bootstrap_samples, settings.fraud_rate);
    samples.shuffle(&mut StdRng::seed_from_u64(SPLIT_SEED));

    let holdout = ((samples.len() as f64) * HOLDOUT_FRACTION).floor() as usize;
    let holdout = holdout.min(samples.len() - 1);
    let (test, train) = samples.split_at(holdout);

    let model = FraudModel::fit(train, &TrainingParams::default())?;

    info!(
        train = train.len(),
        holdout = test.len(),
        train_log_loss = model.log_loss(train),
        holdout_log_loss = model.log_loss(test),
        "Bootstrap model trained"
    );

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_samples_respect_their_ranges() {
        let mut rng = StdRng::seed_from_u64(1);
        let samples = synthesize(&mut rng, 1000, 0.05);

        assert_eq!(samples.len(), 1000);
        for s in &samples {
            let [prefix, amount, method, device] = *s.features.values();
            assert!((1000.0..=9999.0).contains(&prefix));
            assert_eq!(prefix.fract(), 0.0);
            assert!((10.0..5000.0).contains(&amount));
            assert!((1.0..=4.0).contains(&method));
            assert!((DEVICE_RISK_MIN..DEVICE_RISK_MAX).contains(&device));
        }

        let frauds = samples.iter().filter(|s| s.is_fraud).count();
        assert!(frauds > 10 && frauds < 100, "fraud count {frauds}");
    }

    #[test]
    fn seeded_bootstrap_is_reproducible() {
        let settings = ModelConfig {
            bootstrap_samples: 200,
            seed: Some(99),
            ..ModelConfig::default()
        };

        let a = train_bootstrap_model(&settings).unwrap();
        let b = train_bootstrap_model(&settings).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
        assert_eq!(a.training_samples, 160);
    }

    #[test]
    fn zero_samples_is_a_model_error() {
        let settings = ModelConfig {
            bootstrap_samples: 0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            train_bootstrap_model(&settings),
            Err(Error::Model(_))
        ));
    }

    #[test]
    fn non_finite_fraud_rate_is_a_model_error() {
        for fraud_rate in [f64::NAN, f64::INFINITY] {
            let settings = ModelConfig {
                bootstrap_samples: 10,
                fraud_rate,
                ..ModelConfig::default()
            };
            assert!(matches!(
                train_bootstrap_model(&settings),
                Err(Error::Model(_))
            ));
        }
    }
}
