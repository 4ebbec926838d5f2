//! Model artifact persistence

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::domain::Error;
use crate::scorer::bootstrap::train_bootstrap_model;
use crate::scorer::model::FraudModel;

/// Load a serialized model, rejecting artifacts built for another feature layout.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<FraudModel, Error> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading fraud model");

    let raw = fs::read_to_string(path)?;
    let model: FraudModel = serde_json::from_str(&raw)?;

    if !model.matches_feature_layout() {
        return Err(Error::Model(format!(
            "{} was trained on features {:?}",
            path.display(),
            model.feature_names
        )));
    }

    info!(
        path = %path.display(),
        trained_at = %model.trained_at,
        samples = model.training_samples,
        "Model loaded successfully"
    );
    Ok(model)
}

/// Write the artifact through a temporary file so readers never see a partial model.
pub fn save_model<P: AsRef<Path>>(path: P, model: &FraudModel) -> Result<(), Error> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(model)?)?;
    fs::rename(&tmp, path)?;

    info!(path = %path.display(), "Model saved");
    Ok(())
}

/// Train and persist a bootstrap model unless one already exists (or `force`).
pub fn provision_model(settings: &ModelConfig, force: bool) -> Result<FraudModel, Error> {
    if !force && settings.path.exists() {
        return load_model(&settings.path);
    }

    let model = train_bootstrap_model(settings)?;
    save_model(&settings.path, &model)?;
    Ok(model)
}

/// Startup path: load the artifact, provisioning it first if allowed.
pub fn load_or_bootstrap(settings: &ModelConfig) -> Result<FraudModel, Error> {
    if settings.path.exists() {
        return load_model(&settings.path);
    }

    if !settings.bootstrap_if_missing {
        return Err(Error::Model(format!(
            "model artifact {} not found and bootstrapping is disabled",
            settings.path.display()
        )));
    }

    warn!(
        path = %settings.path.display(),
        "Model artifact not found, provisioning a bootstrap model"
    );
    provision_model(settings, true)
}
