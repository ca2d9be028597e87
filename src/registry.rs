//! Process-wide bundle registry.
//!
//! The registry is built once at startup, strictly before any request is
//! served, and is read-only thereafter. Diseases whose artifacts are
//! absent or unreadable are disabled (omitted) rather than aborting the
//! whole service, so healthy diseases remain servable.

use std::collections::BTreeMap;
use std::path::Path;

use crate::bundle::{ArtifactBundle, ArtifactError};
use crate::config::ServiceConfig;
use crate::error::PredictError;

/// A disease that failed to load and was disabled at startup.
#[derive(Debug)]
pub struct LoadWarning {
    /// Disease key that was disabled.
    pub disease: String,
    /// Why its bundle could not be loaded.
    pub error: ArtifactError,
}

/// Read-only disease-key → bundle mapping.
#[derive(Debug, Default)]
pub struct BundleRegistry {
    bundles: BTreeMap<String, ArtifactBundle>,
}

impl BundleRegistry {
    /// Load bundles for every configured disease from an artifact root.
    ///
    /// Each disease's artifacts are expected under
    /// `<artifact_root>/<disease_key>/`. Load failures become warnings and
    /// omissions, never a startup abort.
    pub fn load_all(artifact_root: &Path, config: &ServiceConfig) -> (Self, Vec<LoadWarning>) {
        let mut bundles = BTreeMap::new();
        let mut warnings = Vec::new();

        for schema in &config.diseases {
            let disease = schema.disease_key.as_str();
            let dir = artifact_root.join(disease);
            match ArtifactBundle::load(disease, &dir) {
                Ok(bundle) => {
                    log::info!(
                        "loaded bundle for `{disease}` ({} columns, threshold {:.3})",
                        bundle.preprocessor().num_columns(),
                        bundle.threshold()
                    );
                    bundles.insert(disease.to_owned(), bundle);
                }
                Err(error) => {
                    log::warn!("disabling `{disease}`: {error}");
                    warnings.push(LoadWarning {
                        disease: disease.to_owned(),
                        error,
                    });
                }
            }
        }

        (Self { bundles }, warnings)
    }

    /// Build a registry from already-constructed bundles (tests, embedded
    /// deployments).
    pub fn from_bundles(bundles: impl IntoIterator<Item = (String, ArtifactBundle)>) -> Self {
        Self {
            bundles: bundles.into_iter().collect(),
        }
    }

    /// Look up the bundle for a disease key.
    pub fn lookup(&self, disease_key: &str) -> Result<&ArtifactBundle, PredictError> {
        self.bundles
            .get(disease_key)
            .ok_or_else(|| PredictError::UnknownDisease(disease_key.to_owned()))
    }

    /// Whether a disease is servable.
    pub fn contains(&self, disease_key: &str) -> bool {
        self.bundles.contains_key(disease_key)
    }

    /// Servable disease keys, sorted.
    pub fn diseases(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    /// Number of servable diseases.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// Returns true if no disease loaded.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
