use std::{
    fs::File,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::{debug, warn};

use crate::classify::{error::ClassifyError, RadiusKey};
use crate::config::ConfigError;

const MODEL_PREFIX: &str = "kmeans_";
const MODEL_SUFFIX: &str = "km_model.onnx";

/// Maps each configured radius to the k-means model trained for it.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    model_dir: PathBuf,
    radii: Vec<RadiusKey>, // ascending, no duplicates
}

impl ModelRegistry {
    pub fn new<P: AsRef<Path>, I: IntoIterator<Item = RadiusKey>>(
        model_dir: P,
        radii: I,
    ) -> Result<Self, ConfigError> {
        let requested = radii.into_iter().collect::<Vec<_>>();
        if requested.is_empty() {
            return Err(ConfigError::NoRadii);
        }
        if requested.contains(&0) {
            return Err(ConfigError::ZeroRadius);
        }

        let radii = requested.iter().copied().sorted().dedup().collect::<Vec<_>>();
        if radii.len() != requested.len() {
            warn!(
                "Ignoring duplicate radii, using {}",
                radii.iter().map(|radius| format!("{}km", radius)).join(", ")
            );
        }

        Ok(Self {
            model_dir: model_dir.as_ref().to_path_buf(),
            radii,
        })
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Configured radii in ascending order
    pub fn radii(&self) -> &[RadiusKey] {
        &self.radii
    }

    /// Where the model for `radius` is expected to live, whether or not it exists
    pub fn path_for(&self, radius: RadiusKey) -> PathBuf {
        self.model_dir
            .join(format!("{}{}{}", MODEL_PREFIX, radius, MODEL_SUFFIX))
    }

    /// Resolves the model for `radius`, failing if it is missing or cannot be opened
    pub fn resolve(&self, radius: RadiusKey) -> Result<PathBuf, ClassifyError> {
        let path = self.path_for(radius);
        if !path.is_file() || File::open(&path).is_err() {
            return Err(ClassifyError::ModelNotFound { radius, path });
        }
        debug!("Resolved {}km model to {}", radius, path.display());
        Ok(path)
    }
}
