use std::path::PathBuf;

use thiserror::Error;

use crate::classify::RadiusKey;

/// Failures while assigning a point to a cluster. Every variant apart from
/// `InvalidPoint` is fatal for the radius it names.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("No model artifact for {radius}km radius at {}", .path.display())]
    ModelNotFound { radius: RadiusKey, path: PathBuf },

    #[error("Failed to load model for {radius}km radius from {}: {message}", .path.display())]
    ModelLoad {
        radius: RadiusKey,
        path: PathBuf,
        message: String,
    },

    #[error("Inference failed for {radius}km radius: {message}")]
    Inference { radius: RadiusKey, message: String },

    #[error("Model for {radius}km radius produced no output named '{output}'")]
    EmptyOutput { radius: RadiusKey, output: String },

    #[error("Point ({lat}, {lon}) does not have finite coordinates")]
    InvalidPoint { lat: f32, lon: f32 },
}

impl ClassifyError {
    /// The radius the failure belongs to, if any
    pub fn radius(&self) -> Option<RadiusKey> {
        match self {
            ClassifyError::ModelNotFound { radius, .. }
            | ClassifyError::ModelLoad { radius, .. }
            | ClassifyError::Inference { radius, .. }
            | ClassifyError::EmptyOutput { radius, .. } => Some(*radius),
            ClassifyError::InvalidPoint { .. } => None,
        }
    }
}

/// Failures reported by an inference backend. These carry no radius; the
/// invoker attaches it when lifting them into a `ClassifyError`.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Could not initialise ONNX Runtime environment: {0}")]
    Environment(String),

    #[error("{0}")]
    Load(String),

    #[error("{0}")]
    Run(String),

    #[error("output '{0}' missing from session outputs")]
    MissingOutput(String),

    #[error("{0}")]
    MalformedOutput(String),
}
