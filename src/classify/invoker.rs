use std::path::Path;

use log::debug;

use crate::classify::{
    backend::{InferenceBackend, ModelGuard},
    error::{BackendError, ClassifyError},
    ClusterId, Point, RadiusKey,
};

/// Loads the model at `model_path`, runs `point` through it once and releases
/// the model again before returning, on success or failure.
pub fn classify<B: InferenceBackend + ?Sized>(
    backend: &B,
    radius: RadiusKey,
    point: &Point,
    model_path: &Path,
) -> Result<ClusterId, ClassifyError> {
    let mut model = ModelGuard::acquire(backend, model_path).map_err(|e| ClassifyError::ModelLoad {
        radius,
        path: model_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let raw = model.run(point).map_err(|e| match e {
        BackendError::MissingOutput(output) => ClassifyError::EmptyOutput { radius, output },
        BackendError::Load(message) => ClassifyError::ModelLoad {
            radius,
            path: model_path.to_path_buf(),
            message,
        },
        other => ClassifyError::Inference {
            radius,
            message: other.to_string(),
        },
    })?;

    let cluster = ClusterId::try_from(raw).map_err(|_| ClassifyError::Inference {
        radius,
        message: format!("model returned negative cluster id {}", raw),
    })?;
    debug!("Point {} falls in cluster {} at {}km", point, cluster, radius);

    Ok(cluster)
}
