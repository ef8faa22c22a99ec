//! ONNX Runtime implementation of the inference backend.
//!
//! The k-means graphs exported for each radius take a single `[1, 2]` float32
//! input holding `[lat, lon]` and return an int64 label tensor as their first
//! output (any further outputs, e.g. distances, are ignored).

use std::path::Path;

use log::{debug, info};
use ort::{session::Session, value::Tensor};

use crate::classify::{
    backend::{first_cluster_id, InferenceBackend, ModelSignature},
    error::BackendError,
    Point,
};

const ENVIRONMENT_NAME: &str = "geocluster";
const INPUT_SHAPE: [usize; 2] = [1, 2];

/// Owns the process-wide ONNX Runtime environment. Create one per process
/// before any model is loaded and share it by reference; every session built
/// through it lives only as long as a single classification call.
pub struct OrtBackend {
    _private: (),
}

impl OrtBackend {
    pub fn new() -> Result<Self, BackendError> {
        environment_committed(ort::init().with_name(ENVIRONMENT_NAME).commit())?;
        info!("Initialised ONNX Runtime environment '{}'", ENVIRONMENT_NAME);
        Ok(Self { _private: () })
    }
}

fn environment_committed(committed: ort::Result<bool>) -> Result<(), BackendError> {
    match committed {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!("ONNX Runtime environment was already configured, reusing it");
            Ok(())
        }
        Err(e) => Err(BackendError::Environment(e.to_string())),
    }
}

impl InferenceBackend for OrtBackend {
    type Handle = Session;

    fn load(&self, path: &Path) -> Result<Session, BackendError> {
        Session::builder()
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e: ort::Error| BackendError::Load(e.to_string()))
    }

    fn run(&self, session: &mut Session, point: &Point) -> Result<i64, BackendError> {
        // names are cloned up front as running borrows the session mutably
        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => return Err(BackendError::Run("model declares no inputs".to_string())),
        };
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => return Err(BackendError::Run("model declares no outputs".to_string())),
        };

        let input = Tensor::from_array((INPUT_SHAPE, vec![point.lat(), point.lon()]))
            .map_err(|e: ort::Error| BackendError::Run(format!("create_input: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_name.as_str() => input])
            .map_err(|e: ort::Error| BackendError::Run(format!("session_run: {}", e)))?;

        let value = outputs
            .get(output_name.as_str())
            .ok_or_else(|| BackendError::MissingOutput(output_name.clone()))?;

        let (shape, data) = value.try_extract_tensor::<i64>().map_err(|e: ort::Error| {
            BackendError::MalformedOutput(format!(
                "output '{}' is not an int64 tensor: {}",
                output_name, e
            ))
        })?;
        let dims = shape.iter().copied().collect::<Vec<i64>>();
        debug!("Output '{}' has shape {:?}", output_name, dims);

        first_cluster_id(&dims, data)
    }

    fn signature(&self, session: &Session) -> ModelSignature {
        ModelSignature {
            inputs: session.inputs.iter().map(|input| input.name.clone()).collect(),
            outputs: session.outputs.iter().map(|output| output.name.clone()).collect(),
        }
    }

    fn release(&self, session: Session) {
        drop(session);
    }
}
