use std::path::Path;

use log::debug;

use crate::classify::{error::BackendError, Point};

/// Names of the tensors a loaded model declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSignature {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

/// The engine that turns a serialized model into cluster ids.
///
/// Implementations are shared by reference across worker threads, so any
/// process-wide state (e.g. the runtime environment) must be safe for
/// concurrent sessions. Handles are never shared: each one is loaded, run once
/// and released inside a single classification call.
pub trait InferenceBackend: Sync {
    type Handle;

    fn load(&self, path: &Path) -> Result<Self::Handle, BackendError>;

    /// Runs one forward pass and returns the raw first element of the first output
    fn run(&self, handle: &mut Self::Handle, point: &Point) -> Result<i64, BackendError>;

    fn signature(&self, handle: &Self::Handle) -> ModelSignature;

    fn release(&self, handle: Self::Handle);
}

/// Holds a loaded model for the duration of one call and hands it back to the
/// backend when dropped, whether the call succeeded, failed or unwound.
pub struct ModelGuard<'a, B: InferenceBackend + ?Sized> {
    backend: &'a B,
    handle: Option<B::Handle>,
}

impl<'a, B: InferenceBackend + ?Sized> ModelGuard<'a, B> {
    pub fn acquire(backend: &'a B, path: &Path) -> Result<Self, BackendError> {
        debug!("Loading model {}", path.display());
        let handle = backend.load(path)?;
        Ok(Self {
            backend,
            handle: Some(handle),
        })
    }

    pub fn run(&mut self, point: &Point) -> Result<i64, BackendError> {
        match self.handle.as_mut() {
            Some(handle) => self.backend.run(handle, point),
            None => Err(BackendError::Run("model handle already released".to_string())),
        }
    }

    pub fn signature(&self) -> Option<ModelSignature> {
        self.handle
            .as_ref()
            .map(|handle| self.backend.signature(handle))
    }
}

impl<'a, B: InferenceBackend + ?Sized> Drop for ModelGuard<'a, B> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.backend.release(handle);
        }
    }
}

/// Pulls the cluster id out of a model's integer output tensor. The tensor must
/// have rank >= 1 and at least one element.
pub(crate) fn first_cluster_id(shape: &[i64], data: &[i64]) -> Result<i64, BackendError> {
    if shape.is_empty() {
        return Err(BackendError::MalformedOutput(
            "expected an output tensor of rank >= 1, got a scalar".to_string(),
        ));
    }
    match data.first() {
        Some(cluster) => Ok(*cluster),
        None => Err(BackendError::MalformedOutput(format!(
            "output tensor of shape {:?} is empty",
            shape
        ))),
    }
}
