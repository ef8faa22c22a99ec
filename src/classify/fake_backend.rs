//! Text-driven stand-in for the ONNX backend used throughout the unit tests.
//!
//! A stub artifact is a whitespace separated list of `key value` pairs:
//! `cluster <id>` (required), `delay <ms>` and `output <scalar|missing|error>`.

use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
    time::Duration,
};

use tempfile::TempDir;

use crate::classify::{
    backend::{first_cluster_id, InferenceBackend, ModelSignature},
    error::BackendError,
    Point, RadiusKey,
};

pub(crate) const STUB_OUTPUT: &str = "label";

#[derive(Debug, Clone, Copy, PartialEq)]
enum StubOutput {
    Label,
    Scalar,
    Missing,
    Error,
}

#[derive(Debug)]
pub(crate) struct StubModel {
    name: String,
    cluster: i64,
    delay: Duration,
    output: StubOutput,
}

impl StubModel {
    fn parse(name: String, text: &str) -> Result<Self, BackendError> {
        let unrecognised = || BackendError::Load(format!("unrecognised stub model '{}'", text.trim()));
        let mut cluster = None;
        let mut delay = Duration::from_millis(0);
        let mut output = StubOutput::Label;

        let tokens = text.split_whitespace().collect::<Vec<_>>();
        for pair in tokens.chunks(2) {
            match pair {
                ["cluster", value] => cluster = Some(value.parse::<i64>().map_err(|_| unrecognised())?),
                ["delay", value] => {
                    delay = Duration::from_millis(value.parse::<u64>().map_err(|_| unrecognised())?)
                }
                ["output", "scalar"] => output = StubOutput::Scalar,
                ["output", "missing"] => output = StubOutput::Missing,
                ["output", "error"] => output = StubOutput::Error,
                _ => return Err(unrecognised()),
            }
        }

        Ok(Self {
            name,
            cluster: cluster.ok_or_else(unrecognised)?,
            delay,
            output,
        })
    }
}

/// Counts every handle it hands out and takes back, and records the order in
/// which forward passes finish.
#[derive(Debug, Default)]
pub(crate) struct FakeBackend {
    acquired: AtomicUsize,
    released: AtomicUsize,
    runs: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// File names of the models in the order their runs finished
    pub(crate) fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

impl InferenceBackend for FakeBackend {
    type Handle = StubModel;

    fn load(&self, path: &Path) -> Result<StubModel, BackendError> {
        let text = fs::read_to_string(path).map_err(|e| BackendError::Load(e.to_string()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let model = StubModel::parse(name, &text)?;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(model)
    }

    fn run(&self, model: &mut StubModel, _point: &Point) -> Result<i64, BackendError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        thread::sleep(model.delay);
        let result = match model.output {
            StubOutput::Label => first_cluster_id(&[1], &[model.cluster]),
            StubOutput::Scalar => first_cluster_id(&[], &[model.cluster]),
            StubOutput::Missing => Err(BackendError::MissingOutput(STUB_OUTPUT.to_string())),
            StubOutput::Error => Err(BackendError::Run("numerical failure in forward pass".to_string())),
        };
        self.completed.lock().unwrap().push(model.name.clone());
        result
    }

    fn signature(&self, _model: &StubModel) -> ModelSignature {
        ModelSignature {
            inputs: vec!["X".to_string()],
            outputs: vec![STUB_OUTPUT.to_string(), "scores".to_string()],
        }
    }

    fn release(&self, _model: StubModel) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Writes one stub artifact per radius into a fresh directory
pub(crate) fn model_dir(models: &[(RadiusKey, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (radius, contents) in models {
        let path = dir.path().join(format!("kmeans_{}km_model.onnx", radius));
        fs::write(path, contents).unwrap();
    }
    dir
}
