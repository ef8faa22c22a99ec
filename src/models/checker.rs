use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Result;
use log::{debug, error, info};
use rayon::prelude::*;

use crate::classify::{
    backend::{InferenceBackend, ModelGuard, ModelSignature},
    error::ClassifyError,
    onnx_backend::OrtBackend,
    RadiusKey,
};
use crate::config::ModelsConfig;
use crate::models::registry::ModelRegistry;

pub fn run_check(m: &clap::ArgMatches) -> Result<()> {
    let config = ModelsConfig::from_matches(m)?;
    config.build_thread_pool()?;
    let registry = ModelRegistry::new(&config.model_dir, config.radii.iter().copied())?;
    let backend = OrtBackend::new()?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    check_and_report(&backend, &registry, &mut writer)
}

/// Outcome of loading one configured model
#[derive(Debug)]
pub struct ModelStatus {
    pub radius: RadiusKey,
    pub path: PathBuf,
    pub outcome: Result<ModelSignature, ClassifyError>,
}

/// Resolves and loads every model in the registry, releasing each straight away
pub fn check_models<B: InferenceBackend>(backend: &B, registry: &ModelRegistry) -> Vec<ModelStatus> {
    let mut statuses = registry
        .radii()
        .par_iter()
        .map(|radius| ModelStatus {
            radius: *radius,
            path: registry.path_for(*radius),
            outcome: check_model(backend, registry, *radius),
        })
        .collect::<Vec<_>>();
    statuses.sort_by_key(|status| status.radius);
    statuses
}

fn check_model<B: InferenceBackend>(
    backend: &B,
    registry: &ModelRegistry,
    radius: RadiusKey,
) -> Result<ModelSignature, ClassifyError> {
    debug!("Checking {}km model ..", radius);
    let path = registry.resolve(radius)?;
    let load_error = |message: String| ClassifyError::ModelLoad {
        radius,
        path: path.clone(),
        message,
    };

    let model = ModelGuard::acquire(backend, &path).map_err(|e| load_error(e.to_string()))?;
    let signature = model
        .signature()
        .ok_or_else(|| load_error("model handle already released".to_string()))?;

    if signature.inputs.len() != 1 {
        return Err(load_error(format!(
            "expected exactly one input tensor, found {}",
            signature.inputs.len()
        )));
    }
    if signature.outputs.is_empty() {
        return Err(load_error("model declares no output tensors".to_string()));
    }
    Ok(signature)
}

pub fn check_and_report<B: InferenceBackend, W: Write>(
    backend: &B,
    registry: &ModelRegistry,
    writer: &mut W,
) -> Result<()> {
    info!("Checking {} models in {}", registry.radii().len(), registry.model_dir().display());
    let statuses = check_models(backend, registry);

    let mut failed = 0;
    for status in &statuses {
        match &status.outcome {
            Ok(signature) => {
                writeln!(
                    writer,
                    "{}km\t{}\tok\tinputs={}\toutputs={}",
                    status.radius,
                    status.path.display(),
                    signature.inputs.join(","),
                    signature.outputs.join(",")
                )?;
            }
            Err(e) => {
                failed += 1;
                error!("{}", e);
                writeln!(writer, "{}km\t{}\tfailed", status.radius, status.path.display())?;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} models could not be loaded", failed, statuses.len());
    }
    info!("All models loaded successfully");
    Ok(())
}
