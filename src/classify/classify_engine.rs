use std::io::{self, Write};

use anyhow::Result;
use itertools::Itertools;
use log::{error, info};

use crate::classify::{
    backend::InferenceBackend,
    onnx_backend::OrtBackend,
    orchestrator::{FailurePolicy, FanOut},
    ClusterAssignment, Point,
};
use crate::config::ClassifyConfig;
use crate::models::registry::ModelRegistry;

pub fn run_classify(m: &clap::ArgMatches) -> Result<()> {
    let config = ClassifyConfig::from_matches(m)?;
    config.models.build_thread_pool()?;
    // the environment outlives every session created below
    let backend = OrtBackend::new()?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();
    classify_and_report(&backend, &config, &mut writer)
}

/// Classifies the configured point at every radius and writes the report.
/// Under fail-fast nothing is written unless every radius succeeded.
pub fn classify_and_report<B: InferenceBackend, W: Write>(
    backend: &B,
    config: &ClassifyConfig,
    writer: &mut W,
) -> Result<()> {
    let registry = ModelRegistry::new(&config.models.model_dir, config.models.radii.iter().copied())?;
    let fan_out = FanOut::new(backend, &registry).parallel(config.models.threads > 1);

    info!(
        "Classifying {} with models in {} at radii {}",
        config.point,
        registry.model_dir().display(),
        registry.radii().iter().map(|radius| format!("{}km", radius)).join(", ")
    );

    match config.policy {
        FailurePolicy::FailFast => {
            let assignments = fan_out.classify_point(&config.point)?;
            write_assignments(writer, &config.point, &assignments)?;
        }
        FailurePolicy::BestEffort => {
            let report = fan_out.classify_point_best_effort(&config.point);
            write_assignments(writer, &config.point, &report.assignments)?;
            if !report.is_complete() {
                for failure in &report.failures {
                    error!("{}", failure);
                }
                bail!(
                    "Classification failed for {} of {} radii",
                    report.failures.len(),
                    registry.radii().len()
                );
            }
        }
    }
    info!("Classification finished");

    Ok(())
}

pub fn write_assignments<W: Write>(
    writer: &mut W,
    point: &Point,
    assignments: &[ClusterAssignment],
) -> io::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "New point: {}", point)?;
    writeln!(writer)?;
    for assignment in assignments {
        writeln!(writer, "{}", assignment)?;
    }
    writer.flush()
}
