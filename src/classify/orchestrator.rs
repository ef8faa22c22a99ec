use log::debug;
use rayon::prelude::*;

use crate::classify::{
    backend::InferenceBackend, error::ClassifyError, invoker::classify, ClusterAssignment, Point,
    RadiusKey,
};
use crate::models::registry::ModelRegistry;

/// What to do with the rest of a batch once one radius has failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return it. Nothing is retried.
    FailFast,
    /// Classify every radius and report successes and failures side by side
    BestEffort,
}

/// Result of a best-effort batch. Both lists are ordered by radius.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub assignments: Vec<ClusterAssignment>,
    pub failures: Vec<ClassifyError>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Classifies one point against the model for every radius in a registry.
///
/// Radii are independent, so with `parallel` set they are spread over the
/// current rayon pool. Completion order is never observable: results are
/// re-sorted by radius before they are handed back.
pub struct FanOut<'a, B: InferenceBackend> {
    backend: &'a B,
    registry: &'a ModelRegistry,
    parallel: bool,
}

impl<'a, B: InferenceBackend> FanOut<'a, B> {
    pub fn new(backend: &'a B, registry: &'a ModelRegistry) -> Self {
        Self {
            backend,
            registry,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fail-fast classification: the first error aborts the batch
    pub fn classify_point(&self, point: &Point) -> Result<Vec<ClusterAssignment>, ClassifyError> {
        let radii = self.registry.radii();
        let mut assignments = if self.parallel {
            radii
                .par_iter()
                .map(|radius| self.classify_radius(*radius, point))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            radii
                .iter()
                .map(|radius| self.classify_radius(*radius, point))
                .collect::<Result<Vec<_>, _>>()?
        };
        assignments.sort_by_key(|assignment| assignment.radius);
        Ok(assignments)
    }

    /// Best-effort classification: every radius runs, failures are collected
    pub fn classify_point_best_effort(&self, point: &Point) -> BatchReport {
        let radii = self.registry.radii();
        let mut outcomes = if self.parallel {
            radii
                .par_iter()
                .map(|radius| (*radius, self.classify_radius(*radius, point)))
                .collect::<Vec<_>>()
        } else {
            radii
                .iter()
                .map(|radius| (*radius, self.classify_radius(*radius, point)))
                .collect::<Vec<_>>()
        };
        outcomes.sort_by_key(|(radius, _)| *radius);

        let mut report = BatchReport::default();
        for (radius, outcome) in outcomes {
            match outcome {
                Ok(assignment) => report.assignments.push(assignment),
                Err(e) => {
                    debug!("{}km radius failed: {}", radius, e);
                    report.failures.push(e);
                }
            }
        }
        report
    }

    fn classify_radius(&self, radius: RadiusKey, point: &Point) -> Result<ClusterAssignment, ClassifyError> {
        debug!("Classifying {} at {}km", point, radius);
        let model_path = self.registry.resolve(radius)?;
        let cluster = classify(self.backend, radius, point, &model_path)?;
        Ok(ClusterAssignment::new(radius, cluster))
    }
}
