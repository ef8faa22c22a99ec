pub mod backend;
pub mod classify_engine;
pub mod error;
pub mod invoker;
pub mod onnx_backend;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod fake_backend;

use std::fmt;

use self::error::ClassifyError;

/// Radius in kilometres selecting one of the trained models
pub type RadiusKey = u32;

/// Label produced by a clustering model
pub type ClusterId = usize;

/// A latitude/longitude pair. Both coordinates are always finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    lat: f32,
    lon: f32,
}

impl Point {
    pub fn new(lat: f32, lon: f32) -> Result<Self, ClassifyError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(ClassifyError::InvalidPoint { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f32 {
        self.lat
    }

    pub fn lon(&self) -> f32 {
        self.lon
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// The cluster a point falls into under the model for one radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterAssignment {
    pub radius: RadiusKey,
    pub cluster: ClusterId,
}

impl ClusterAssignment {
    pub fn new(radius: RadiusKey, cluster: ClusterId) -> Self {
        Self { radius, cluster }
    }
}

impl fmt::Display for ClusterAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "At {}km radius → belongs to cluster {}", self.radius, self.cluster)
    }
}
