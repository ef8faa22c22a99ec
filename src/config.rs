//! Run configuration. Values come from the command line, optionally layered
//! over a YAML file given with `--config`: a flag typed on the command line
//! always wins, the file fills in anything left at its default.
//!
//! ```yaml
//! model_dir: /data/disease/models
//! radii: [10, 30, 50]
//! point:
//!   lat: 6.6198218
//!   lon: 100.0785343
//! threads: 3
//! keep_going: false
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{parser::ValueSource, ArgMatches};
use log::{debug, info};
use thiserror::Error;

use crate::classify::{error::ClassifyError, orchestrator::FailurePolicy, Point, RadiusKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("At least one radius must be configured")]
    NoRadii,

    #[error("Radii must be positive integers")]
    ZeroRadius,

    #[error("Thread count must be at least 1")]
    NoThreads,

    #[error(transparent)]
    Point(#[from] ClassifyError),
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub model_dir: Option<PathBuf>,
    pub radii: Option<Vec<RadiusKey>>,
    pub point: Option<PointConfig>,
    pub threads: Option<usize>,
    pub keep_going: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointConfig {
    pub lat: f32,
    pub lon: f32,
}

impl ConfigFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Read configuration from {}", path.display());
        Ok(config)
    }

    /// Loads the file named by `--config`, or an empty configuration if none was given
    pub fn from_matches(m: &ArgMatches) -> Result<Self, ConfigError> {
        match m.get_one::<String>("config") {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Where the models live and how many of them to run at once
#[derive(Debug, Clone, PartialEq)]
pub struct ModelsConfig {
    pub model_dir: PathBuf,
    pub radii: Vec<RadiusKey>,
    pub threads: usize,
}

impl ModelsConfig {
    pub fn from_matches(m: &ArgMatches) -> Result<Self, ConfigError> {
        let file = ConfigFile::from_matches(m)?;
        Self::from_parts(m, &file)
    }

    fn from_parts(m: &ArgMatches, file: &ConfigFile) -> Result<Self, ConfigError> {
        let model_dir = if is_explicit(m, "model-dir") || file.model_dir.is_none() {
            PathBuf::from(m.get_one::<String>("model-dir").cloned().unwrap_or_default())
        } else {
            file.model_dir.clone().unwrap_or_default()
        };

        let radii = match (&file.radii, is_explicit(m, "radii")) {
            (Some(radii), false) => radii.clone(),
            _ => m
                .get_many::<RadiusKey>("radii")
                .map(|radii| radii.copied().collect())
                .unwrap_or_default(),
        };
        if radii.is_empty() {
            return Err(ConfigError::NoRadii);
        }

        let threads = match (file.threads, is_explicit(m, "threads")) {
            (Some(threads), false) => threads,
            _ => m.get_one::<usize>("threads").copied().unwrap_or(1),
        };
        if threads == 0 {
            return Err(ConfigError::NoThreads);
        }

        let config = Self {
            model_dir,
            radii,
            threads,
        };
        debug!("Models configuration: {:?}", config);
        Ok(config)
    }

    /// Sizes the global rayon pool used for the per-radius fan-out
    pub fn build_thread_pool(&self) -> anyhow::Result<()> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()?;
        Ok(())
    }
}

/// Everything `classify` needs: the models, the point and what to do on failure
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifyConfig {
    pub models: ModelsConfig,
    pub point: Point,
    pub policy: FailurePolicy,
}

impl ClassifyConfig {
    pub fn from_matches(m: &ArgMatches) -> Result<Self, ConfigError> {
        let file = ConfigFile::from_matches(m)?;
        let models = ModelsConfig::from_parts(m, &file)?;

        let cli_lat = m.get_one::<f32>("lat").copied().unwrap_or_default();
        let cli_lon = m.get_one::<f32>("lon").copied().unwrap_or_default();
        let (lat, lon) = match file.point {
            Some(point) => (
                if is_explicit(m, "lat") { cli_lat } else { point.lat },
                if is_explicit(m, "lon") { cli_lon } else { point.lon },
            ),
            None => (cli_lat, cli_lon),
        };
        let point = Point::new(lat, lon)?;

        let keep_going = !m.get_flag("fail-fast")
            && (m.get_flag("keep-going") || file.keep_going.unwrap_or(false));
        let policy = if keep_going {
            FailurePolicy::BestEffort
        } else {
            FailurePolicy::FailFast
        };

        Ok(Self {
            models,
            point,
            policy,
        })
    }
}

fn is_explicit(m: &ArgMatches, id: &str) -> bool {
    matches!(m.value_source(id), Some(ValueSource::CommandLine))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use std::io::Write;

    fn classify_matches(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["geocluster", "classify"];
        argv.extend_from_slice(args);
        let matches = build_cli().try_get_matches_from(argv).unwrap();
        matches.subcommand_matches("classify").unwrap().clone()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ClassifyConfig::from_matches(&classify_matches(&[])).unwrap();
        assert_eq!(config.models.model_dir, PathBuf::from("models"));
        assert_eq!(config.models.radii, vec![10, 30, 50]);
        assert_eq!(config.models.threads, 3);
        assert_eq!(config.point, Point::new(6.6198218, 100.0785343).unwrap());
        assert_eq!(config.policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_command_line_values() {
        let config = ClassifyConfig::from_matches(&classify_matches(&[
            "--model-dir",
            "/tmp/models",
            "--radii",
            "5,20",
            "--lat",
            "-33.5",
            "--lon",
            "151.25",
            "--threads",
            "1",
            "--keep-going",
        ]))
        .unwrap();
        assert_eq!(config.models.model_dir, PathBuf::from("/tmp/models"));
        assert_eq!(config.models.radii, vec![5, 20]);
        assert_eq!(config.models.threads, 1);
        assert_eq!(config.point, Point::new(-33.5, 151.25).unwrap());
        assert_eq!(config.policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn test_config_file_fills_defaults() {
        let file = write_config(
            "model_dir: /data/models\nradii: [25, 75]\npoint:\n  lat: 1.5\n  lon: 2.5\nthreads: 2\nkeep_going: true\n",
        );
        let config = ClassifyConfig::from_matches(&classify_matches(&[
            "--config",
            file.path().to_str().unwrap(),
        ]))
        .unwrap();
        assert_eq!(config.models.model_dir, PathBuf::from("/data/models"));
        assert_eq!(config.models.radii, vec![25, 75]);
        assert_eq!(config.models.threads, 2);
        assert_eq!(config.point, Point::new(1.5, 2.5).unwrap());
        assert_eq!(config.policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn test_fail_fast_overrides_config_file() {
        let file = write_config("keep_going: true\n");
        let path = file.path().to_str().unwrap();
        let config = ClassifyConfig::from_matches(&classify_matches(&["--config", path])).unwrap();
        assert_eq!(config.policy, FailurePolicy::BestEffort);

        let config =
            ClassifyConfig::from_matches(&classify_matches(&["--config", path, "--fail-fast"])).unwrap();
        assert_eq!(config.policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let file = write_config("model_dir: /data/models\nradii: [25, 75]\npoint:\n  lat: 1.5\n  lon: 2.5\n");
        let config = ClassifyConfig::from_matches(&classify_matches(&[
            "--config",
            file.path().to_str().unwrap(),
            "--radii",
            "10",
            "--lat",
            "4.0",
        ]))
        .unwrap();
        assert_eq!(config.models.model_dir, PathBuf::from("/data/models"));
        assert_eq!(config.models.radii, vec![10]);
        assert_eq!(config.point, Point::new(4.0, 2.5).unwrap());
    }

    #[test]
    fn test_bad_config_file() {
        let file = write_config("radii: [10]\nunknown_field: 1\n");
        let result = ClassifyConfig::from_matches(&classify_matches(&[
            "--config",
            file.path().to_str().unwrap(),
        ]));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        let result = ClassifyConfig::from_matches(&classify_matches(&[
            "--config",
            "/does/not/exist.yaml",
        ]));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let file = write_config("threads: 0\n");
        let result = ClassifyConfig::from_matches(&classify_matches(&[
            "--config",
            file.path().to_str().unwrap(),
        ]));
        assert!(matches!(result, Err(ConfigError::NoThreads)));
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let result = ClassifyConfig::from_matches(&classify_matches(&["--lat", "NaN"]));
        assert!(matches!(
            result,
            Err(ConfigError::Point(ClassifyError::InvalidPoint { .. }))
        ));
    }
}
