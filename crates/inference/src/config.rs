use crate::errors::{InferenceError, Result};
use crate::priors::Prior;
use gprn_data::{Units, DEFAULT_SKIP, OUTPUT_NAMES};
use gprn_gp::correlation_models::CorrelationKind;
use gprn_gp::mean_models::MeanKind;
use gprn_gp::NUGGET_RATIO;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_skip() -> usize {
    DEFAULT_SKIP
}

fn default_outputs() -> Vec<String> {
    OUTPUT_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_nugget() -> f64 {
    NUGGET_RATIO
}

/// Where and how to read the observations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    /// Path of the `.rdb` file, relative paths are resolved against the configuration file
    pub path: PathBuf,
    /// Units of the file
    #[serde(default)]
    pub units: Units,
    /// Number of header lines
    #[serde(default = "default_skip")]
    pub skip: usize,
    /// Modelled series, among `rv`, `fwhm`, `bis` and `rhk`
    #[serde(default = "default_outputs")]
    pub outputs: Vec<String>,
}

/// A correlation shape and the priors of its parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    /// Shape
    pub kind: CorrelationKind,
    /// One prior per parameter, in [CorrelationKind::param_names] order
    #[serde(default)]
    pub priors: Vec<Prior>,
}

/// A mean function and the priors of its parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanSpec {
    /// Mean function
    pub kind: MeanKind,
    /// One prior per parameter, in [MeanKind::param_names] order
    pub priors: Vec<Prior>,
}

/// The configuration of a GPRN inference run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GprnConfig {
    /// Observations
    pub data: DataSpec,
    /// Node functions
    pub nodes: Vec<KernelSpec>,
    /// Weight shape shared by every (output, node) link
    pub weight: KernelSpec,
    /// Prior of every weight value
    pub weight_prior: Prior,
    /// Optional mean function of each output, empty for no mean at all
    #[serde(default)]
    pub means: Vec<Option<MeanSpec>>,
    /// Prior of the jitter of each output
    pub jitter_prior: Prior,
    /// Nugget ratio used when the covariance is not positive definite
    #[serde(default = "default_nugget")]
    pub nugget: f64,
    /// Random seed
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GprnConfig {
    /// A configuration with no node, a constant weight shape and default priors,
    /// to be completed with the builder methods
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        GprnConfig {
            data: DataSpec {
                path: path.as_ref().to_path_buf(),
                units: Units::default(),
                skip: DEFAULT_SKIP,
                outputs: default_outputs(),
            },
            nodes: vec![],
            weight: KernelSpec {
                kind: CorrelationKind::Constant,
                priors: vec![],
            },
            weight_prior: Prior::Uniform {
                lower: -10.,
                upper: 10.,
            },
            means: vec![],
            jitter_prior: Prior::Fixed(0.),
            nugget: NUGGET_RATIO,
            seed: None,
        }
    }

    /// Set the units of the data file
    pub fn units(mut self, units: Units) -> Self {
        self.data.units = units;
        self
    }

    /// Set the number of header lines of the data file
    pub fn skip(mut self, skip: usize) -> Self {
        self.data.skip = skip;
        self
    }

    /// Set the modelled series
    pub fn outputs(mut self, outputs: &[&str]) -> Self {
        self.data.outputs = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a node function
    pub fn node(mut self, kind: CorrelationKind, priors: Vec<Prior>) -> Self {
        self.nodes.push(KernelSpec { kind, priors });
        self
    }

    /// Set the weight shape
    pub fn weight(mut self, kind: CorrelationKind, priors: Vec<Prior>) -> Self {
        self.weight = KernelSpec { kind, priors };
        self
    }

    /// Set the prior of the weight values
    pub fn weight_prior(mut self, prior: Prior) -> Self {
        self.weight_prior = prior;
        self
    }

    /// Set the mean functions, one per output
    pub fn means(mut self, means: Vec<Option<MeanSpec>>) -> Self {
        self.means = means;
        self
    }

    /// Set the prior of the jitters
    pub fn jitter_prior(mut self, prior: Prior) -> Self {
        self.jitter_prior = prior;
        self
    }

    /// Set the nugget ratio
    pub fn nugget(mut self, nugget: f64) -> Self {
        self.nugget = nugget;
        self
    }

    /// Set the random seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of outputs
    pub fn n_outputs(&self) -> usize {
        self.data.outputs.len()
    }

    /// Indices of the configured outputs in [OUTPUT_NAMES]
    pub fn output_indices(&self) -> Result<Vec<usize>> {
        self.data
            .outputs
            .iter()
            .map(|name| {
                OUTPUT_NAMES.iter().position(|o| o == name).ok_or_else(|| {
                    InferenceError::InvalidConfigError(format!(
                        "Unknown output {name:?}, expected one of {OUTPUT_NAMES:?}"
                    ))
                })
            })
            .collect()
    }

    /// Mean specification of every output
    pub fn output_means(&self) -> Vec<Option<&MeanSpec>> {
        if self.means.is_empty() {
            vec![None; self.n_outputs()]
        } else {
            self.means.iter().map(|m| m.as_ref()).collect()
        }
    }

    /// Check the configuration consistency
    pub fn check(&self) -> Result<()> {
        let indices = self.output_indices()?;
        if indices.is_empty() {
            return Err(InferenceError::InvalidConfigError(
                "At least one output is required".to_string(),
            ));
        }
        if (1..indices.len()).any(|i| indices[..i].contains(&indices[i])) {
            return Err(InferenceError::InvalidConfigError(format!(
                "Duplicated outputs in {:?}",
                self.data.outputs
            )));
        }
        if self.nodes.is_empty() {
            return Err(InferenceError::InvalidConfigError(
                "At least one node is required".to_string(),
            ));
        }
        for (q, node) in self.nodes.iter().enumerate() {
            check_priors(&format!("node {q}"), node.kind.n_params(), &node.priors)?;
        }
        check_priors("weight", self.weight.kind.n_params(), &self.weight.priors)?;
        self.weight_prior.check()?;
        self.jitter_prior.check()?;
        if let Prior::Fixed(v) | Prior::Uniform { lower: v, .. } = self.jitter_prior {
            if v < 0. {
                return Err(InferenceError::InvalidConfigError(format!(
                    "Jitters should be non-negative, prior is {}",
                    self.jitter_prior
                )));
            }
        }
        if !self.means.is_empty() && self.means.len() != self.n_outputs() {
            return Err(InferenceError::InvalidConfigError(format!(
                "Expected one mean per output ({}), got {}",
                self.n_outputs(),
                self.means.len()
            )));
        }
        for (name, mean) in self.data.outputs.iter().zip(self.output_means()) {
            if let Some(mean) = mean {
                check_priors(&format!("{name} mean"), mean.kind.n_params(), &mean.priors)?;
            }
        }
        if !self.nugget.is_finite() || self.nugget < 0. {
            return Err(InferenceError::InvalidConfigError(format!(
                "Nugget should be finite and non-negative, got {}",
                self.nugget
            )));
        }
        Ok(())
    }

    /// Parse and check a JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: GprnConfig = serde_json::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Read and check a JSON configuration file.
    ///
    /// A relative data path is taken relative to the configuration file directory.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&content)?;
        if config.data.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.data.path = dir.join(&config.data.path);
            }
        }
        info!("Configuration read from {}", path.display());
        Ok(config)
    }

    /// JSON representation
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn check_priors(what: &str, expected: usize, priors: &[Prior]) -> Result<()> {
    if priors.len() != expected {
        return Err(InferenceError::InvalidConfigError(format!(
            "{what} expects {expected} priors, got {}",
            priors.len()
        )));
    }
    priors.iter().try_for_each(|p| p.check())
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "data": {"path": "corot7.rdb", "units": "kms", "outputs": ["rv", "fwhm"]},
        "nodes": [
            {"kind": "QuasiPeriodic", "priors": [
                {"LogUniform": {"lower": 1.0, "upper": 100.0}},
                {"Uniform": {"lower": 10.0, "upper": 40.0}},
                {"Fixed": 1.0}
            ]}
        ],
        "weight": {
            "kind": "SquaredExponential",
            "priors": [{"LogUniform": {"lower": 1.0, "upper": 1000.0}}]
        },
        "weight_prior": {"Uniform": {"lower": -20.0, "upper": 20.0}},
        "means": [
            {"kind": "Constant", "priors": [{"Uniform": {"lower": -10.0, "upper": 10.0}}]},
            null
        ],
        "jitter_prior": {"LogUniform": {"lower": 0.01, "upper": 5.0}},
        "seed": 42
    }"#;

    #[test]
    fn test_config_from_json() {
        let config = GprnConfig::from_json_str(JSON).unwrap();
        assert_eq!(Units::KilometersPerSecond, config.data.units);
        assert_eq!(DEFAULT_SKIP, config.data.skip);
        assert_eq!(vec![0, 1], config.output_indices().unwrap());
        assert_eq!(CorrelationKind::QuasiPeriodic, config.nodes[0].kind);
        assert_eq!(NUGGET_RATIO, config.nugget);
        assert_eq!(Some(42), config.seed);
        assert!(config.output_means()[1].is_none());

        let back = GprnConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_config_builder() {
        let config = GprnConfig::new("data.rdb")
            .outputs(&["rv", "bis"])
            .node(CorrelationKind::SquaredExponential, vec![Prior::Fixed(5.)])
            .weight(CorrelationKind::Constant, vec![])
            .jitter_prior(Prior::Uniform {
                lower: 0.,
                upper: 1.,
            })
            .seed(1);
        config.check().unwrap();
        assert_eq!(vec![0, 2], config.output_indices().unwrap());
        assert_eq!(vec![None, None], config.output_means());
    }

    #[test]
    fn test_config_errors() {
        let base =
            GprnConfig::new("data.rdb").node(CorrelationKind::Exponential, vec![Prior::Fixed(1.)]);
        assert!(base.clone().check().is_ok());
        assert!(GprnConfig::new("data.rdb").check().is_err());
        assert!(base.clone().outputs(&["rv", "velocity"]).check().is_err());
        assert!(base.clone().outputs(&["rv", "rv"]).check().is_err());
        assert!(base.clone().outputs(&[]).check().is_err());
        let missing_prior = base
            .clone()
            .node(CorrelationKind::Periodic, vec![Prior::Fixed(1.)]);
        assert!(missing_prior.check().is_err());
        assert!(base.clone().jitter_prior(Prior::Fixed(-1.)).check().is_err());
        assert!(base.clone().nugget(-1.).check().is_err());
        assert!(base.means(vec![None]).check().is_err());
        assert!(GprnConfig::from_json_str("{}").is_err());
    }
}
