use crate::core::enm::springs::{Spring, SpringSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Covariance overlap needs at least one worker thread")]
    NoWorkerThreads,
    #[error("Requested {requested} modes but the network only has {available} internal modes")]
    TooManyModes { requested: usize, available: usize },
    #[error("Output prefix must not be empty")]
    EmptyPrefix,
}

/// How frame spectra are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMethod {
    /// Absolute dot products of the dominant eigenvectors.
    DotProduct,
    /// Covariance overlap of compliance-weighted modes.
    ///
    /// `partial_modes == 0` uses every internal mode.
    CovarianceOverlap {
        threads: usize,
        partial_modes: usize,
    },
}

impl AnalysisMethod {
    /// Suffix of the similarity matrix artifact (`D` or `O`).
    pub fn tag(&self) -> &'static str {
        match self {
            AnalysisMethod::DotProduct => "D",
            AnalysisMethod::CovarianceOverlap { .. } => "O",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnmoConfig {
    pub springs: SpringSet,
    pub method: AnalysisMethod,
    /// Number of leading trajectory frames to skip.
    pub skip: usize,
    /// Artifacts are written to `<prefix>_s.asc` and `<prefix>_<tag>.asc`.
    pub output_prefix: String,
    /// Emit periodic progress/ETA lines during the pairwise phase.
    pub report_progress: bool,
}

pub const DEFAULT_OUTPUT_PREFIX: &str = "anmo_traj";

#[derive(Default)]
pub struct AnmoConfigBuilder {
    spring: Option<Spring>,
    bound_spring: Option<Spring>,
    method: Option<AnalysisMethod>,
    skip: Option<usize>,
    output_prefix: Option<String>,
    report_progress: Option<bool>,
}

impl AnmoConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spring(mut self, spring: Spring) -> Self {
        self.spring = Some(spring);
        self
    }
    pub fn bound_spring(mut self, spring: Option<Spring>) -> Self {
        self.bound_spring = spring;
        self
    }
    pub fn method(mut self, method: AnalysisMethod) -> Self {
        self.method = Some(method);
        self
    }
    pub fn skip(mut self, frames: usize) -> Self {
        self.skip = Some(frames);
        self
    }
    pub fn output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = Some(prefix.into());
        self
    }
    pub fn report_progress(mut self, enabled: bool) -> Self {
        self.report_progress = Some(enabled);
        self
    }

    pub fn build(self) -> Result<AnmoConfig, ConfigError> {
        let method = self.method.ok_or(ConfigError::MissingParameter("method"))?;
        if let AnalysisMethod::CovarianceOverlap { threads: 0, .. } = method {
            return Err(ConfigError::NoWorkerThreads);
        }

        let output_prefix = self
            .output_prefix
            .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string());
        if output_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        Ok(AnmoConfig {
            springs: SpringSet::new(self.spring.unwrap_or_default(), self.bound_spring),
            method,
            skip: self.skip.unwrap_or(0),
            output_prefix,
            report_progress: self.report_progress.unwrap_or(true),
        })
    }
}
