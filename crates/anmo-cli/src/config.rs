use crate::cli::TrajArgs;
use crate::error::{CliError, Result};
use anmo::core::enm::springs::Spring;
use anmo::core::selection::Selection;
use anmo::engine::config::{AnalysisMethod, AnmoConfig, AnmoConfigBuilder, DEFAULT_OUTPUT_PREFIX};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_SELECTION: &str = "name == 'CA'";
pub const DEFAULT_THREADS: usize = 2;
pub const DEFAULT_PARTIAL_MODES: usize = 0;

/// Settings for `anmo traj` as read from a TOML file. Every key is optional;
/// command-line options override file values.
///
/// ```toml
/// selection = "name == 'CA' && resid <= 120"
/// spring = "exponential,-1.3"
/// bound = "constant,100"
/// skip = 10
/// prefix = "results/run1"
///
/// [coverlap]
/// enabled = true
/// threads = 8
/// partial = 20
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialTrajConfig {
    selection: Option<String>,
    spring: Option<Spring>,
    bound: Option<Spring>,
    skip: Option<usize>,
    prefix: Option<String>,
    report_progress: Option<bool>,
    coverlap: Option<PartialCoverlapConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCoverlapConfig {
    enabled: Option<bool>,
    threads: Option<usize>,
    partial: Option<usize>,
}

/// Fully resolved settings for one trajectory run.
#[derive(Debug, Clone)]
pub struct TrajSettings {
    pub selection: Selection,
    pub config: AnmoConfig,
}

impl PartialTrajConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn merge_with_cli(self, args: &TrajArgs) -> Result<TrajSettings> {
        let coverlap = self.coverlap.unwrap_or_default();

        let selection_text = args
            .selection
            .clone()
            .or(self.selection)
            .unwrap_or_else(|| DEFAULT_SELECTION.to_string());
        let selection = Selection::parse(&selection_text)?;

        let use_coverlap = args.coverlap || coverlap.enabled.unwrap_or(false);
        let method = if use_coverlap {
            AnalysisMethod::CovarianceOverlap {
                threads: args.threads.or(coverlap.threads).unwrap_or(DEFAULT_THREADS),
                partial_modes: args
                    .partial
                    .or(coverlap.partial)
                    .unwrap_or(DEFAULT_PARTIAL_MODES),
            }
        } else {
            AnalysisMethod::DotProduct
        };

        let config = AnmoConfigBuilder::new()
            .spring(args.spring.or(self.spring).unwrap_or_default())
            .bound_spring(args.bound.or(self.bound))
            .method(method)
            .skip(args.skip.or(self.skip).unwrap_or(0))
            .output_prefix(
                args.prefix
                    .clone()
                    .or(self.prefix)
                    .unwrap_or_else(|| DEFAULT_OUTPUT_PREFIX.to_string()),
            )
            .report_progress(!args.no_eta && self.report_progress.unwrap_or(true))
            .build()?;

        debug!(?config, selection = %selection, "Resolved trajectory settings");
        Ok(TrajSettings { selection, config })
    }
}
