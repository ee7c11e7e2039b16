use thiserror::Error;

use super::config::ConfigError;
use crate::core::enm::EnmError;
use crate::core::enm::topology::TopologyError;
use crate::core::io::ascii::AsciiError;
use crate::core::io::traits::TrajectoryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build elastic network: {0}")]
    Topology(#[from] TopologyError),

    #[error("Failed to solve normal modes: {0}")]
    Enm(#[from] EnmError),

    #[error("Trajectory error: {0}")]
    Trajectory(#[from] TrajectoryError),

    #[error("Failed to write '{path}': {source}")]
    Output {
        path: String,
        #[source]
        source: AsciiError,
    },

    #[error("Analysis needs at least {required} modes per frame, got {found}")]
    TooFewModes { required: usize, found: usize },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
