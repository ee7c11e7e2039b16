//! # Engine Module
//!
//! Stateful machinery that turns a stream of per-frame spectra into
//! similarity matrices.
//!
//! - **Configuration** ([`config`]) - Springs, analysis method, frame skipping and output prefix
//! - **Similarity Strategies** ([`analysis`]) - Dot-product and covariance-overlap analyzers
//! - **Work Distribution** ([`distributor`]) - Exactly-once row claims with periodic ETA reports
//! - **Worker Pool** ([`pool`]) - Fixed-size thread pool filling pairwise matrices
//! - **Progress Monitoring** ([`progress`]) - Callback events for front ends
//! - **Error Handling** ([`error`]) - The umbrella error type of the library
//!
//! Only the covariance-overlap pairwise phase runs in parallel. Frame
//! accumulation is sequential and in trajectory order.

pub mod analysis;
pub mod config;
pub mod distributor;
pub mod error;
pub mod pool;
pub mod progress;
