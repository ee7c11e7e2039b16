//! # Workflows Module
//!
//! Top-level entry points that tie [`crate::core`] and [`crate::engine`]
//! together.
//!
//! - **Trajectory Analysis** ([`traj`]) - Builds an elastic network per frame,
//!   accumulates the spectra and produces the eigenvalue table and the frame
//!   similarity matrix.

pub mod traj;
