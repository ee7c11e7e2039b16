//! # ANMO Core Library
//!
//! Anisotropic elastic network mode analysis across molecular trajectories.
//!
//! For every frame of a trajectory an elastic network is built over a fixed
//! subset of atoms, its Hessian is diagonalized, and the resulting spectra are
//! compared across frames, either by the dot product of the dominant modes or
//! by the covariance overlap of the compliance-weighted internal modes.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Stateless models, file formats, atom
//!   selections and the elastic network primitives (springs, Hessian,
//!   normal modes, covariance overlap).
//!
//! - **[`engine`]: The Logic Core.** Configuration, the similarity strategies,
//!   and the row distributor and worker pool that fill the pairwise overlap
//!   matrix in parallel.
//!
//! - **[`workflows`]: The Public API.** The trajectory driver that reads frames,
//!   accumulates spectra and writes the result matrices.

pub mod core;
pub mod engine;
pub mod workflows;
