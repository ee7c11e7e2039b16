//! # Core Module
//!
//! Stateless building blocks for elastic network analysis of molecular
//! trajectories.
//!
//! - **Molecular Representation** ([`models`]) - Atoms and structures with optional connectivity
//! - **File I/O** ([`io`]) - Model readers, trajectory access and plain-text matrices
//! - **Atom Selection** ([`selection`]) - Boolean expressions choosing the tracked atoms
//! - **Elastic Networks** ([`enm`]) - Springs, Hessian assembly, normal modes and overlaps
//!
//! Nothing in this layer keeps state across frames; per-trajectory state lives
//! in [`crate::engine`].

pub mod enm;
pub mod io;
pub mod models;
pub mod selection;
