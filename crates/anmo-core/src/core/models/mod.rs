//! # Core Models Module
//!
//! Data structures describing the molecular model an elastic network is built
//! from.
//!
//! - [`atom`] - Individual atoms with identity fields and coordinates
//! - [`structure`] - Ordered atom groups with optional bond connectivity,
//!   subsetting and splitting
//!
//! A [`structure::Structure`] read from a model file is narrowed to the tracked
//! atoms with a selection; the resulting subset keeps each atom's source index,
//! which is how trajectory frames refresh its coordinates.

pub mod atom;
pub mod structure;
