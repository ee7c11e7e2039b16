use crate::core::models::structure::Structure;
use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TopologyError {
    #[error("Bound springs require a model with connectivity records")]
    MissingConnectivity,
}

/// A pair of nodes connected by a spring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub i: usize,
    pub j: usize,
    /// Whether the pair is bonded and takes the bound spring.
    pub bonded: bool,
}

/// The fixed spring network of an elastic network model.
///
/// Every unordered pair of nodes is a contact; whether a contact contributes
/// is decided per frame by its spring (e.g. a distance cutoff). Contacts are
/// ordered by `(i, j)` with `i < j`, which fixes the Hessian summation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    size: usize,
    contacts: Vec<Contact>,
}

impl Topology {
    /// A network of `size` nodes where no contact is bonded.
    pub fn fully_connected(size: usize) -> Self {
        let contacts = (0..size)
            .tuple_combinations()
            .map(|(i, j)| Contact {
                i,
                j,
                bonded: false,
            })
            .collect();
        Self { size, contacts }
    }

    /// Builds the network over the atoms of `structure`. With `use_bonds`,
    /// contacts between bonded atoms are flagged for the bound spring.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MissingConnectivity`] if `use_bonds` is set
    /// and the structure has no connectivity.
    pub fn from_structure(structure: &Structure, use_bonds: bool) -> Result<Self, TopologyError> {
        if use_bonds && !structure.has_bonds() {
            return Err(TopologyError::MissingConnectivity);
        }
        let mut topology = Self::fully_connected(structure.len());
        if use_bonds {
            for contact in &mut topology.contacts {
                contact.bonded = structure.is_bound(contact.i, contact.j);
            }
        }
        Ok(topology)
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Degrees of freedom (3 per node).
    pub fn dof(&self) -> usize {
        3 * self.size
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn bonded_count(&self) -> usize {
        self.contacts.iter().filter(|c| c.bonded).count()
    }
}
