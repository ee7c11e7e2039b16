use super::atom::Atom;
use nalgebra::Point3;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Bond ({0}, {1}) refers to an atom outside the structure")]
    BondOutOfRange(usize, usize),
    #[error("Structure has no connectivity records")]
    MissingConnectivity,
}

/// An ordered group of atoms with optional connectivity.
///
/// Connectivity is stored as an adjacency list over positions in `atoms`
/// and is `None` when the source file carried no bond records. An empty
/// adjacency (`Some` with no edges) means bonds were read and there were none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    atoms: Vec<Atom>,
    adjacency: Option<Vec<Vec<usize>>>,
}

impl Structure {
    /// Creates a structure without connectivity.
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self {
            atoms,
            adjacency: None,
        }
    }

    /// Creates a structure whose connectivity is given by `bonds`, a list of
    /// position pairs into `atoms`. Duplicate and self bonds are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::BondOutOfRange`] if a pair refers to a
    /// position past the end of `atoms`.
    pub fn with_bonds(
        atoms: Vec<Atom>,
        bonds: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, StructureError> {
        let n = atoms.len();
        let mut adjacency = vec![Vec::new(); n];
        for (a, b) in bonds {
            if a >= n || b >= n {
                return Err(StructureError::BondOutOfRange(a, b));
            }
            if a == b || adjacency[a].contains(&b) {
                continue;
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }
        Ok(Self {
            atoms,
            adjacency: Some(adjacency),
        })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, i: usize) -> Option<&Atom> {
        self.atoms.get(i)
    }

    /// Whether the structure carries connectivity records.
    pub fn has_bonds(&self) -> bool {
        self.adjacency.is_some()
    }

    /// Whether atoms at positions `i` and `j` are directly bonded.
    /// Always `false` when the structure has no connectivity.
    pub fn is_bound(&self, i: usize, j: usize) -> bool {
        self.adjacency
            .as_ref()
            .and_then(|adj| adj.get(i))
            .is_some_and(|neighbors| neighbors.contains(&j))
    }

    /// Positions bonded to the atom at position `i`.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.adjacency
            .as_ref()
            .and_then(|adj| adj.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Current coordinates, in atom order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Copies the atoms at `positions` into a new structure, keeping their
    /// source indices. Connectivity, if any, is restricted to the bonds
    /// between the copied atoms and renumbered.
    pub fn subset(&self, positions: &[usize]) -> Structure {
        let atoms: Vec<Atom> = positions
            .iter()
            .filter_map(|&p| self.atoms.get(p).cloned())
            .collect();

        let adjacency = self.adjacency.as_ref().map(|adj| {
            let remap: BTreeMap<usize, usize> = positions
                .iter()
                .enumerate()
                .map(|(new, &old)| (old, new))
                .collect();
            positions
                .iter()
                .map(|&old| {
                    adj.get(old)
                        .into_iter()
                        .flatten()
                        .filter_map(|nb| remap.get(nb).copied())
                        .collect()
                })
                .collect()
        });

        Structure { atoms, adjacency }
    }

    /// Splits into groups of consecutive atoms sharing a residue
    /// (same `resid` and `resname`).
    pub fn split_by_residue(&self) -> Vec<Structure> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut last: Option<(isize, &str)> = None;
        for (i, atom) in self.atoms.iter().enumerate() {
            let key = (atom.resid, atom.resname.as_str());
            match groups.last_mut() {
                Some(group) if last == Some(key) => group.push(i),
                _ => groups.push(vec![i]),
            }
            last = Some(key);
        }
        groups.iter().map(|g| self.subset(g)).collect()
    }

    /// Splits into groups keyed by atom name.
    pub fn split_by_name(&self) -> BTreeMap<String, Structure> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            groups.entry(atom.name.clone()).or_default().push(i);
        }
        groups
            .into_iter()
            .map(|(name, g)| (name, self.subset(&g)))
            .collect()
    }

    /// Splits into connected components of the bond graph, ordered by their
    /// first atom.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::MissingConnectivity`] when the structure has
    /// no bond records.
    pub fn split_by_molecule(&self) -> Result<Vec<Structure>, StructureError> {
        if !self.has_bonds() {
            return Err(StructureError::MissingConnectivity);
        }
        let mut seen = vec![false; self.len()];
        let mut molecules = Vec::new();
        for start in 0..self.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut stack = vec![start];
            let mut members = Vec::new();
            while let Some(i) = stack.pop() {
                members.push(i);
                for &nb in self.neighbors(i) {
                    if !seen[nb] {
                        seen[nb] = true;
                        stack.push(nb);
                    }
                }
            }
            members.sort_unstable();
            molecules.push(self.subset(&members));
        }
        Ok(molecules)
    }
}
