use nalgebra::Point3;

/// An atom of a molecular model.
///
/// Atoms carry the identity fields that selections are evaluated against
/// (`name`, `resname`, `resid`, `serial`) plus the current coordinates.
/// The `index` is the atom's position within the source model, and therefore
/// within every trajectory frame; it stays fixed when the atom is copied into
/// a selected subset, so subset coordinates can be refreshed frame by frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Zero-based position of the atom in the source model and in each frame.
    pub index: usize,
    /// Serial number as written in the source file (1-based in most formats).
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "O").
    pub name: String,
    /// The residue name (e.g., "ALA"); empty when the format has none.
    pub resname: String,
    /// The residue number.
    pub resid: isize,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` whose residue fields are empty.
    ///
    /// # Arguments
    ///
    /// * `index` - Zero-based position in the source model.
    /// * `serial` - The serial number from the source file.
    /// * `name` - The atom name.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(index: usize, serial: usize, name: &str, position: Point3<f64>) -> Self {
        Self {
            index,
            serial,
            name: name.to_string(),
            resname: String::new(),
            resid: 0,
            position,
        }
    }

    /// Sets the residue name and number, returning the updated atom.
    pub fn with_residue(mut self, resname: &str, resid: isize) -> Self {
        self.resname = resname.to_string();
        self.resid = resid;
        self
    }
}
