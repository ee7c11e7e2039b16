use super::EnmError;
use super::springs::SpringSet;
use super::topology::Topology;
use nalgebra::{DMatrix, Matrix3, Point3};

/// Assembles the 3N×3N anisotropic network Hessian for the given coordinates.
///
/// Each contact `(i, j)` with separation `u = x_j - x_i` contributes the block
/// `B = k(|u|) * û ûᵀ`, added to the diagonal blocks of `i` and `j` and
/// subtracted from the two off-diagonal blocks. Coincident atoms contribute
/// nothing.
///
/// # Errors
///
/// Returns [`EnmError::SizeMismatch`] if the number of coordinates differs
/// from the topology size.
pub fn build_hessian(
    topology: &Topology,
    springs: &SpringSet,
    coords: &[Point3<f64>],
) -> Result<DMatrix<f64>, EnmError> {
    if coords.len() != topology.size() {
        return Err(EnmError::SizeMismatch {
            expected: topology.size(),
            found: coords.len(),
        });
    }

    let dof = topology.dof();
    let mut hessian = DMatrix::<f64>::zeros(dof, dof);

    for contact in topology.contacts() {
        let u = coords[contact.j] - coords[contact.i];
        let d2 = u.norm_squared();
        if d2 == 0.0 {
            continue;
        }
        let k = springs.for_contact(contact.bonded).stiffness(d2.sqrt());
        if k == 0.0 {
            continue;
        }
        let block: Matrix3<f64> = (u * u.transpose()) * (k / d2);

        let (bi, bj) = (3 * contact.i, 3 * contact.j);
        {
            let mut ii = hessian.fixed_view_mut::<3, 3>(bi, bi);
            ii += block;
        }
        {
            let mut jj = hessian.fixed_view_mut::<3, 3>(bj, bj);
            jj += block;
        }
        {
            let mut ij = hessian.fixed_view_mut::<3, 3>(bi, bj);
            ij -= block;
        }
        {
            let mut ji = hessian.fixed_view_mut::<3, 3>(bj, bi);
            ji -= block;
        }
    }

    Ok(hessian)
}
