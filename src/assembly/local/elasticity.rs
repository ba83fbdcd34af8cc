use crate::assembly::local::{ElasticityBlocks, LocalSystem};
use crate::fe::FeEvaluator;
use crate::material::ElasticityTensor;
use crate::nalgebra::Vector2;
use crate::Real;
use itertools::izip;

/// Accumulates the stiffness of the bilinear form $\int \epsilon(u) : C : \epsilon(w)$ into the
/// four displacement blocks of the local system.
///
/// The evaluator must have been re-initialized for the element. For each quadrature point and
/// each pair of basis functions `(i, j)`, the block coupling component `ci` of the test function
/// with component `ck` of the trial function receives
/// $$
/// \mathrm{JxW} \sum_{c_j, c_l} C_{c_i c_j c_k c_l} \nabla \phi_i [c_j] \nabla \phi_j [c_l].
/// $$
/// The multiplier rows and columns are left untouched.
pub fn assemble_element_stiffness<T>(
    local: &mut LocalSystem<T>,
    fe: &FeEvaluator<T>,
    tensor: &ElasticityTensor<T>,
    blocks: &ElasticityBlocks,
) where
    T: Real,
{
    for (&jxw, dphi) in izip!(fe.jxw(), fe.dphi()) {
        let num_basis = dphi.ncols();
        for i in 0..num_basis {
            let grad_i: Vector2<T> = dphi.column(i).into_owned();
            for j in 0..num_basis {
                let grad_j: Vector2<T> = dphi.column(j).into_owned();
                let contraction = tensor.contract(&grad_i, &grad_j);
                for (ci, block_row) in blocks.displacement.iter().enumerate() {
                    for (ck, block) in block_row.iter().enumerate() {
                        local.add_to_block(block, i, j, jxw * contraction[(ci, ck)]);
                    }
                }
            }
        }
    }
}
