use crate::assembly::dirichlet::DirichletBoundary;
use crate::assembly::local::{ElasticityBlocks, LocalSystem};
use crate::element::Quad9d2Element;
use crate::error::AssemblyError;
use crate::fe::FeEvaluator;
use crate::mesh::{procedural, BoundaryId, Mesh};
use crate::nalgebra::convert;
use crate::Real;
use itertools::izip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Natural boundary condition attached to a boundary id.
///
/// Components refer to the displacement fields, `0` for `u` and `1` for `v`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// No contribution.
    TractionFree,
    /// Uniform traction `value` on the given displacement component.
    Traction { component: usize, value: f64 },
    /// Couples the given displacement component to the scalar multiplier through the
    /// functional `coefficient * \int component`.
    MultiplierConstraint { component: usize, coefficient: f64 },
}

impl BoundaryCondition {
    fn component(&self) -> Option<usize> {
        match self {
            Self::TractionFree => None,
            Self::Traction { component, .. } | Self::MultiplierConstraint { component, .. } => Some(*component),
        }
    }
}

/// Binding of boundary ids to boundary conditions.
///
/// Every exterior side of the mesh must carry an id that is either bound to a
/// [`BoundaryCondition`] or declared as a Dirichlet boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryBindings {
    pub conditions: BTreeMap<BoundaryId, BoundaryCondition>,
    pub dirichlet: Vec<DirichletBoundary>,
}

impl Default for BoundaryBindings {
    /// A beam clamped on the left, loaded on top and constrained on the right, with the ids
    /// produced by [`create_rectangular_quad9_mesh`](procedural::create_rectangular_quad9_mesh).
    fn default() -> Self {
        let conditions = [
            (procedural::BOTTOM, BoundaryCondition::TractionFree),
            (
                procedural::RIGHT,
                BoundaryCondition::MultiplierConstraint {
                    component: 1,
                    coefficient: -1.0,
                },
            ),
            (procedural::TOP, BoundaryCondition::Traction { component: 1, value: -1.0 }),
        ]
        .into_iter()
        .collect();
        Self {
            conditions,
            dirichlet: vec![DirichletBoundary::default()],
        }
    }
}

impl BoundaryBindings {
    pub fn condition(&self, id: BoundaryId) -> Option<&BoundaryCondition> {
        self.conditions.get(&id)
    }

    pub fn is_dirichlet(&self, id: BoundaryId) -> bool {
        self.dirichlet
            .iter()
            .any(|boundary| boundary.boundary_ids.contains(&id))
    }

    /// The natural boundary condition that applies to the given side.
    ///
    /// Returns `None` for interior sides and sides that only carry a Dirichlet condition.
    pub fn resolve<T: Real>(
        &self,
        mesh: &Mesh<T>,
        element: usize,
        side: usize,
    ) -> Result<Option<&BoundaryCondition>, AssemblyError> {
        if !mesh.is_exterior_side(element, side) {
            return Ok(None);
        }
        let id = mesh
            .boundary_id(element, side)
            .ok_or(AssemblyError::UnsetBoundaryId { element, side })?;
        match self.condition(id) {
            Some(condition) => Ok(Some(condition)),
            None if self.is_dirichlet(id) => Ok(None),
            None => Err(AssemblyError::UnboundBoundaryId { element, side, id }),
        }
    }

    /// Checks that every exterior side of the mesh resolves to a boundary condition and that
    /// every condition refers to a valid displacement component.
    pub fn validate<T: Real>(&self, mesh: &Mesh<T>) -> Result<(), AssemblyError> {
        for (&id, condition) in &self.conditions {
            match condition.component() {
                Some(component) if component >= 2 => {
                    return Err(AssemblyError::InvalidComponent { id, component });
                }
                _ => {}
            }
        }
        for (element, side) in mesh.exterior_sides() {
            self.resolve(mesh, element, side)?;
        }
        Ok(())
    }
}

/// Integrates the natural boundary conditions over the exterior sides of an element.
///
/// Traction conditions add `JxW * value * phi_i` to the rows of the displacement component.
/// Multiplier constraints add `JxW * coefficient * phi_i` symmetrically to the blocks coupling
/// the displacement component with the multiplier. Sides carrying only a Dirichlet condition
/// are skipped.
pub fn assemble_element_boundary_terms<T>(
    local: &mut LocalSystem<T>,
    fe: &mut FeEvaluator<T>,
    mesh: &Mesh<T>,
    element_index: usize,
    element: &Quad9d2Element<T>,
    bindings: &BoundaryBindings,
    blocks: &ElasticityBlocks,
) -> Result<(), AssemblyError>
where
    T: Real,
{
    for side in 0..4 {
        let condition = match bindings.resolve(mesh, element_index, side)? {
            Some(condition) => *condition,
            None => continue,
        };

        match condition {
            BoundaryCondition::TractionFree => {}
            BoundaryCondition::Traction { component, value } => {
                let block = *blocks
                    .displacement
                    .get(component)
                    .map(|row| &row[0])
                    .ok_or_else(|| invalid_component(mesh, element_index, side, component))?;
                let value: T = convert(value);
                fe.reinit_side(element_index, element, side)?;
                for (&jxw, phi) in izip!(fe.side_jxw(), fe.side_phi()) {
                    let mut rhs = local.rhs_block_mut(&block);
                    for i in 0..block.nrows {
                        rhs[i] += jxw * value * phi[i];
                    }
                }
            }
            BoundaryCondition::MultiplierConstraint { component, coefficient } => {
                let (column_block, row_block) = match (
                    blocks.displacement_multiplier.get(component),
                    blocks.multiplier_displacement.get(component),
                ) {
                    (Some(column_block), Some(row_block)) => (*column_block, *row_block),
                    _ => return Err(invalid_component(mesh, element_index, side, component)),
                };
                let coefficient: T = convert(coefficient);
                fe.reinit_side(element_index, element, side)?;
                for (&jxw, phi) in izip!(fe.side_jxw(), fe.side_phi()) {
                    for i in 0..column_block.nrows {
                        let contribution = jxw * coefficient * phi[i];
                        local.add_to_block(&column_block, i, 0, contribution);
                        local.add_to_block(&row_block, 0, i, contribution);
                    }
                }
            }
        }
    }
    Ok(())
}

fn invalid_component<T: Real>(mesh: &Mesh<T>, element: usize, side: usize, component: usize) -> AssemblyError {
    AssemblyError::InvalidComponent {
        id: mesh.boundary_id(element, side).unwrap_or_default(),
        component,
    }
}
