//! Evaluation of shape functions and integration weights on physical elements.
//!
//! An [`FeEvaluator`] caches reference quantities for a fixed element type and quadrature, and
//! is re-initialized for each element (or element side) before integrating over it.
use crate::dof::FeType;
use crate::element::{quad_side_reference_coords, FiniteElement, FixedNodesReferenceFiniteElement, Quad9d2Element};
use crate::error::AssemblyError;
use crate::nalgebra::{OMatrix, Point2, U1, U2, U9};
use crate::quadrature::{gauss, quadrilateral_gauss, QuadraturePair1d, QuadraturePair2d};
use crate::Real;

pub type BasisValues<T> = OMatrix<T, U1, U9>;
pub type BasisGradients<T> = OMatrix<T, U2, U9>;

/// Shape function evaluator for biquadratic Lagrange elements.
#[derive(Debug, Clone)]
pub struct FeEvaluator<T: Real> {
    element_quadrature: QuadraturePair2d<T>,
    side_quadrature: QuadraturePair1d<T>,
    reference_phi: Vec<BasisValues<T>>,
    reference_gradients: Vec<BasisGradients<T>>,

    jxw: Vec<T>,
    phi_grad: Vec<BasisGradients<T>>,
    points: Vec<Point2<T>>,

    side_jxw: Vec<T>,
    side_phi: Vec<BasisValues<T>>,
    side_points: Vec<Point2<T>>,
}

impl<T: Real> FeEvaluator<T> {
    /// Creates an evaluator using `points_per_dim` Gauss points per reference direction, for
    /// both element and side integrals.
    ///
    /// Only second order Lagrange elements in two dimensions are supported.
    pub fn new(dimension: usize, fe_type: FeType, points_per_dim: usize) -> Result<Self, AssemblyError> {
        if dimension != 2 || fe_type != (FeType::Lagrange { order: 2 }) {
            return Err(AssemblyError::UnsupportedElement { dimension, fe_type });
        }

        let element_quadrature = quadrilateral_gauss(points_per_dim)?;
        let side_quadrature = gauss(points_per_dim)?;

        let reference = Quad9d2Element::reference();
        let (_, element_points) = &element_quadrature;
        let reference_phi = element_points
            .iter()
            .map(|xi| reference.evaluate_basis(xi))
            .collect();
        let reference_gradients = element_points
            .iter()
            .map(|xi| reference.gradients(xi))
            .collect();

        Ok(Self {
            element_quadrature,
            side_quadrature,
            reference_phi,
            reference_gradients,
            jxw: Vec::new(),
            phi_grad: Vec::new(),
            points: Vec::new(),
            side_jxw: Vec::new(),
            side_phi: Vec::new(),
            side_points: Vec::new(),
        })
    }

    pub fn num_element_quadrature_points(&self) -> usize {
        self.element_quadrature.0.len()
    }

    pub fn num_side_quadrature_points(&self) -> usize {
        self.side_quadrature.0.len()
    }

    /// Computes integration weights and physical gradients at the element quadrature points.
    ///
    /// `element_index` only serves to identify the element in errors.
    pub fn reinit(&mut self, element_index: usize, element: &Quad9d2Element<T>) -> Result<(), AssemblyError> {
        self.jxw.clear();
        self.phi_grad.clear();
        self.points.clear();

        let (weights, points) = &self.element_quadrature;
        for (w, xi, grad_ref) in itertools::izip!(weights, points, &self.reference_gradients) {
            let j = element.reference_jacobian(xi);
            let det = j.determinant();
            let j_inv_t = match j.try_inverse() {
                Some(j_inv) if det > T::zero() => j_inv.transpose(),
                _ => return Err(AssemblyError::DegenerateElement { element: element_index }),
            };
            self.jxw.push(*w * det);
            self.phi_grad.push(j_inv_t * grad_ref);
            self.points.push(element.map_reference_coords(xi));
        }
        Ok(())
    }

    /// Computes integration weights and basis values at the quadrature points of one side.
    ///
    /// # Panics
    ///
    /// Panics if `side` is not a valid side index of a quadrilateral.
    pub fn reinit_side(
        &mut self,
        element_index: usize,
        element: &Quad9d2Element<T>,
        side: usize,
    ) -> Result<(), AssemblyError> {
        assert!(side < 4, "Quadrilaterals have exactly four sides");
        self.side_jxw.clear();
        self.side_phi.clear();
        self.side_points.clear();

        let (weights, points) = &self.side_quadrature;
        for (w, s) in weights.iter().zip(points) {
            let (xi, tangent) = match quad_side_reference_coords(side, s[0]) {
                Some(coords) => coords,
                None => unreachable!("side index checked above"),
            };
            // Length of the mapped tangent is the side Jacobian
            let length_scale = (element.reference_jacobian(&xi) * tangent).norm();
            if length_scale <= T::zero() {
                return Err(AssemblyError::DegenerateElement { element: element_index });
            }
            self.side_jxw.push(*w * length_scale);
            self.side_phi.push(element.evaluate_basis(&xi));
            self.side_points.push(element.map_reference_coords(&xi));
        }
        Ok(())
    }

    /// Jacobian determinant times quadrature weight at each element quadrature point.
    pub fn jxw(&self) -> &[T] {
        &self.jxw
    }

    /// Basis function values at each element quadrature point.
    pub fn phi(&self) -> &[BasisValues<T>] {
        &self.reference_phi
    }

    /// Physical basis function gradients at each element quadrature point.
    pub fn dphi(&self) -> &[BasisGradients<T>] {
        &self.phi_grad
    }

    /// Physical coordinates of the element quadrature points.
    pub fn points(&self) -> &[Point2<T>] {
        &self.points
    }

    pub fn side_jxw(&self) -> &[T] {
        &self.side_jxw
    }

    pub fn side_phi(&self) -> &[BasisValues<T>] {
        &self.side_phi
    }

    pub fn side_points(&self) -> &[Point2<T>] {
        &self.side_points
    }
}
