use itertools::Itertools;
use numeric_literals::replace_float_literals;

use crate::connectivity::Quad9d2Connectivity;
use crate::element::{FiniteElement, FixedNodesReferenceFiniteElement};
use crate::nalgebra::{distance, Matrix2, OMatrix, OPoint, Point2, Scalar, Vector2, U1, U2, U9};
use crate::Real;

/// A finite element representing biquadratic basis functions on a quad, in two dimensions.
///
/// The element is isoparametric: the geometry is interpolated with the same nine basis
/// functions as the fields, so edge and center vertices may be placed freely and sides may
/// be curved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad9d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 9],
}

impl<T> Quad9d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 9]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 9] {
        &self.vertices
    }
}

impl<T> Quad9d2Element<T>
where
    T: Real,
{
    /// Vertex coordinates as the columns of a matrix.
    fn vertex_matrix(&self) -> OMatrix<T, U2, U9> {
        OMatrix::<T, U2, U9>::from_fn(|i, j| self.vertices[j][i])
    }

    /// Gathers the vertices of the element from the global vertex list.
    ///
    /// Returns `None` if the connectivity refers to a vertex that does not exist.
    pub fn from_connectivity(connectivity: &Quad9d2Connectivity, vertices: &[Point2<T>]) -> Option<Self> {
        let mut element_vertices = [Point2::origin(); 9];
        for (v, &global_index) in element_vertices.iter_mut().zip(connectivity.iter()) {
            *v = *vertices.get(global_index)?;
        }
        Some(Self::from_vertices(element_vertices))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        let p = |x, y| Point2::new(x, y);
        Self::from_vertices([
            p(-1.0, -1.0),
            p(1.0, -1.0),
            p(1.0, 1.0),
            p(-1.0, 1.0),
            p(0.0, -1.0),
            p(1.0, 0.0),
            p(0.0, 1.0),
            p(-1.0, 0.0),
            p(0.0, 0.0),
        ])
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_1d<T>(alpha: T, xi: T) -> T
where
    T: Real,
{
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi * xi + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_grad_1d<T>(alpha: T, xi: T) -> T
where
    T: Real,
{
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

/// Reference coordinates `(alpha, beta)` of the Quad9 nodes.
#[rustfmt::skip]
const QUAD9_REFERENCE_NODES: [(f64, f64); 9] = [
    (-1.0, -1.0),
    ( 1.0, -1.0),
    ( 1.0,  1.0),
    (-1.0,  1.0),
    ( 0.0, -1.0),
    ( 1.0,  0.0),
    ( 0.0,  1.0),
    (-1.0,  0.0),
    ( 0.0,  0.0),
];

impl<T> FixedNodesReferenceFiniteElement<T> for Quad9d2Element<T>
where
    T: Real,
{
    type NodalDim = U9;

    fn evaluate_basis(&self, xi: &Point2<T>) -> OMatrix<T, U1, U9> {
        // The basis functions are separable, N_{alpha, beta}(xi, eta) = N_alpha(xi) * N_beta(eta),
        // with N_{alpha, beta}([alpha, beta]) = 1.
        OMatrix::<T, U1, U9>::from_fn(|_, j| {
            let (alpha, beta) = reference_node::<T>(j);
            quad9_phi_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1])
        })
    }

    fn gradients(&self, xi: &Point2<T>) -> OMatrix<T, U2, U9> {
        OMatrix::<T, U2, U9>::from_fn(|i, j| {
            let (alpha, beta) = reference_node::<T>(j);
            let (x, y) = (xi[0], xi[1]);
            if i == 0 {
                quad9_phi_grad_1d(alpha, x) * quad9_phi_1d(beta, y)
            } else {
                quad9_phi_1d(alpha, x) * quad9_phi_grad_1d(beta, y)
            }
        })
    }
}

fn reference_node<T: Real>(index: usize) -> (T, T) {
    let (alpha, beta) = QUAD9_REFERENCE_NODES[index];
    (nalgebra::convert(alpha), nalgebra::convert(beta))
}

impl<T> FiniteElement<T> for Quad9d2Element<T>
where
    T: Real,
{
    #[allow(non_snake_case)]
    fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        // x = sum_i N_i(xi) x_i
        let N = self.evaluate_basis(xi);
        OPoint::from(self.vertex_matrix() * N.transpose())
    }

    #[allow(non_snake_case)]
    fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        // J = X * G^T, with the reference gradients of the basis as the columns of G
        let G = self.gradients(xi);
        self.vertex_matrix() * G.transpose()
    }

    fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| distance(x, y))
            .fold(T::zero(), |a, b| a.max(b))
    }
}

/// Maps the parameter `s` in `[-1, 1]` on the given side of the reference quadrilateral to
/// reference coordinates, along with the reference tangent `d xi / d s`.
///
/// The sides are traversed counter-clockwise, matching the node order of
/// [`QUAD9_SIDE_NODES`](crate::connectivity::QUAD9_SIDE_NODES). Returns `None` for an invalid side.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn quad_side_reference_coords<T: Real>(side: usize, s: T) -> Option<(Point2<T>, Vector2<T>)> {
    match side {
        0 => Some((Point2::new(s, -1.0), Vector2::new(1.0, 0.0))),
        1 => Some((Point2::new(1.0, s), Vector2::new(0.0, 1.0))),
        2 => Some((Point2::new(-s, 1.0), Vector2::new(-1.0, 0.0))),
        3 => Some((Point2::new(-1.0, -s), Vector2::new(0.0, -1.0))),
        _ => None,
    }
}
