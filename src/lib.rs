//! Finite element assembly of two-dimensional linear elasticity problems with a global
//! scalar constraint enforced through a Lagrange multiplier.
//!
//! The crate assembles the saddle point system
//!
//! ```text
//! [ K    B^T ] [ U      ]   [ F ]
//! [ B    0   ] [ lambda ] = [ 0 ]
//! ```
//!
//! on meshes of biquadratic (9-node) quadrilaterals, where `K` is the stiffness matrix of
//! the displacement fields `u` and `v`, and `B` encodes a linear functional of `v` over a
//! tagged part of the boundary.

use nalgebra::RealField;

pub mod assembly;
pub mod config;
pub mod connectivity;
pub mod dof;
pub mod element;
pub mod error;
pub mod fe;
pub mod io;
pub mod material;
pub mod mesh;
pub mod quadrature;
pub mod system;

pub use error::AssemblyError;

pub extern crate elastica_quadrature;
pub extern crate elastica_sparse;
pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate vtkio;

/// A real scalar type that is cheap to copy.
///
/// Used as a trait alias for the bounds needed by the generic numerical routines in `elastica`.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
