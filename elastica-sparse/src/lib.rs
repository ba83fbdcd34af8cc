//! Linear solvers for `elastica`.
//!
//! The assembly code in `elastica` treats the solve as an opaque operation: it hands over a
//! CSR matrix and a right-hand side and receives either a solution or a typed error.

pub mod cg;
pub mod direct;

pub extern crate nalgebra_sparse;
