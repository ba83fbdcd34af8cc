//! Local (element) and global assembly of the elasticity system.
//!
//! Assembly proceeds in two stages. For every element, the [local](local) stage computes a
//! dense [`LocalSystem`](local::LocalSystem) holding the stiffness blocks, the boundary terms
//! and (optionally) the eliminated Dirichlet conditions. The [global](global) stage scatters
//! these local systems additively into a CSR matrix and a dense right-hand side.

pub mod dirichlet;
pub mod global;
pub mod local;
