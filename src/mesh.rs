//! Quad9 meshes with tagged boundary sides.
use crate::connectivity::{Connectivity, Quad9d2Connectivity};
use crate::element::Quad9d2Element;
use crate::error::AssemblyError;
use crate::nalgebra::{Point2, Scalar};
use crate::Real;
use itertools::Either;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

pub mod procedural;

/// Integer tag attached to exterior element sides.
pub type BoundaryId = u32;

/// A mesh of biquadratic quadrilaterals in two dimensions.
///
/// Sides shared by two elements are interior. Every other side is exterior and may carry a
/// [`BoundaryId`].
#[derive(Debug, Clone)]
pub struct Mesh<T: Scalar> {
    vertices: Vec<Point2<T>>,
    connectivity: Vec<Quad9d2Connectivity>,
    // Neighbor across each side, None for exterior sides
    neighbors: Vec<[Option<usize>; 4]>,
    boundary_ids: FxHashMap<(usize, usize), BoundaryId>,
    // Elements owned by this process. All elements if None
    local_elements: Option<Vec<usize>>,
}

impl<T: Scalar> Mesh<T> {
    /// Constructs a mesh, validating that every connectivity refers to existing vertices.
    ///
    /// No side carries a boundary id initially.
    pub fn from_vertices_and_connectivity(
        vertices: Vec<Point2<T>>,
        connectivity: Vec<Quad9d2Connectivity>,
    ) -> Result<Self, AssemblyError> {
        for (element, conn) in connectivity.iter().enumerate() {
            if let Some(&vertex) = conn.iter().find(|&&v| v >= vertices.len()) {
                return Err(AssemblyError::VertexOutOfBounds { element, vertex });
            }
        }
        Ok(Self::from_vertices_and_connectivity_unchecked(vertices, connectivity))
    }

    pub(crate) fn from_vertices_and_connectivity_unchecked(
        vertices: Vec<Point2<T>>,
        connectivity: Vec<Quad9d2Connectivity>,
    ) -> Self {
        let neighbors = compute_side_neighbors(&connectivity);
        Self {
            vertices,
            connectivity,
            neighbors,
            boundary_ids: FxHashMap::default(),
            local_elements: None,
        }
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Quad9d2Connectivity] {
        &self.connectivity
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    /// The element on the other side of the given side, if the side is interior.
    pub fn neighbor(&self, element: usize, side: usize) -> Option<usize> {
        self.neighbors.get(element)?.get(side).copied().flatten()
    }

    /// Whether the given side of the element lies on the domain boundary.
    ///
    /// # Panics
    ///
    /// Panics if the element or side index is out of bounds.
    pub fn is_exterior_side(&self, element: usize, side: usize) -> bool {
        self.neighbors[element][side].is_none()
    }

    /// Iterates over all exterior sides as `(element, side)` pairs.
    pub fn exterior_sides(&self) -> impl '_ + Iterator<Item = (usize, usize)> {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(element, sides)| {
                sides
                    .iter()
                    .enumerate()
                    .filter(|(_, neighbor)| neighbor.is_none())
                    .map(move |(side, _)| (element, side))
            })
    }

    /// The boundary id of the given side, or `None` if unset.
    pub fn boundary_id(&self, element: usize, side: usize) -> Option<BoundaryId> {
        self.boundary_ids.get(&(element, side)).copied()
    }

    /// Tags the given side with a boundary id, replacing any previous id.
    ///
    /// # Panics
    ///
    /// Panics if the element or side index is out of bounds.
    pub fn set_boundary_id(&mut self, element: usize, side: usize, id: BoundaryId) {
        assert!(element < self.num_elements(), "Element index out of bounds");
        assert!(side < 4, "Quad9 elements have exactly four sides");
        self.boundary_ids.insert((element, side), id);
    }

    /// The sorted set of boundary ids in use.
    pub fn boundary_id_set(&self) -> BTreeSet<BoundaryId> {
        self.boundary_ids.values().copied().collect()
    }

    /// Returns a sorted list of vertices on sides tagged with one of the given ids.
    pub fn vertices_with_boundary_ids(&self, ids: &BTreeSet<BoundaryId>) -> Vec<usize> {
        let mut vertices = Vec::new();
        for (&(element, side), id) in &self.boundary_ids {
            if ids.contains(id) {
                if let Some(face) = self.connectivity[element].get_face_connectivity(side) {
                    vertices.extend_from_slice(face.vertex_indices());
                }
            }
        }
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }

    /// Restricts the elements visited by assembly to the given (owned) subset.
    ///
    /// Passing `None` makes every element active.
    pub fn set_local_elements(&mut self, elements: Option<Vec<usize>>) {
        self.local_elements = elements;
    }

    /// Iterates over the indices of the active elements owned by this process.
    pub fn active_local_elements(&self) -> impl '_ + Iterator<Item = usize> {
        match &self.local_elements {
            Some(elements) => Either::Left(elements.iter().copied()),
            None => Either::Right(0..self.num_elements()),
        }
    }
}

impl<T: Real> Mesh<T> {
    /// The geometric element with the given index.
    pub fn element(&self, index: usize) -> Option<Quad9d2Element<T>> {
        Quad9d2Element::from_connectivity(self.connectivity.get(index)?, &self.vertices)
    }

    /// Tags every exterior side with the id returned by `tag`, which receives the start and end
    /// vertices of the side. Sides for which `tag` returns `None` are left untouched.
    pub fn tag_exterior_sides<F>(&mut self, mut tag: F)
    where
        F: FnMut(&Point2<T>, &Point2<T>) -> Option<BoundaryId>,
    {
        let sides: Vec<_> = self.exterior_sides().collect();
        for (element, side) in sides {
            if let Some(face) = self.connectivity[element].get_face_connectivity(side) {
                let [a, _, b] = face.0;
                if let Some(id) = tag(&self.vertices[a], &self.vertices[b]) {
                    self.boundary_ids.insert((element, side), id);
                }
            }
        }
    }
}

fn compute_side_neighbors(connectivity: &[Quad9d2Connectivity]) -> Vec<[Option<usize>; 4]> {
    let mut side_owners: FxHashMap<[usize; 2], Vec<(usize, usize)>> = FxHashMap::default();
    for (element, conn) in connectivity.iter().enumerate() {
        for side in 0..conn.num_faces() {
            if let Some(face) = conn.get_face_connectivity(side) {
                side_owners
                    .entry(face.undirected_key())
                    .or_default()
                    .push((element, side));
            }
        }
    }

    let mut neighbors = vec![[None; 4]; connectivity.len()];
    for owners in side_owners.values() {
        if let [(e1, s1), (e2, s2)] = owners.as_slice() {
            neighbors[*e1][*s1] = Some(*e2);
            neighbors[*e2][*s2] = Some(*e1);
        }
    }
    neighbors
}
