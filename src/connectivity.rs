use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Element connectivity: the global vertex indices of an element and its faces.
pub trait Connectivity: Clone {
    type FaceConnectivity: Connectivity;

    fn num_faces(&self) -> usize;
    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity>;

    fn vertex_indices(&self) -> &[usize];
}

impl Connectivity for () {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &[]
    }
}

/// Connectivity of a quadratic line segment `[start, midpoint, end]` embedded in 2D.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment3d2Connectivity(pub [usize; 3]);

impl Segment3d2Connectivity {
    /// A key identifying the segment regardless of its orientation.
    pub fn undirected_key(&self) -> [usize; 2] {
        let [a, _, b] = self.0;
        [a.min(b), a.max(b)]
    }
}

impl Connectivity for Segment3d2Connectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Local node indices of the four sides of a Quad9 element.
///
/// Each side is ordered `[start, midpoint, end]`, traversing the element boundary
/// counter-clockwise.
pub const QUAD9_SIDE_NODES: [[usize; 3]; 4] = [[0, 4, 1], [1, 5, 2], [2, 6, 3], [3, 7, 0]];

/// Connectivity of a biquadratic quadrilateral.
///
/// The first four vertices are the corners in counter-clockwise order, followed by the
/// midpoints of the sides 0-1, 1-2, 2-3 and 3-0, and finally the center vertex.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad9d2Connectivity(pub [usize; 9]);

impl Deref for Quad9d2Connectivity {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Connectivity for Quad9d2Connectivity {
    type FaceConnectivity = Segment3d2Connectivity;

    fn num_faces(&self) -> usize {
        4
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let v = &self.0;
        QUAD9_SIDE_NODES
            .get(index)
            .map(|&[a, m, b]| Segment3d2Connectivity([v[a], v[m], v[b]]))
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}
