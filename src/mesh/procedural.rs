//! Basic procedural mesh generation routines.
use crate::connectivity::Quad9d2Connectivity;
use crate::mesh::{BoundaryId, Mesh};
use crate::nalgebra::Point2;
use crate::Real;

/// Boundary id of the bottom side (`y = y0`) of a rectangular mesh.
pub const BOTTOM: BoundaryId = 0;
/// Boundary id of the right side (`x = x1`) of a rectangular mesh.
pub const RIGHT: BoundaryId = 1;
/// Boundary id of the top side (`y = y1`) of a rectangular mesh.
pub const TOP: BoundaryId = 2;
/// Boundary id of the left side (`x = x0`) of a rectangular mesh.
pub const LEFT: BoundaryId = 3;

/// Generates a uniform mesh of `nx * ny` Quad9 elements on the rectangle
/// `[x0, x1] x [y0, y1]`.
///
/// Exterior sides are tagged [`BOTTOM`], [`RIGHT`], [`TOP`] and [`LEFT`]. Elements are numbered
/// row by row starting at the bottom left corner.
///
/// # Panics
///
/// Panics if `nx` or `ny` is zero.
pub fn create_rectangular_quad9_mesh<T>(nx: usize, ny: usize, [x0, x1]: [T; 2], [y0, y1]: [T; 2]) -> Mesh<T>
where
    T: Real,
{
    assert!(nx > 0 && ny > 0, "Mesh must have at least one element in each direction");

    // Vertex grid including edge midpoints and element centers
    let num_vertices_x = 2 * nx + 1;
    let num_vertices_y = 2 * ny + 1;
    let to_global_vertex_index = |i: usize, j: usize| num_vertices_x * j + i;

    let to_t = |n: usize| T::from_usize(n).expect("Must be able to fit usize in T");
    let hx = (x1 - x0) / to_t(num_vertices_x - 1);
    let hy = (y1 - y0) / to_t(num_vertices_y - 1);

    let mut vertices = Vec::with_capacity(num_vertices_x * num_vertices_y);
    for j in 0..num_vertices_y {
        for i in 0..num_vertices_x {
            vertices.push(Point2::new(x0 + to_t(i) * hx, y0 + to_t(j) * hy));
        }
    }

    let mut connectivity = Vec::with_capacity(nx * ny);
    for ey in 0..ny {
        for ex in 0..nx {
            let (i, j) = (2 * ex, 2 * ey);
            let v = to_global_vertex_index;
            connectivity.push(Quad9d2Connectivity([
                v(i, j),
                v(i + 2, j),
                v(i + 2, j + 2),
                v(i, j + 2),
                v(i + 1, j),
                v(i + 2, j + 1),
                v(i + 1, j + 2),
                v(i, j + 1),
                v(i + 1, j + 1),
            ]));
        }
    }

    let mut mesh = Mesh::from_vertices_and_connectivity_unchecked(vertices, connectivity);
    for ex in 0..nx {
        mesh.set_boundary_id(ex, 0, BOTTOM);
        mesh.set_boundary_id((ny - 1) * nx + ex, 2, TOP);
    }
    for ey in 0..ny {
        mesh.set_boundary_id(ey * nx + nx - 1, 1, RIGHT);
        mesh.set_boundary_id(ey * nx, 3, LEFT);
    }
    mesh
}
