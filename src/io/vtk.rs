//! Export of meshes and nodal fields to legacy VTK files.
use crate::connectivity::{Connectivity, Quad9d2Connectivity};
use crate::mesh::Mesh;
use crate::nalgebra::{try_convert, DVector};
use crate::system::Solution;
use crate::Real;
use eyre::{eyre, WrapErr};
use std::fs::create_dir_all;
use std::path::Path;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, CellType, Cells, DataSet, Piece, UnstructuredGridPiece, Version, VertexNumbers,
    Vtk,
};

/// Represents connectivity that is supported by VTK.
pub trait VtkCellConnectivity: Connectivity {
    fn num_nodes(&self) -> usize {
        self.vertex_indices().len()
    }

    fn cell_type(&self) -> CellType;

    /// Writes the VTK ordering of the cell vertices.
    ///
    /// Panics if `connectivity.len() != self.num_nodes()`.
    fn write_vtk_connectivity(&self, connectivity: &mut [usize]) {
        assert_eq!(connectivity.len(), self.vertex_indices().len());
        connectivity.clone_from_slice(self.vertex_indices());
    }
}

impl VtkCellConnectivity for Quad9d2Connectivity {
    // Legacy VTK readers handle the serendipity quad more reliably than the biquadratic one,
    // so the center vertex is dropped
    fn num_nodes(&self) -> usize {
        8
    }

    fn cell_type(&self) -> CellType {
        CellType::QuadraticQuad
    }

    fn write_vtk_connectivity(&self, connectivity: &mut [usize]) {
        assert_eq!(connectivity.len(), self.num_nodes());
        // Corners followed by side midpoints is also the VTK ordering
        connectivity.clone_from_slice(&self.vertex_indices()[0..8]);
    }
}

/// Builds a VTK data set from a mesh and named nodal fields.
#[derive(Debug)]
pub struct FiniteElementMeshDataSetBuilder<'a, T: Real> {
    mesh: &'a Mesh<T>,
    point_attributes: Vec<(String, usize, Vec<f64>)>,
    // Only used for exporting directly to file
    title: Option<String>,
}

impl<'a, T: Real> FiniteElementMeshDataSetBuilder<'a, T> {
    pub fn from_mesh(mesh: &'a Mesh<T>) -> Self {
        Self {
            mesh,
            point_attributes: Vec::new(),
            title: None,
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..self
        }
    }

    /// Attaches a field with `num_components` values per vertex, stored vertex by vertex.
    pub fn with_point_scalar_attributes(
        mut self,
        name: impl Into<String>,
        num_components: usize,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        let values = values.into_iter().map(to_f64).collect();
        self.point_attributes
            .push((name.into(), num_components, values));
        self
    }

    /// Attaches the displacement components `u` and `v` and the displacement vector.
    pub fn with_solution(self, solution: &Solution<T>) -> Self {
        let displacement: Vec<_> = solution
            .u
            .iter()
            .zip(solution.v.iter())
            .flat_map(|(&u, &v)| [u, v, T::zero()])
            .collect();
        self.with_nodal_field("u", &solution.u)
            .with_nodal_field("v", &solution.v)
            .with_point_scalar_attributes("displacement", 3, displacement)
    }

    pub fn with_nodal_field(self, name: impl Into<String>, values: &DVector<T>) -> Self {
        self.with_point_scalar_attributes(name, 1, values.iter().copied())
    }

    pub fn try_build(&self) -> eyre::Result<DataSet> {
        let num_vertices = self.mesh.num_vertices();
        let mut points = Vec::with_capacity(3 * num_vertices);
        for v in self.mesh.vertices() {
            points.extend([to_f64(v.x), to_f64(v.y), 0.0]);
        }

        // Vertices is laid out as follows: N, i_1, i_2, ... i_N,
        // so for quadratic quads this becomes 8 followed by the eight vertex indices
        let mut vertices = Vec::new();
        let mut cell_types = Vec::new();
        let mut vertex_indices = Vec::new();
        for cell in self.mesh.connectivity() {
            vertices.push(u32::try_from(cell.num_nodes())?);

            vertex_indices.clear();
            vertex_indices.resize(cell.num_nodes(), 0);
            cell.write_vtk_connectivity(&mut vertex_indices);

            for &idx in &vertex_indices {
                vertices.push(u32::try_from(idx).wrap_err("Vertex index does not fit in VTK index type")?);
            }
            cell_types.push(cell.cell_type());
        }

        let mut data = Attributes::new();
        for (name, num_components, values) in &self.point_attributes {
            if values.len() != num_components * num_vertices {
                return Err(eyre!(
                    "Attribute {} has {} values, expected {} per vertex for {} vertices",
                    name,
                    values.len(),
                    num_components,
                    num_vertices
                ));
            }
            data.point.push(
                Attribute::scalars(name.clone(), u32::try_from(*num_components)?).with_data(values.clone()),
            );
        }

        let piece = UnstructuredGridPiece {
            points: points.into(),
            cells: Cells {
                cell_verts: VertexNumbers::Legacy {
                    num_cells: u32::try_from(self.mesh.num_elements())?,
                    vertices,
                },
                types: cell_types,
            },
            data,
        };

        Ok(DataSet::UnstructuredGrid {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        })
    }

    /// Convenience function for directly exporting the dataset to a file.
    ///
    /// Missing parent directories are created.
    pub fn try_export(&self, filename: impl AsRef<Path>) -> eyre::Result<()> {
        let filepath = filename.as_ref();
        let fallback_title = filepath
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let dataset = self.try_build()?;

        if let Some(dir) = filepath.parent() {
            create_dir_all(dir).wrap_err_with(|| format!("Failed to create directory {}", dir.display()))?;
        }

        Vtk {
            version: Version { major: 4, minor: 1 },
            // If we don't have a title then just make the filepath the title
            title: self.title.clone().unwrap_or(fallback_title),
            byte_order: ByteOrder::BigEndian,
            data: dataset,
            file_path: None,
        }
        .export(filepath)
        .map_err(|err| eyre!("Failed to export VTK file {}: {:?}", filepath.display(), err))?;
        Ok(())
    }
}

fn to_f64<T: Real>(x: T) -> f64 {
    try_convert(x).unwrap_or(f64::NAN)
}
