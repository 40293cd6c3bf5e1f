use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::info;

use crate::error::MeshError;

pub mod cell_group;
pub mod generators;
pub mod geometry;
pub mod grid;
pub mod reference_element;

use self::cell_group::CellGroup;
use self::grid::{assemble_faces, Face, FaceAssembly, FaceMap, Strictness, TopologyReport, INTERIOR};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Holds the geometric support of a simulation: the node table, the single
/// group of 2D cells, the 1D boundary groups and the faces between them.
///
/// Everything here is fixed once the mesh is built.
#[derive(Debug)]
pub struct Mesh {
    nodes: Vec<Point2D>,
    cells: CellGroup,
    boundaries: Vec<CellGroup>,
    faces: FaceMap,
    report: TopologyReport,
}

impl Mesh {
    pub fn new(
        nodes: Vec<Point2D>,
        groups: Vec<CellGroup>,
        strictness: Strictness,
    ) -> Result<Mesh, MeshError> {
        let mut names = BTreeSet::new();
        for group in &groups {
            group.check_node_range(nodes.len())?;
            if !names.insert(group.name.as_str()) {
                return Err(MeshError::DuplicateGroupName(group.name.clone()));
            }
        }

        let (mut cells, boundaries): (Vec<CellGroup>, Vec<CellGroup>) =
            groups.into_iter().partition(|group| group.topo_dim() == 2);
        if cells.len() != 1 {
            return Err(MeshError::CellGroupCount(cells.len()));
        }
        let cells = cells.remove(0);

        let FaceAssembly { faces, report } = {
            let boundary_refs: Vec<&CellGroup> = boundaries.iter().collect();
            assemble_faces(&cells, &boundary_refs, strictness)?
        };

        if strictness == Strictness::Strict {
            let volumes = geometry::cell_volumes(&cells, &nodes);
            if let Some((cell, &volume)) = volumes.iter().enumerate().find(|(_, v)| **v <= 0.) {
                return Err(MeshError::NonPositiveVolume { cell, volume });
            }
        }

        let mesh = Mesh {
            nodes,
            cells,
            boundaries,
            faces,
            report,
        };
        info!(
            "mesh: {} nodes, {} cells, {} interior faces, {} boundary faces in {} groups",
            mesh.nodes.len(),
            mesh.cells.len(),
            mesh.report.interior_faces,
            mesh.report.boundary_faces,
            mesh.boundaries.len()
        );
        Ok(mesh)
    }

    pub fn node_coordinates(&self) -> &[Point2D] {
        &self.nodes
    }

    /// The 2D cells. State arrays follow this group's row order.
    pub fn cells(&self) -> &CellGroup {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn boundary_groups(&self) -> &[CellGroup] {
        &self.boundaries
    }

    pub fn faces(&self) -> &FaceMap {
        &self.faces
    }

    pub fn interior_faces(&self) -> &[Face] {
        self.faces
            .get(INTERIOR)
            .map(|faces| faces.as_slice())
            .unwrap_or(&[])
    }

    /// Face lists of the boundary groups, by name.
    pub fn boundary_faces(&self) -> impl Iterator<Item = (&str, &[Face])> {
        self.faces
            .iter()
            .filter(|(name, _)| name.as_str() != INTERIOR)
            .map(|(name, faces)| (name.as_str(), faces.as_slice()))
    }

    pub fn topology_report(&self) -> &TopologyReport {
        &self.report
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "> 2D cell group:")?;
        writeln!(f, " :: {}", self.cells)?;
        writeln!(f, "> 1D cell groups:")?;
        for group in &self.boundaries {
            writeln!(f, " :: {}", group)?;
        }
        writeln!(f, " > {} nodes", self.nodes.len())?;
        writeln!(f, "> Face lists:")?;
        for (name, faces) in &self.faces {
            writeln!(f, "  [{}] {} faces", name, faces.len())?;
        }
        Ok(())
    }
}
