use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::MeshError;
use crate::mesh::cell_group::CellGroup;

/// Key of the synthetic face group holding all interior faces.
pub const INTERIOR: &str = "interior";

/// Face groups by name: the interior faces under [`INTERIOR`] plus one list
/// per boundary group.
pub type FaceMap = BTreeMap<String, Vec<Face>>;

/// The edge between two cells, or between a cell and the exterior.
///
/// `adj_cell` holds `[left, right]`, with `-1` for a missing neighbor. The
/// nodes are listed in the direction the left cell traverses the edge, so the
/// normal `(dy, -dx)` of `nodes[0] -> nodes[1]` points from left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub adj_cell: [i32; 2],
    pub nodes: [usize; 2],
}

impl Face {
    pub fn left(&self) -> usize {
        self.adj_cell[0] as usize
    }

    pub fn right(&self) -> Option<usize> {
        if self.adj_cell[1] >= 0 {
            Some(self.adj_cell[1] as usize)
        } else {
            None
        }
    }

    pub fn is_interior(&self) -> bool {
        self.adj_cell[0] >= 0 && self.adj_cell[1] >= 0
    }

    fn key(&self) -> usize {
        self.nodes[0].min(self.nodes[1])
    }

    fn matches_reversed(&self, nodes: [usize; 2]) -> bool {
        self.nodes[0] == nodes[1] && self.nodes[1] == nodes[0]
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Face  [{}, {}]  ({}, {})",
            self.adj_cell[0], self.adj_cell[1], self.nodes[0], self.nodes[1]
        )
    }
}

/// How face assembly treats topology it cannot make sense of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Drop unmatched boundary edges and conflicting interior edges, counting
    /// them in the [`TopologyReport`].
    Lenient,
    /// Reject the mesh on the first unmatched boundary edge or conflicting
    /// interior edge.
    Strict,
}

impl Default for Strictness {
    fn default() -> Self {
        Strictness::Lenient
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TopologyReport {
    pub interior_faces: usize,
    pub boundary_faces: usize,
    /// Boundary edges with no cell edge walked in the same direction.
    pub unmatched_boundary_edges: usize,
    /// Cell edges with no neighbor that no boundary group claims.
    pub open_edges: usize,
    /// Cell edges whose reversed partner was already matched.
    pub duplicate_matches: usize,
    /// Cell edges walked in the same direction by two cells.
    pub orientation_conflicts: usize,
}

impl TopologyReport {
    pub fn is_clean(&self) -> bool {
        self.unmatched_boundary_edges == 0
            && self.open_edges == 0
            && self.duplicate_matches == 0
            && self.orientation_conflicts == 0
    }
}

#[derive(Debug)]
pub struct FaceAssembly {
    pub faces: FaceMap,
    pub report: TopologyReport,
}

#[derive(Debug)]
struct Candidate {
    face: Face,
    claimed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeMatch {
    Reversed(usize),
    Taken(usize),
    SameDirection(usize),
    None,
}

fn find_match(bucket: &[Candidate], nodes: [usize; 2]) -> EdgeMatch {
    let mut result = EdgeMatch::None;
    for (j, candidate) in bucket.iter().enumerate() {
        if candidate.face.matches_reversed(nodes) {
            if candidate.face.adj_cell[1] < 0 {
                return EdgeMatch::Reversed(j);
            }
            result = EdgeMatch::Taken(j);
        } else if candidate.face.nodes == nodes && result == EdgeMatch::None {
            result = EdgeMatch::SameDirection(j);
        }
    }
    result
}

/// Candidate faces bucketed by their smaller node id.
fn assemble_cell_edges(
    cells: &CellGroup,
    strictness: Strictness,
    report: &mut TopologyReport,
) -> Result<BTreeMap<usize, Vec<Candidate>>, MeshError> {
    let mut buckets: BTreeMap<usize, Vec<Candidate>> = BTreeMap::new();
    for cell in 0..cells.len() {
        for nodes in cells.element_edges(cell) {
            let face = Face {
                adj_cell: [cell as i32, -1],
                nodes,
            };
            let bucket = buckets.entry(face.key()).or_insert_with(Vec::new);
            match find_match(bucket, nodes) {
                EdgeMatch::Reversed(j) => {
                    bucket[j].face.adj_cell[1] = cell as i32;
                    continue;
                }
                EdgeMatch::Taken(_) => {
                    if strictness == Strictness::Strict {
                        return Err(MeshError::DuplicateInteriorMatch {
                            a: nodes[0],
                            b: nodes[1],
                            cell,
                        });
                    }
                    debug!("edge {:?} of cell {} is already shared by two cells", nodes, cell);
                    report.duplicate_matches += 1;
                }
                EdgeMatch::SameDirection(j) => {
                    if strictness == Strictness::Strict {
                        return Err(MeshError::InconsistentOrientation {
                            a: nodes[0],
                            b: nodes[1],
                            first: bucket[j].face.left(),
                            second: cell,
                        });
                    }
                    debug!(
                        "edge {:?} walked in the same direction by cells {} and {}",
                        nodes,
                        bucket[j].face.left(),
                        cell
                    );
                    report.orientation_conflicts += 1;
                }
                EdgeMatch::None => {}
            }
            bucket.push(Candidate {
                face,
                claimed: false,
            });
        }
    }
    Ok(buckets)
}

/// Builds the face lists of a mesh.
///
/// Every cell edge is keyed by its smaller global node id. Two cell edges with
/// reversed node order become one interior face. Each boundary edge is then
/// matched against the cell edge walked in the *same* direction, and becomes a
/// boundary face owned by that cell.
pub fn assemble_faces(
    cells: &CellGroup,
    boundaries: &[&CellGroup],
    strictness: Strictness,
) -> Result<FaceAssembly, MeshError> {
    if cells.topo_dim() != 2 {
        return Err(MeshError::WrongDimension {
            group: cells.name.clone(),
            expected: 2,
            found: cells.topo_dim(),
        });
    }

    let mut report = TopologyReport::default();
    let mut buckets = assemble_cell_edges(cells, strictness, &mut report)?;

    let interior: Vec<Face> = buckets
        .values()
        .flat_map(|bucket| bucket.iter())
        .map(|candidate| candidate.face)
        .filter(Face::is_interior)
        .collect();
    report.interior_faces = interior.len();

    let mut faces = FaceMap::new();
    faces.insert(INTERIOR.to_string(), interior);

    for group in boundaries {
        if group.topo_dim() != 1 {
            return Err(MeshError::WrongDimension {
                group: group.name.clone(),
                expected: 1,
                found: group.topo_dim(),
            });
        }
        if faces.contains_key(&group.name) {
            return Err(MeshError::DuplicateGroupName(group.name.clone()));
        }

        let mut group_faces = Vec::with_capacity(group.len());
        for element in 0..group.len() {
            for nodes in group.element_edges(element) {
                let key = nodes[0].min(nodes[1]);
                let owner = buckets.get_mut(&key).and_then(|bucket| {
                    bucket
                        .iter_mut()
                        .find(|candidate| candidate.face.nodes == nodes)
                });
                match owner {
                    Some(candidate) => {
                        candidate.claimed = true;
                        group_faces.push(Face {
                            adj_cell: [candidate.face.adj_cell[0], -1],
                            nodes,
                        });
                    }
                    None => {
                        if strictness == Strictness::Strict {
                            return Err(MeshError::UnmatchedBoundaryEdge {
                                group: group.name.clone(),
                                a: nodes[0],
                                b: nodes[1],
                            });
                        }
                        debug!("boundary edge {:?} of '{}' dropped", nodes, group.name);
                        report.unmatched_boundary_edges += 1;
                    }
                }
            }
        }
        report.boundary_faces += group_faces.len();
        faces.insert(group.name.clone(), group_faces);
    }

    report.open_edges = buckets
        .values()
        .flat_map(|bucket| bucket.iter())
        .filter(|candidate| candidate.face.adj_cell[1] < 0 && !candidate.claimed)
        .count();

    if report.unmatched_boundary_edges > 0 {
        warn!(
            "{} boundary edges matched no cell edge and were dropped",
            report.unmatched_boundary_edges
        );
    }
    if report.open_edges > 0 {
        warn!("{} cell edges have no neighbor and no boundary group", report.open_edges);
    }
    if report.duplicate_matches > 0 || report.orientation_conflicts > 0 {
        warn!(
            "{} edges shared by more than two cells, {} with inconsistent orientation",
            report.duplicate_matches, report.orientation_conflicts
        );
    }

    Ok(FaceAssembly { faces, report })
}
