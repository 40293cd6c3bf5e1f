use rulinalg::vector::Vector;
use std::collections::BTreeMap;

use crate::mesh::cell_group::CellGroup;
use crate::mesh::grid::FaceMap;
use crate::mesh::{Mesh, Point2D};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XYTuple<T> {
    pub x: T,
    pub y: T,
}

pub type Vec2 = XYTuple<f64>;

impl Vec2 {
    pub fn between(from: &Point2D, to: &Point2D) -> Vec2 {
        Vec2 {
            x: to.x - from.x,
            y: to.y - from.y,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// The tangent rotated clockwise, `(dy, -dx)`. For an edge of a
    /// counter-clockwise polygon this points out of the polygon.
    pub fn rotate_cw(&self) -> Vec2 {
        Vec2 {
            x: self.y,
            y: -self.x,
        }
    }
}

/// Signed areas of the cells, by the divergence theorem over their edges.
///
/// Counter-clockwise cells get a positive area, clockwise cells a negative one.
pub fn cell_volumes(cells: &CellGroup, nodes: &[Point2D]) -> Vector<f64> {
    (0..cells.len())
        .map(|cell| {
            cells
                .element_edges(cell)
                .map(|[a, b]| {
                    let (p, q) = (&nodes[a], &nodes[b]);
                    let n = Vec2::between(p, q).rotate_cw();
                    let x_mid = 0.5 * (p.x + q.x);
                    let y_mid = 0.5 * (p.y + q.y);
                    0.5 * (x_mid * n.x + y_mid * n.y)
                })
                .sum::<f64>()
        })
        .collect()
}

/// Vertex averages of the cells.
pub fn cell_centroids(cells: &CellGroup, nodes: &[Point2D]) -> Vec<Point2D> {
    cells
        .elements()
        .map(|element| {
            let n = element.len() as f64;
            let (x, y) = element
                .iter()
                .fold((0., 0.), |(x, y), &i| (x + nodes[i].x, y + nodes[i].y));
            Point2D { x: x / n, y: y / n }
        })
        .collect()
}

/// Unit normals `(dy, -dx) / |d|` of each face, for the edge from `nodes[0]`
/// to `nodes[1]`.
pub fn face_normals(faces: &FaceMap, nodes: &[Point2D]) -> BTreeMap<String, Vec<Vec2>> {
    faces
        .iter()
        .map(|(name, group)| {
            let normals: Vec<Vec2> = group
                .iter()
                .map(|face| {
                    let d = Vec2::between(&nodes[face.nodes[0]], &nodes[face.nodes[1]]);
                    let inv_norm = 1. / d.norm();
                    Vec2 {
                        x: inv_norm * d.y,
                        y: -inv_norm * d.x,
                    }
                })
                .collect();
            (name.clone(), normals)
        })
        .collect()
}

pub fn face_lengths(faces: &FaceMap, nodes: &[Point2D]) -> BTreeMap<String, Vector<f64>> {
    faces
        .iter()
        .map(|(name, group)| {
            let lengths: Vector<f64> = group
                .iter()
                .map(|face| Vec2::between(&nodes[face.nodes[0]], &nodes[face.nodes[1]]).norm())
                .collect();
            (name.clone(), lengths)
        })
        .collect()
}

/// Everything the time integrator needs to know about the mesh geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub volumes: Vector<f64>,
    pub normals: BTreeMap<String, Vec<Vec2>>,
    pub lengths: BTreeMap<String, Vector<f64>>,
}

impl Metrics {
    pub fn new(mesh: &Mesh) -> Metrics {
        let nodes = mesh.node_coordinates();
        Metrics {
            volumes: cell_volumes(mesh.cells(), nodes),
            normals: face_normals(mesh.faces(), nodes),
            lengths: face_lengths(mesh.faces(), nodes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::generators::riemann_square;
    use crate::mesh::grid::{Face, Strictness, INTERIOR};
    use crate::mesh::reference_element::{ElemShape, ReferenceElement};
    use approx::assert_relative_eq;

    fn square_nodes() -> Vec<Point2D> {
        vec![
            Point2D { x: 0., y: 0. },
            Point2D { x: 2., y: 0. },
            Point2D { x: 2., y: 1. },
            Point2D { x: 0., y: 1. },
        ]
    }

    fn group(shape: ElemShape, node_ids: Vec<usize>) -> CellGroup {
        let reference = ReferenceElement::new(shape, 1).unwrap();
        CellGroup::new(reference, node_ids, 1, "inside").unwrap()
    }

    #[test]
    fn test_quadrilateral_volume() {
        let quads = group(ElemShape::Quadrilateral, vec![0, 1, 2, 3]);
        let volumes = cell_volumes(&quads, &square_nodes());
        assert_relative_eq!(volumes[0], 2.);
    }

    #[test]
    fn test_triangle_volumes() {
        let tris = group(ElemShape::Triangle, vec![0, 1, 2, 0, 2, 3]);
        let volumes = cell_volumes(&tris, &square_nodes());
        assert_relative_eq!(volumes[0], 1.);
        assert_relative_eq!(volumes[1], 1.);
    }

    #[test]
    fn test_clockwise_volume_is_negative() {
        let tris = group(ElemShape::Triangle, vec![0, 2, 1]);
        let volumes = cell_volumes(&tris, &square_nodes());
        assert_relative_eq!(volumes[0], -1.);
    }

    #[test]
    fn test_volume_away_from_origin() {
        let nodes: Vec<Point2D> = square_nodes()
            .iter()
            .map(|p| Point2D {
                x: p.x + 10.,
                y: p.y - 7.,
            })
            .collect();
        let quads = group(ElemShape::Quadrilateral, vec![0, 1, 2, 3]);
        assert_relative_eq!(cell_volumes(&quads, &nodes)[0], 2., epsilon = 1e-12);
    }

    #[test]
    fn test_centroid() {
        let quads = group(ElemShape::Quadrilateral, vec![0, 1, 2, 3]);
        let centroids = cell_centroids(&quads, &square_nodes());
        assert_relative_eq!(centroids[0].x, 1.);
        assert_relative_eq!(centroids[0].y, 0.5);
    }

    #[test]
    fn test_normals_and_lengths() {
        let mut faces = FaceMap::new();
        faces.insert(
            INTERIOR.to_string(),
            vec![
                Face {
                    adj_cell: [0, 1],
                    nodes: [0, 1],
                },
                Face {
                    adj_cell: [0, 1],
                    nodes: [1, 3],
                },
            ],
        );
        let nodes = square_nodes();
        let normals = face_normals(&faces, &nodes);
        let lengths = face_lengths(&faces, &nodes);

        // bottom edge, walked left to right, faces down
        assert_eq!(normals[INTERIOR][0], Vec2 { x: 0., y: -1. });
        assert_relative_eq!(lengths[INTERIOR][0], 2.);

        let diagonal = normals[INTERIOR][1];
        assert_relative_eq!(diagonal.norm(), 1., epsilon = 1e-15);
        assert_relative_eq!(diagonal.x, 1. / 5f64.sqrt(), epsilon = 1e-15);
        assert_relative_eq!(diagonal.y, 2. / 5f64.sqrt(), epsilon = 1e-15);
        assert_relative_eq!(lengths[INTERIOR][1], 5f64.sqrt());
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let (nodes, groups) = riemann_square(3, ElemShape::Triangle).unwrap();
        let mesh = Mesh::new(nodes, groups, Strictness::Strict).unwrap();
        let nodes = mesh.node_coordinates();

        let first = cell_volumes(mesh.cells(), nodes);
        assert_eq!(first, cell_volumes(mesh.cells(), nodes));
        assert_that!(first).all_positive();
        assert_that!(first).sums_to(1., 1e-14);

        let normals = face_normals(mesh.faces(), nodes);
        assert_eq!(normals, face_normals(mesh.faces(), nodes));
        let lengths = face_lengths(mesh.faces(), nodes);
        assert_eq!(lengths, face_lengths(mesh.faces(), nodes));
        for group in lengths.values() {
            assert_that!(*group).all_finite();
        }

        assert_eq!(Metrics::new(&mesh), Metrics::new(&mesh));
    }
}
