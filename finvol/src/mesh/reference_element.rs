use rulinalg::matrix::Matrix;
use std::fmt;

use crate::error::MeshError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElemShape {
    Line,
    Triangle,
    Quadrilateral,
}

impl fmt::Display for ElemShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ElemShape::Line => "LINE",
            ElemShape::Triangle => "TRI",
            ElemShape::Quadrilateral => "QUAD",
        };
        write!(f, "{}", name)
    }
}

/// A sub-entity of a reference element, given by local node indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalEntity {
    pub shape: ElemShape,
    pub degree: usize,
    pub nodes: Vec<usize>,
}

impl TopologicalEntity {
    fn new(shape: ElemShape, degree: usize, nodes: &[usize]) -> TopologicalEntity {
        TopologicalEntity {
            shape,
            degree,
            nodes: nodes.to_vec(),
        }
    }
}

impl fmt::Display for TopologicalEntity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}, deg={}, nodes={:?}]", self.shape, self.degree, self.nodes)
    }
}

/// Canonical decomposition of an element shape into sub-entities.
///
/// Edges of 2D shapes are listed counter-clockwise, each as a (start, end) pair
/// of local node indices. Two elements sharing an edge therefore list it in
/// opposite directions, which is what face assembly relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceElement {
    shape: ElemShape,
    degree: usize,
    topo_dim: usize,
    // indexed by dimension, 0..=3
    entities: [Vec<TopologicalEntity>; 4],
    coordinates: Matrix<f64>,
}

impl ReferenceElement {
    pub fn new(shape: ElemShape, degree: usize) -> Result<ReferenceElement, MeshError> {
        match (shape, degree) {
            (ElemShape::Line, 1) => Ok(ReferenceElement::line_p1()),
            (ElemShape::Triangle, 1) => Ok(ReferenceElement::triangle_p1()),
            (ElemShape::Quadrilateral, 1) => Ok(ReferenceElement::quadrilateral_p1()),
            _ => Err(MeshError::UnknownElement { shape, degree }),
        }
    }

    fn line_p1() -> ReferenceElement {
        ReferenceElement {
            shape: ElemShape::Line,
            degree: 1,
            topo_dim: 1,
            entities: [
                vec![],
                vec![TopologicalEntity::new(ElemShape::Line, 1, &[0, 1])],
                vec![],
                vec![],
            ],
            coordinates: Matrix::new(2, 1, vec![-1., 1.]),
        }
    }

    fn triangle_p1() -> ReferenceElement {
        let edge = |a, b| TopologicalEntity::new(ElemShape::Line, 1, &[a, b]);
        ReferenceElement {
            shape: ElemShape::Triangle,
            degree: 1,
            topo_dim: 2,
            entities: [
                vec![],
                vec![edge(0, 1), edge(1, 2), edge(2, 0)],
                vec![TopologicalEntity::new(ElemShape::Triangle, 1, &[0, 1, 2])],
                vec![],
            ],
            coordinates: Matrix::new(3, 2, vec![-1., -1., 1., -1., -1., 1.]),
        }
    }

    fn quadrilateral_p1() -> ReferenceElement {
        let edge = |a, b| TopologicalEntity::new(ElemShape::Line, 1, &[a, b]);
        ReferenceElement {
            shape: ElemShape::Quadrilateral,
            degree: 1,
            topo_dim: 2,
            entities: [
                vec![],
                vec![edge(0, 1), edge(1, 2), edge(2, 3), edge(3, 0)],
                vec![TopologicalEntity::new(
                    ElemShape::Quadrilateral,
                    1,
                    &[0, 1, 2, 3],
                )],
                vec![],
            ],
            coordinates: Matrix::new(4, 2, vec![-1., -1., 1., -1., 1., 1., -1., 1.]),
        }
    }

    pub fn shape(&self) -> ElemShape {
        self.shape
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn topo_dim(&self) -> usize {
        self.topo_dim
    }

    /// Number of nodes of one element.
    pub fn num_nodes(&self) -> usize {
        self.entities[self.topo_dim][0].nodes.len()
    }

    pub fn num_entities(&self, dim: usize) -> usize {
        self.entities(dim).len()
    }

    pub fn entity(&self, dim: usize, index: usize) -> &TopologicalEntity {
        &self.entities[dim][index]
    }

    pub fn entities(&self, dim: usize) -> &[TopologicalEntity] {
        self.entities.get(dim).map(|e| e.as_slice()).unwrap_or(&[])
    }

    /// Node coordinates on the reference domain, one row per node.
    pub fn coordinates(&self) -> &Matrix<f64> {
        &self.coordinates
    }
}

impl fmt::Display for ReferenceElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}_P{}", self.shape, self.degree)
    }
}
