use crate::error::MeshError;
use crate::mesh::cell_group::CellGroup;
use crate::mesh::reference_element::{ElemShape, ReferenceElement};
use crate::mesh::Point2D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn unit_square() -> Bounds {
        Bounds {
            x_min: 0.,
            x_max: 1.,
            y_min: 0.,
            y_max: 1.,
        }
    }
}

/// A structured `nx` by `ny` mesh of a rectangle.
///
/// Quadrilateral cells are listed row by row, counter-clockwise from their
/// lower left corner. Triangular cells split each quadrilateral along its
/// lower-left to upper-right diagonal. The boundary groups `bottom`, `right`,
/// `top` and `left` walk the rectangle counter-clockwise, so each boundary edge
/// has the same direction as the edge of the cell it belongs to.
pub fn rectangle(
    nx: usize,
    ny: usize,
    bounds: Bounds,
    shape: ElemShape,
) -> Result<(Vec<Point2D>, Vec<CellGroup>), MeshError> {
    let split_quads = match shape {
        ElemShape::Quadrilateral => false,
        ElemShape::Triangle => true,
        ElemShape::Line => {
            return Err(MeshError::WrongDimension {
                group: "inside".to_string(),
                expected: 2,
                found: 1,
            })
        }
    };
    let node = |i: usize, j: usize| j * (nx + 1) + i;

    let dx = (bounds.x_max - bounds.x_min) / nx as f64;
    let dy = (bounds.y_max - bounds.y_min) / ny as f64;
    let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            nodes.push(Point2D {
                x: bounds.x_min + i as f64 * dx,
                y: bounds.y_min + j as f64 * dy,
            });
        }
    }

    let mut cell_ids = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let (a, b, c, d) = (node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1));
            if split_quads {
                cell_ids.extend_from_slice(&[a, b, c, a, c, d]);
            } else {
                cell_ids.extend_from_slice(&[a, b, c, d]);
            }
        }
    }

    let bottom = (0..nx).flat_map(|i| vec![node(i, 0), node(i + 1, 0)]).collect();
    let right = (0..ny).flat_map(|j| vec![node(nx, j), node(nx, j + 1)]).collect();
    let top = (0..nx).flat_map(|i| vec![node(i + 1, ny), node(i, ny)]).collect();
    let left = (0..ny).flat_map(|j| vec![node(0, j + 1), node(0, j)]).collect();

    let line = ReferenceElement::new(ElemShape::Line, 1)?;
    let groups = vec![
        CellGroup::new(ReferenceElement::new(shape, 1)?, cell_ids, 1, "inside")?,
        CellGroup::new(line.clone(), bottom, 2, "bottom")?,
        CellGroup::new(line.clone(), right, 3, "right")?,
        CellGroup::new(line.clone(), top, 4, "top")?,
        CellGroup::new(line, left, 5, "left")?,
    ];
    Ok((nodes, groups))
}

/// The unit square used by the four-quadrant Riemann benchmark.
pub fn riemann_square(n: usize, shape: ElemShape) -> Result<(Vec<Point2D>, Vec<CellGroup>), MeshError> {
    rectangle(n, n, Bounds::unit_square(), shape)
}
