use serde::{Deserialize, Serialize};

use crate::finite_volume::unknowns::{IdealGas, Primitive, Q};
use crate::mesh::geometry::cell_centroids;
use crate::mesh::{Mesh, Point2D};

/// Initial data, sampled at the cell centroids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialCondition {
    Uniform(Primitive),
    /// Four constant states, one per quadrant around `center`. Points on a
    /// dividing line go to the first of bottom left, bottom right, top right,
    /// top left that contains them.
    Quadrants {
        center: Point2D,
        bottom_left: Primitive,
        bottom_right: Primitive,
        top_right: Primitive,
        top_left: Primitive,
    },
}

impl Default for InitialCondition {
    fn default() -> Self {
        riemann_quadrants()
    }
}

/// The four-quadrant Riemann problem on the unit square.
pub fn riemann_quadrants() -> InitialCondition {
    InitialCondition::Quadrants {
        center: Point2D { x: 0.5, y: 0.5 },
        bottom_left: Primitive {
            rho: 0.1379928,
            vx: 1.2060454,
            vy: 1.2060454,
            p: 0.0290323,
        },
        bottom_right: Primitive {
            rho: 0.5322581,
            vx: 0.,
            vy: 1.2060454,
            p: 0.3,
        },
        top_right: Primitive {
            rho: 1.5,
            vx: 0.,
            vy: 0.,
            p: 1.5,
        },
        top_left: Primitive {
            rho: 0.5322581,
            vx: 1.2060454,
            vy: 0.,
            p: 0.3,
        },
    }
}

impl InitialCondition {
    pub fn primitive_at(&self, point: &Point2D) -> &Primitive {
        match self {
            InitialCondition::Uniform(w) => w,
            InitialCondition::Quadrants {
                center,
                bottom_left,
                bottom_right,
                top_right,
                top_left,
            } => {
                if point.y <= center.y {
                    if point.x <= center.x {
                        bottom_left
                    } else {
                        bottom_right
                    }
                } else if point.x >= center.x {
                    top_right
                } else {
                    top_left
                }
            }
        }
    }

    /// Every primitive state this condition can produce.
    pub fn states(&self) -> Vec<&Primitive> {
        match self {
            InitialCondition::Uniform(w) => vec![w],
            InitialCondition::Quadrants {
                bottom_left,
                bottom_right,
                top_right,
                top_left,
                ..
            } => vec![bottom_left, bottom_right, top_right, top_left],
        }
    }

    /// One conservative state per cell, in cell order.
    pub fn evaluate(&self, gas: &IdealGas, mesh: &Mesh) -> Vec<Q> {
        cell_centroids(mesh.cells(), mesh.node_coordinates())
            .iter()
            .map(|centroid| gas.to_conserved(self.primitive_at(centroid)))
            .collect()
    }
}
