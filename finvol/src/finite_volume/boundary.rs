use serde::{Deserialize, Serialize};

use crate::finite_volume::unknowns::{IdealGas, Primitive, Q};
use crate::mesh::geometry::Vec2;

/// What lies beyond a boundary group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryCondition {
    /// Characteristic outflow against the interior state itself. Every branch
    /// then reproduces the interior state.
    Outflow,
    /// Characteristic outflow against a fixed far-field state.
    Farfield(Primitive),
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition::Outflow
    }
}

impl BoundaryCondition {
    pub fn farfield_state(&self, gas: &IdealGas) -> Option<Q> {
        match self {
            BoundaryCondition::Outflow => None,
            BoundaryCondition::Farfield(w) => Some(gas.to_conserved(w)),
        }
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        match self {
            BoundaryCondition::Outflow => None,
            BoundaryCondition::Farfield(w) => Some(w),
        }
    }
}

/// The ghost state seen through a boundary face with outward unit normal
/// `normal`, chosen by the sign of the interior normal velocity and whether
/// it is supersonic.
///
/// | inflow / outflow | supersonic                  | subsonic                                       |
/// |------------------|-----------------------------|------------------------------------------------|
/// | inflow           | far field                   | far-field density and momentum, interior energy |
/// | outflow          | interior                    | interior density and momentum, far-field energy |
pub fn outflow_boundary_state(gas: &IdealGas, interior: &Q, farfield: &Q, normal: &Vec2) -> Q {
    let p = gas.pressure(interior);
    let a = gas.sound_speed(interior.rho, p);
    let v_n = interior.normal_velocity(normal);

    if v_n < 0. {
        if -v_n > a {
            *farfield
        } else {
            Q {
                E: interior.E,
                ..*farfield
            }
        }
    } else if v_n > a {
        *interior
    } else {
        Q {
            E: farfield.E,
            ..*interior
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gas() -> IdealGas {
        IdealGas::default()
    }

    // a = 1
    fn interior(vx: f64) -> Q {
        gas().to_conserved(&Primitive {
            rho: 1.4,
            vx,
            vy: 0.25,
            p: 1.,
        })
    }

    fn farfield() -> Q {
        gas().to_conserved(&Primitive {
            rho: 0.9,
            vx: 0.1,
            vy: -0.2,
            p: 0.7,
        })
    }

    const EAST: Vec2 = Vec2 { x: 1., y: 0. };

    #[test]
    fn test_supersonic_inflow_takes_farfield() {
        let ghost = outflow_boundary_state(&gas(), &interior(-1.5), &farfield(), &EAST);
        assert_eq!(ghost, farfield());
    }

    #[test]
    fn test_subsonic_inflow_keeps_interior_energy() {
        let u = interior(-0.5);
        let ghost = outflow_boundary_state(&gas(), &u, &farfield(), &EAST);
        let expected = Q { E: u.E, ..farfield() };
        assert_eq!(ghost, expected);
    }

    #[test]
    fn test_supersonic_outflow_takes_interior() {
        let u = interior(1.5);
        let ghost = outflow_boundary_state(&gas(), &u, &farfield(), &EAST);
        assert_eq!(ghost, u);
    }

    #[test]
    fn test_subsonic_outflow_takes_farfield_energy() {
        let u = interior(0.5);
        let ghost = outflow_boundary_state(&gas(), &u, &farfield(), &EAST);
        let expected = Q {
            E: farfield().E,
            ..u
        };
        assert_eq!(ghost, expected);

        let at_rest = interior(0.);
        let ghost = outflow_boundary_state(&gas(), &at_rest, &farfield(), &EAST);
        assert_eq!(ghost.rho_u, at_rest.rho_u);
        assert_eq!(ghost.E, farfield().E);
    }

    #[test]
    fn test_interior_farfield_is_transparent() {
        for &vx in &[-2., -0.5, 0., 0.5, 2.] {
            let u = interior(vx);
            assert_eq!(outflow_boundary_state(&gas(), &u, &u, &EAST), u);
        }
    }

    #[test]
    fn test_condition_from_json() {
        let condition: BoundaryCondition = serde_json::from_str(r#"{"type": "outflow"}"#).unwrap();
        assert_eq!(condition, BoundaryCondition::Outflow);
        assert_eq!(condition.farfield_state(&gas()), None);

        let condition: BoundaryCondition =
            serde_json::from_str(r#"{"type": "farfield", "rho": 1.0, "vx": 0.5, "vy": 0.0, "p": 1.0}"#)
                .unwrap();
        let farfield = condition.farfield_state(&gas()).unwrap();
        assert_eq!(farfield.rho, 1.);
        assert_eq!(farfield.rho_u, 0.5);
    }
}
