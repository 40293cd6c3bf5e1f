use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::mesh::geometry::Vec2;

pub trait Unknown:
    Copy
    + Neg<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + fmt::Debug
{
    fn zero() -> Self;

    fn components(&self) -> Vec<f64>;

    fn is_finite(&self) -> bool;
}

#[macro_export]
macro_rules! unknown_from_scalar_fields {
    ($(#[$attr:meta])* $U:ident, $($field:ident),*) => {
        $(#[$attr])*
        #[allow(non_snake_case)]
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $U { $(pub $field: f64, )* }

        impl $crate::finite_volume::unknowns::Unknown for $U {
            fn zero() -> Self {
                $U { $($field: 0., )* }
            }

            fn components(&self) -> Vec<f64> {
                vec![$(self.$field, )*]
            }

            fn is_finite(&self) -> bool {
                true $(&& self.$field.is_finite())*
            }
        }

        impl $U {
            pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> $U {
                $U { $($field: f(self.$field), )* }
            }

            pub fn elemul(&self, rhs: &$U) -> $U {
                $U { $($field: self.$field * rhs.$field, )* }
            }
        }

        impl std::ops::Neg for $U {
            type Output = $U;
            fn neg(self) -> $U {
                $U { $($field: -self.$field, )* }
            }
        }

        impl std::ops::Add for $U {
            type Output = $U;
            fn add(self, rhs: $U) -> $U {
                $U { $($field: self.$field + rhs.$field, )* }
            }
        }

        impl std::ops::Sub for $U {
            type Output = $U;
            fn sub(self, rhs: $U) -> $U {
                $U { $($field: self.$field - rhs.$field, )* }
            }
        }

        impl std::ops::Mul<f64> for $U {
            type Output = $U;
            fn mul(self, rhs: f64) -> $U {
                $U { $($field: self.$field * rhs, )* }
            }
        }

        impl std::ops::AddAssign for $U {
            fn add_assign(&mut self, rhs: $U) {
                $(self.$field += rhs.$field;)*
            }
        }

        impl std::ops::SubAssign for $U {
            fn sub_assign(&mut self, rhs: $U) {
                $(self.$field -= rhs.$field;)*
            }
        }
    }
}

unknown_from_scalar_fields!(
    /// Conservative state of the 2D Euler equations: density, x- and
    /// y-momentum, total energy per unit volume.
    Q, rho, rho_u, rho_v, E
);

impl Q {
    /// Velocity component along `normal`.
    pub fn normal_velocity(&self, normal: &Vec2) -> f64 {
        (self.rho_u * normal.x + self.rho_v * normal.y) / self.rho
    }
}

/// Density, velocity and pressure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub rho: f64,
    pub vx: f64,
    pub vy: f64,
    pub p: f64,
}

/// Calorically perfect gas with a constant ratio of specific heats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealGas {
    pub gamma: f64,
}

impl Default for IdealGas {
    fn default() -> Self {
        IdealGas { gamma: 1.4 }
    }
}

impl IdealGas {
    pub fn new(gamma: f64) -> IdealGas {
        IdealGas { gamma }
    }

    pub fn pressure(&self, q: &Q) -> f64 {
        (self.gamma - 1.) * (q.E - 0.5 * (q.rho_u * q.rho_u + q.rho_v * q.rho_v) / q.rho)
    }

    /// Not guarded: a negative pressure or density gives NaN.
    pub fn sound_speed(&self, rho: f64, p: f64) -> f64 {
        (self.gamma * p / rho).sqrt()
    }

    /// Largest characteristic speed normal to a face,
    /// `max(|v_n|, |v_n - a|, |v_n + a|)`.
    pub fn spectral_radius(&self, q: &Q, normal: &Vec2) -> f64 {
        let a = self.sound_speed(q.rho, self.pressure(q));
        let v_n = q.normal_velocity(normal);
        v_n.abs().max((v_n - a).abs()).max((v_n + a).abs())
    }

    pub fn to_conserved(&self, w: &Primitive) -> Q {
        Q {
            rho: w.rho,
            rho_u: w.rho * w.vx,
            rho_v: w.rho * w.vy,
            E: w.p / (self.gamma - 1.) + 0.5 * w.rho * (w.vx * w.vx + w.vy * w.vy),
        }
    }

    pub fn to_primitive(&self, q: &Q) -> Primitive {
        Primitive {
            rho: q.rho,
            vx: q.rho_u / q.rho,
            vy: q.rho_v / q.rho,
            p: self.pressure(q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_arithmetic() {
        let a = Q {
            rho: 1.,
            rho_u: 2.,
            rho_v: 3.,
            E: 4.,
        };
        let mut b = a * 2. - a;
        assert_eq!(b, a);
        b += a;
        assert_eq!(b.components(), vec![2., 4., 6., 8.]);
        b -= a * 3.;
        assert_eq!(b, -a);
        assert_eq!(a.elemul(&a).map(f64::sqrt), a);
        assert_eq!(Q::zero() + a, a);
    }

    #[test]
    fn test_is_finite() {
        let mut q = Q::zero();
        assert!(q.is_finite());
        q.E = std::f64::NAN;
        assert!(!q.is_finite());
    }

    #[test]
    fn test_primitive_round_trip() {
        let gas = IdealGas::default();
        let w = Primitive {
            rho: 0.5322581,
            vx: 1.2060454,
            vy: -0.3,
            p: 0.3,
        };
        let q = gas.to_conserved(&w);
        assert_relative_eq!(
            q.E,
            0.3 / 0.4 + 0.5 * 0.5322581 * (1.2060454f64.powi(2) + 0.09),
            epsilon = 1e-14
        );
        let back = gas.to_primitive(&q);
        assert_relative_eq!(back.rho, w.rho);
        assert_relative_eq!(back.vx, w.vx, epsilon = 1e-15);
        assert_relative_eq!(back.vy, w.vy, epsilon = 1e-15);
        assert_relative_eq!(back.p, w.p, epsilon = 1e-14);
    }

    #[test]
    fn test_spectral_radius() {
        let gas = IdealGas::default();
        let q = gas.to_conserved(&Primitive {
            rho: 1.4,
            vx: -0.5,
            vy: 2.,
            p: 1.,
        });
        // a = 1
        let normal = Vec2 { x: 1., y: 0. };
        assert_relative_eq!(gas.spectral_radius(&q, &normal), 1.5, epsilon = 1e-14);
        let normal = Vec2 { x: 0., y: -1. };
        assert_relative_eq!(gas.spectral_radius(&q, &normal), 3., epsilon = 1e-14);
    }

    #[test]
    fn test_negative_pressure_has_no_sound_speed() {
        let gas = IdealGas::default();
        assert!(gas.sound_speed(1., -0.1).is_nan());
    }
}
