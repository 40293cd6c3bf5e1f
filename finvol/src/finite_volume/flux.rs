use std::fmt;

use crate::finite_volume::unknowns::{IdealGas, Q};
use crate::mesh::geometry::Vec2;

/// A two-point numerical flux through a face with unit normal `normal`,
/// pointing from the `minus` side to the `plus` side.
pub trait NumericalFlux: fmt::Debug {
    fn flux(&self, minus: &Q, plus: &Q, normal: &Vec2) -> Q;
}

/// Liou's Advection Upstream Splitting Method.
///
/// The interface Mach number and pressure are built from the polynomial
/// splittings below. The convected quantities are upwinded on the sign of the
/// interface Mach number and the pressure term is always added.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ausm {
    pub gas: IdealGas,
}

impl Ausm {
    pub fn new(gas: IdealGas) -> Ausm {
        Ausm { gas }
    }
}

pub fn m1_plus(ma: f64) -> f64 {
    if ma > 0. {
        ma
    } else {
        0.
    }
}

pub fn m1_minus(ma: f64) -> f64 {
    if ma > 0. {
        0.
    } else {
        ma
    }
}

pub fn m2_plus(ma: f64) -> f64 {
    if ma.abs() <= 1. {
        0.25 * (ma + 1.) * (ma + 1.)
    } else {
        m1_plus(ma)
    }
}

pub fn m2_minus(ma: f64) -> f64 {
    if ma.abs() <= 1. {
        -0.25 * (ma - 1.) * (ma - 1.)
    } else {
        m1_minus(ma)
    }
}

pub fn p3_plus(ma: f64) -> f64 {
    if ma.abs() <= 1. {
        m2_plus(ma) * (2. - ma)
    } else {
        m1_plus(ma) / ma
    }
}

pub fn p3_minus(ma: f64) -> f64 {
    if ma.abs() <= 1. {
        -m2_minus(ma) * (2. + ma)
    } else {
        m1_minus(ma) / ma
    }
}

struct Side<'a> {
    u: &'a Q,
    p: f64,
    a: f64,
    mach: f64,
}

impl<'a> Side<'a> {
    fn new(gas: &IdealGas, u: &'a Q, normal: &Vec2) -> Side<'a> {
        let p = gas.pressure(u);
        let a = gas.sound_speed(u.rho, p);
        let mach = u.normal_velocity(normal) / a;
        Side { u, p, a, mach }
    }

    fn convected(&self) -> Q {
        Q {
            rho: self.u.rho,
            rho_u: self.u.rho_u,
            rho_v: self.u.rho_v,
            E: self.u.E + self.p,
        }
    }
}

impl NumericalFlux for Ausm {
    fn flux(&self, minus: &Q, plus: &Q, normal: &Vec2) -> Q {
        let left = Side::new(&self.gas, minus, normal);
        let right = Side::new(&self.gas, plus, normal);

        let mach_half = m2_plus(left.mach) + m2_minus(right.mach);
        let p_half = left.p * p3_plus(left.mach) + right.p * p3_minus(right.mach);

        let upwind = if mach_half >= 0. { &left } else { &right };
        let convective = upwind.convected() * (mach_half * upwind.a);
        let pressure = Q {
            rho: 0.,
            rho_u: p_half * normal.x,
            rho_v: p_half * normal.y,
            E: 0.,
        };
        convective + pressure
    }
}
