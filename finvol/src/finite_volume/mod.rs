#[macro_use]
pub mod unknowns;

pub mod boundary;
pub mod flux;
pub mod initial;
pub mod solver;

pub use self::flux::{Ausm, NumericalFlux};
pub use self::solver::{RunSummary, Solver, Status, StepReport};
pub use self::unknowns::{IdealGas, Primitive, Q};
