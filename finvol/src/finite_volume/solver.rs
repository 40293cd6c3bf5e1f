use itertools::izip;
use rulinalg::vector::Vector;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::finite_volume::boundary::outflow_boundary_state;
use crate::finite_volume::flux::{Ausm, NumericalFlux};
use crate::finite_volume::unknowns::{IdealGas, Unknown, Q};
use crate::mesh::geometry::{Metrics, Vec2};
use crate::mesh::grid::{Face, FaceMap, INTERIOR};
use crate::mesh::Mesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Stepping,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub iteration: usize,
    /// Simulation time after the step.
    pub time: f64,
    pub dt: f64,
    /// The cell whose local time step bounded `dt`.
    pub limiting_cell: usize,
    /// L2 norm of each residual component over all cells.
    pub residual_norm: Q,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: usize,
    pub time: f64,
    pub elapsed: Duration,
}

/// Adds `length * F(u_l, u_r, n)` to the left cell and subtracts it from the
/// right cell of every interior face.
pub fn assemble_interior_residual<FS: NumericalFlux>(
    flux: &FS,
    faces: &[Face],
    normals: &[Vec2],
    lengths: &Vector<f64>,
    state: &[Q],
    residuals: &mut [Q],
) {
    for (face, normal, length) in izip!(faces, normals, lengths.iter()) {
        if let Some(right) = face.right() {
            let left = face.left();
            let f = flux.flux(&state[left], &state[right], normal) * *length;
            residuals[left] += f;
            residuals[right] -= f;
        }
    }
}

/// Adds the flux against the outflow ghost state to the owner of every face
/// of one boundary group. Without a far-field state the interior state stands
/// in for it.
pub fn assemble_boundary_residual<FS: NumericalFlux>(
    flux: &FS,
    gas: &IdealGas,
    faces: &[Face],
    normals: &[Vec2],
    lengths: &Vector<f64>,
    farfield: Option<&Q>,
    state: &[Q],
    residuals: &mut [Q],
) {
    for (face, normal, length) in izip!(faces, normals, lengths.iter()) {
        let owner = face.left();
        let interior = &state[owner];
        let ghost = outflow_boundary_state(gas, interior, farfield.unwrap_or(interior), normal);
        residuals[owner] += flux.flux(interior, &ghost, normal) * *length;
    }
}

/// `volume / sum(length * spectral radius)` per cell, the sum running over
/// every face touching the cell.
pub fn local_time_steps(
    gas: &IdealGas,
    faces: &FaceMap,
    metrics: &Metrics,
    state: &[Q],
) -> Vector<f64> {
    let mut wave_speeds = vec![0.; metrics.volumes.size()];
    for (name, group) in faces {
        let normals = &metrics.normals[name];
        let lengths = &metrics.lengths[name];
        for (face, normal, length) in izip!(group, normals, lengths.iter()) {
            let left = face.left();
            wave_speeds[left] += length * gas.spectral_radius(&state[left], normal);
            if let Some(right) = face.right() {
                wave_speeds[right] += length * gas.spectral_radius(&state[right], normal);
            }
        }
    }
    metrics
        .volumes
        .iter()
        .zip(wave_speeds.iter())
        .map(|(volume, speed)| volume / speed)
        .collect()
}

fn residual_norm(residuals: &[Q]) -> Q {
    residuals
        .iter()
        .fold(Q::zero(), |acc, r| acc + r.elemul(r))
        .map(f64::sqrt)
}

/// Explicit first-order time integration of the cell averages.
///
/// Each call to [`Solver::step`] assembles the residual over every face,
/// takes the largest time step the CFL number allows (clipped to land on the
/// end time) and updates `U -= dt / volume * residual`.
#[derive(Debug)]
pub struct Solver<'mesh, FS: NumericalFlux = Ausm> {
    mesh: &'mesh Mesh,
    metrics: Metrics,
    flux: FS,
    gas: IdealGas,
    cfl: f64,
    end_time: f64,
    max_iterations: Option<usize>,
    check_state: bool,
    farfield: BTreeMap<String, Q>,
    state: Vec<Q>,
    residuals: Vec<Q>,
    time: f64,
    iteration: usize,
    status: Status,
}

impl<'mesh> Solver<'mesh, Ausm> {
    pub fn new(
        mesh: &'mesh Mesh,
        config: &SolverConfig,
        state: Vec<Q>,
    ) -> Result<Solver<'mesh, Ausm>, SolverError> {
        Solver::with_flux(mesh, config, Ausm::new(config.gas()), state)
    }
}

impl<'mesh, FS: NumericalFlux> Solver<'mesh, FS> {
    pub fn with_flux(
        mesh: &'mesh Mesh,
        config: &SolverConfig,
        flux: FS,
        state: Vec<Q>,
    ) -> Result<Solver<'mesh, FS>, SolverError> {
        config.validate()?;
        if state.len() != mesh.num_cells() {
            return Err(SolverError::StateLength {
                expected: mesh.num_cells(),
                found: state.len(),
            });
        }

        let gas = config.gas();
        let mut farfield = BTreeMap::new();
        for (name, condition) in &config.boundaries {
            if !mesh.boundary_groups().iter().any(|group| &group.name == name) {
                return Err(SolverError::UnknownBoundary(name.clone()));
            }
            if let Some(q) = condition.farfield_state(&gas) {
                farfield.insert(name.clone(), q);
            }
        }

        let residuals = vec![Q::zero(); state.len()];
        Ok(Solver {
            mesh,
            metrics: Metrics::new(mesh),
            flux,
            gas,
            cfl: config.cfl,
            end_time: config.end_time,
            max_iterations: config.max_iterations,
            check_state: config.check_state,
            farfield,
            state,
            residuals,
            time: 0.,
            iteration: 0,
            status: Status::Stepping,
        })
    }

    pub fn mesh(&self) -> &'mesh Mesh {
        self.mesh
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn gas(&self) -> &IdealGas {
        &self.gas
    }

    pub fn state(&self) -> &[Q] {
        &self.state
    }

    pub fn into_state(self) -> Vec<Q> {
        self.state
    }

    /// The residual of the last step, one row per cell.
    pub fn residuals(&self) -> &[Q] {
        &self.residuals
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Recomputes the residual of every cell from the current state.
    pub fn assemble_residuals(&mut self) {
        for r in self.residuals.iter_mut() {
            *r = Q::zero();
        }
        for (name, faces) in self.mesh.faces() {
            let normals = &self.metrics.normals[name];
            let lengths = &self.metrics.lengths[name];
            if name == INTERIOR {
                assemble_interior_residual(
                    &self.flux,
                    faces,
                    normals,
                    lengths,
                    &self.state,
                    &mut self.residuals,
                );
            } else {
                assemble_boundary_residual(
                    &self.flux,
                    &self.gas,
                    faces,
                    normals,
                    lengths,
                    self.farfield.get(name),
                    &self.state,
                    &mut self.residuals,
                );
            }
        }
    }

    /// Advances one iteration. Returns `None` once the end time has been
    /// reached.
    pub fn step(&mut self) -> Result<Option<StepReport>, SolverError> {
        if self.status == Status::Done {
            return Ok(None);
        }
        if let Some(max) = self.max_iterations {
            if self.iteration >= max {
                return Err(SolverError::IterationLimit(max));
            }
        }

        self.assemble_residuals();

        let local = local_time_steps(&self.gas, self.mesh.faces(), &self.metrics, &self.state);
        if local.size() == 0 {
            return Err(SolverError::DegenerateTimeStep {
                dt: 0.,
                iteration: self.iteration,
                cell: 0,
            });
        }
        let (limiting_cell, local_dt) = local.argmin();
        let mut dt = self.cfl * local_dt;
        if self.check_state && !(dt > 0. && dt.is_finite()) {
            return Err(SolverError::DegenerateTimeStep {
                dt,
                iteration: self.iteration,
                cell: limiting_cell,
            });
        }

        let last = self.time + dt >= self.end_time;
        if last {
            dt = self.end_time - self.time;
        }

        for (u, r, volume) in izip!(
            self.state.iter_mut(),
            self.residuals.iter(),
            self.metrics.volumes.iter()
        ) {
            *u -= *r * (dt / volume);
        }

        self.iteration += 1;
        if last {
            self.time = self.end_time;
            self.status = Status::Done;
        } else {
            self.time += dt;
        }

        if self.check_state {
            self.check_physical()?;
        }

        let report = StepReport {
            iteration: self.iteration,
            time: self.time,
            dt,
            limiting_cell,
            residual_norm: residual_norm(&self.residuals),
        };
        debug!(
            "Iter = {}, t = {:.6}, dt = {:.4e} (cell {}), residual = [{:.4e}, {:.4e}, {:.4e}, {:.4e}]",
            report.iteration,
            report.time,
            report.dt,
            report.limiting_cell,
            report.residual_norm.rho,
            report.residual_norm.rho_u,
            report.residual_norm.rho_v,
            report.residual_norm.E
        );
        Ok(Some(report))
    }

    pub fn run(&mut self) -> Result<RunSummary, SolverError> {
        self.run_with(|_, _| {})
    }

    /// Steps to the end time, handing every step and the updated state to
    /// `observer`.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunSummary, SolverError>
    where
        F: FnMut(&StepReport, &[Q]),
    {
        info!(
            "integrating {} cells to t = {} with CFL {}",
            self.state.len(),
            self.end_time,
            self.cfl
        );
        let start = Instant::now();
        while let Some(report) = self.step()? {
            observer(&report, &self.state);
        }
        let summary = RunSummary {
            iterations: self.iteration,
            time: self.time,
            elapsed: start.elapsed(),
        };
        info!(
            "reached t = {} after {} iterations, computation took {:?}",
            summary.time, summary.iterations, summary.elapsed
        );
        Ok(summary)
    }

    fn check_physical(&self) -> Result<(), SolverError> {
        for (cell, u) in self.state.iter().enumerate() {
            let p = self.gas.pressure(u);
            if !(u.rho > 0. && p > 0.) || !u.is_finite() {
                return Err(SolverError::NonPhysicalState {
                    cell,
                    iteration: self.iteration,
                    rho: u.rho,
                    p,
                });
            }
        }
        Ok(())
    }
}
