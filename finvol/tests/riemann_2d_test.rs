//! The four-quadrant Riemann problem on coarse unit-square meshes.

use finvol::config::SolverConfig;
use finvol::finite_volume::unknowns::Unknown;
use finvol::finite_volume::{RunSummary, Solver, Status, Q};
use finvol::io::gmsh;
use finvol::mesh::generators::riemann_square;
use finvol::mesh::grid::Strictness;
use finvol::mesh::reference_element::ElemShape;
use finvol::mesh::Mesh;

fn square(n: usize, shape: ElemShape) -> Mesh {
    let (nodes, groups) = riemann_square(n, shape).unwrap();
    Mesh::new(nodes, groups, Strictness::Strict).unwrap()
}

fn run(mesh: &Mesh, config: &SolverConfig) -> (RunSummary, Vec<Q>) {
    let initial = config.initial.evaluate(&config.gas(), mesh);
    let mut solver = Solver::new(mesh, config, initial).unwrap();
    let summary = solver.run().unwrap();
    assert_eq!(solver.status(), Status::Done);
    (summary, solver.into_state())
}

fn checked_config(cfl: f64) -> SolverConfig {
    let mut config = SolverConfig::default();
    config.cfl = cfl;
    config.check_state = true;
    config.strictness = Strictness::Strict;
    config
}

fn assert_physical(config: &SolverConfig, state: &[Q]) {
    let gas = config.gas();
    for (cell, q) in state.iter().enumerate() {
        assert!(q.is_finite(), "cell {}: {:?}", cell, q);
        assert!(q.rho > 0. && q.rho < 3., "cell {}: rho = {}", cell, q.rho);
        assert!(gas.pressure(q) > 0., "cell {}: p = {}", cell, gas.pressure(q));
    }
}

#[test]
fn quadrilaterals_reach_end_time() {
    let mesh = square(2, ElemShape::Quadrilateral);
    assert_eq!(mesh.interior_faces().len(), 4);

    let config = checked_config(0.7);
    let (summary, state) = run(&mesh, &config);
    assert_eq!(summary.time, 0.3);
    assert!(summary.iterations > 1);
    assert_physical(&config, &state);
}

#[test]
fn triangles_reach_end_time() {
    let mesh = square(4, ElemShape::Triangle);
    assert_eq!(mesh.interior_faces().len(), 40);

    let config = checked_config(0.7);
    let (summary, state) = run(&mesh, &config);
    assert_eq!(summary.time, 0.3);
    assert_physical(&config, &state);
}

#[test]
fn smaller_cfl_takes_more_steps() {
    for &(n, shape) in &[(2, ElemShape::Quadrilateral), (4, ElemShape::Triangle)] {
        let mesh = square(n, shape);
        let (coarse, _) = run(&mesh, &checked_config(0.7));
        let (fine, _) = run(&mesh, &checked_config(0.35));
        assert!(
            fine.iterations > coarse.iterations,
            "{} x {} {:?}: {} steps at CFL 0.35, {} at 0.7",
            n,
            n,
            shape,
            fine.iterations,
            coarse.iterations
        );
    }
}

#[test]
fn solution_file_reads_back() {
    let mesh = square(3, ElemShape::Quadrilateral);
    let config = checked_config(0.7);
    let (summary, state) = run(&mesh, &config);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("riemann.msh");
    gmsh::write_solution_file(&path, &mesh, &state, summary.time, summary.iterations).unwrap();

    let reread = gmsh::read_file(&path)
        .unwrap()
        .into_mesh(Strictness::Strict)
        .unwrap();
    assert_eq!(reread.num_cells(), mesh.num_cells());
    assert_eq!(reread.faces(), mesh.faces());
}
