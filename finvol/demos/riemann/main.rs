//! Four-quadrant Riemann problem on the unit square.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use finvol::config::SolverConfig;
use finvol::finite_volume::Solver;
use finvol::io::gmsh;
use finvol::mesh::generators::riemann_square;
use finvol::mesh::reference_element::ElemShape;
use finvol::mesh::Mesh;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shape {
    Tri,
    Quad,
}

#[derive(Parser)]
#[command(name = "riemann-2d")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "First-order AUSM solution of a 2D Riemann problem", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON run configuration. Defaults to the four-quadrant problem.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Gmsh 2.2 mesh. Without it the unit square is meshed.
    #[arg(short, long)]
    mesh: Option<PathBuf>,

    /// Cells per side of the generated square
    #[arg(short = 'n', long, default_value_t = 40)]
    cells: usize,

    #[arg(long, value_enum, default_value_t = Shape::Tri)]
    shape: Shape,

    #[arg(short, long, default_value = "riemann.msh")]
    output: PathBuf,

    /// Overrides the configured end time
    #[arg(long)]
    end_time: Option<f64>,

    /// Overrides the configured CFL number
    #[arg(long)]
    cfl: Option<f64>,
}

fn snapshot_path(output: &Path, iteration: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("snapshot");
    output.with_file_name(format!("{}_{:06}.msh", stem, iteration))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &cli.config {
        Some(path) => SolverConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SolverConfig::default(),
    };
    if let Some(end_time) = cli.end_time {
        config.end_time = end_time;
    }
    if let Some(cfl) = cli.cfl {
        config.cfl = cfl;
    }
    config.validate()?;

    let mesh = match &cli.mesh {
        Some(path) => gmsh::read_file(path)
            .with_context(|| format!("reading mesh {}", path.display()))?
            .into_mesh(config.strictness)?,
        None => {
            let shape = match cli.shape {
                Shape::Tri => ElemShape::Triangle,
                Shape::Quad => ElemShape::Quadrilateral,
            };
            let (nodes, groups) = riemann_square(cli.cells, shape)?;
            Mesh::new(nodes, groups, config.strictness)?
        }
    };
    let report = mesh.topology_report();
    if !report.is_clean() {
        info!("mesh topology: {:?}", report);
    }

    let initial = config.initial.evaluate(&config.gas(), &mesh);
    let mut solver = Solver::new(&mesh, &config, initial)?;

    let start = Instant::now();
    while let Some(step) = solver.step()? {
        if let Some(interval) = config.output_interval {
            if step.iteration % interval == 0 {
                let path = snapshot_path(&cli.output, step.iteration);
                gmsh::write_solution_file(&path, &mesh, solver.state(), step.time, step.iteration)?;
            }
        }
    }
    info!(
        "reached t = {} in {} iterations, computation took {:?}",
        solver.time(),
        solver.iteration(),
        start.elapsed()
    );

    gmsh::write_solution_file(
        &cli.output,
        &mesh,
        solver.state(),
        solver.time(),
        solver.iteration(),
    )?;
    Ok(())
}
