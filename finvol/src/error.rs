use thiserror::Error;

use crate::mesh::reference_element::ElemShape;

/// Top-level error type for the finite-volume solver.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Gmsh(#[from] GmshError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Malformed mesh input. The mesh is rejected as a whole.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("no reference element for shape {shape:?} with degree {degree}")]
    UnknownElement { shape: ElemShape, degree: usize },

    #[error("group '{group}': node table of length {len} is not a multiple of {nodes_per_element} nodes per element")]
    RaggedNodeTable {
        group: String,
        len: usize,
        nodes_per_element: usize,
    },

    #[error("group '{group}', element {element}: node {node} is out of range ({num_nodes} nodes)")]
    NodeOutOfRange {
        group: String,
        element: usize,
        node: usize,
        num_nodes: usize,
    },

    #[error("expected exactly one 2D cell group, found {0}")]
    CellGroupCount(usize),

    #[error("group name '{0}' is used more than once")]
    DuplicateGroupName(String),

    #[error("group '{group}' has topological dimension {found}, expected {expected}")]
    WrongDimension {
        group: String,
        expected: usize,
        found: usize,
    },

    #[error("boundary group '{group}': edge ({a}, {b}) does not match any cell edge")]
    UnmatchedBoundaryEdge { group: String, a: usize, b: usize },

    #[error("edge ({a}, {b}) is shared by more than two cells (cell {cell})")]
    DuplicateInteriorMatch { a: usize, b: usize, cell: usize },

    #[error("edge ({a}, {b}) is traversed in the same direction by cells {first} and {second}")]
    InconsistentOrientation {
        a: usize,
        b: usize,
        first: usize,
        second: usize,
    },

    #[error("cell {cell} has non-positive volume {volume}")]
    NonPositiveVolume { cell: usize, volume: f64 },
}

/// Errors reading or writing Gmsh files.
#[derive(Debug, Error)]
pub enum GmshError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported Gmsh element type: {0}")]
    UnsupportedElement(i32),

    #[error("missing section: {0}")]
    MissingSection(&'static str),

    #[error("unsupported mesh format version {0}, expected 2.x ASCII")]
    UnsupportedVersion(String),

    #[error("output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Failures during time integration.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("initial state has {found} rows, mesh has {expected} cells")]
    StateLength { expected: usize, found: usize },

    #[error("non-physical state in cell {cell} at iteration {iteration}: rho = {rho}, p = {p}")]
    NonPhysicalState {
        cell: usize,
        iteration: usize,
        rho: f64,
        p: f64,
    },

    #[error("degenerate time step {dt} at iteration {iteration} (limiting cell {cell})")]
    DegenerateTimeStep { dt: f64, iteration: usize, cell: usize },

    #[error("iteration limit {0} reached before end time")]
    IterationLimit(usize),

    #[error("boundary condition names group '{0}', which the mesh does not have")]
    UnknownBoundary(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Invalid solver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{key}': {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Convenience type alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
