use thiserror::Error;

/// Errors raised while reading or validating a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse input: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A per-vertex or per-edge array does not match the entity count
    #[error("{field} has {found} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("edge {edge} references vertex {vertex}, but only {n_vertices} vertices exist")]
    VertexOutOfRange {
        edge: usize,
        vertex: usize,
        n_vertices: usize,
    },

    #[error("edge {edge} connects vertex {vertex} to itself")]
    SelfLoop { edge: usize, vertex: usize },

    #[error("vertex {vertex} has unknown type code {code}")]
    UnknownVertexType { vertex: usize, code: u8 },

    #[error("edge {edge} has unknown type code {code}")]
    UnknownEdgeType { edge: usize, code: u8 },

    #[error("vertex {vertex} has negative buoyant radius {radius}")]
    NegativeRadius { vertex: usize, radius: f64 },

    #[error("edge {edge} has negative rest length {length}")]
    NegativeLength { edge: usize, length: f64 },

    #[error("non-finite value in {field}")]
    NonFinite { field: &'static str },

    #[error("unknown simulation method '{0}'")]
    UnknownMethod(String),
}
