use crate::physics::NodeId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("node {0} is not registered")]
    NotFound(NodeId),
    #[error("node {0} is already registered")]
    DuplicateNode(NodeId),
    #[error("node {id} has invalid radius {radius}")]
    InvalidRadius { id: NodeId, radius: f64 },
    #[error("node {id} was given a non-finite position")]
    InvalidPosition { id: NodeId },
    #[error("invalid boundary ({min_x}, {min_y})..({max_x}, {max_y})")]
    InvalidBoundary {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
    #[error("node {0} cannot be connected to itself")]
    SelfConnection(NodeId),
    #[error("invalid physics config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Short machine-readable name, used in JSON error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::DuplicateNode(_) => "duplicate_node",
            Error::InvalidRadius { .. } => "invalid_radius",
            Error::InvalidPosition { .. } => "invalid_position",
            Error::InvalidBoundary { .. } => "invalid_boundary",
            Error::SelfConnection(_) => "self_connection",
            Error::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
