#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("fisheye engine used before `initialize`")]
    NotInitialized,

    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("invalid fisheye options: {0}")]
    Options(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInput {
    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("duplicate node id: {id}")]
    DuplicateNodeId { id: String },

    #[error("node {id} has a non-finite position")]
    NonFiniteCoordinate { id: String },

    #[error("graph contains an edge with a missing endpoint: {edge_id} ({source_id} -> {target_id})")]
    MissingEndpoint {
        edge_id: String,
        source_id: String,
        target_id: String,
    },

    #[error("magnification must be a finite number, got {value}")]
    NonFiniteMagnification { value: f64 },

    #[error("focus point must be finite")]
    NonFiniteFocus,

    #[error("unknown node id: {id}")]
    UnknownNode { id: String },
}

pub type Result<T> = std::result::Result<T, Error>;
