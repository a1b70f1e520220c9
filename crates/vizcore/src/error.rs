#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link {link} references unknown node {missing:?} ({from} -> {to})")]
    InvalidReference {
        link: usize,
        from: String,
        to: String,
        missing: String,
    },

    #[error("duplicate key: {key}")]
    DuplicateKey { key: String },

    #[error("hierarchy is not a tree: node {node:?} is reachable more than once")]
    CyclicHierarchy { node: String },

    #[error("hierarchy node {node:?} is not reachable from the root")]
    DisconnectedHierarchy { node: String },

    #[error("unknown id: {id}")]
    NotFound { id: String },

    #[error("invalid option `{option}`: {reason}")]
    InvalidConfig { option: &'static str, reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
