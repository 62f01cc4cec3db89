pub type FlickerResult<T> = Result<T, FlickerError>;

#[derive(thiserror::Error, Debug)]
pub enum FlickerError {
    #[error("unknown state: {0}")]
    UnknownState(String),

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("invalid query time: {0}")]
    InvalidTime(f64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlickerError {
    pub fn unknown_state(name: impl std::fmt::Debug) -> Self {
        Self::UnknownState(format!("{name:?}"))
    }

    pub fn invalid_edge(msg: impl Into<String>) -> Self {
        Self::InvalidEdge(msg.into())
    }

    pub fn invalid_sequence(msg: impl Into<String>) -> Self {
        Self::InvalidSequence(msg.into())
    }
}
