use orgsim_core::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentsError {
    #[error("agent spec has an empty id")]
    EmptyId,

    #[error("duplicate agent id {0:?}")]
    DuplicateAgent(String),

    #[error("agent {agent:?} lists unknown direct report {report:?}")]
    UnknownDirectReport { agent: String, report: String },

    #[error("agent {agent:?} has non-positive capacity {capacity}")]
    InvalidCapacity { agent: String, capacity: f64 },

    #[error("agent {agent:?} has seniority {seniority}, expected 1..=5")]
    InvalidSeniority { agent: String, seniority: u8 },
}

impl From<AgentsError> for SimError {
    fn from(e: AgentsError) -> Self {
        SimError::InvalidArgument(e.to_string())
    }
}

pub type AgentsResult<T> = Result<T, AgentsError>;
