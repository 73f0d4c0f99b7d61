use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("invalid capability: {0}")]
    InvalidCapability(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
