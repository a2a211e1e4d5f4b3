use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuorumError {
    #[error("no rule matches command: {0}")]
    NoMatchingRule(String),

    #[error("malformed rule: {0}")]
    MalformedRule(String),

    #[error("unknown actor: {0}")]
    UnknownActor(String),

    #[error("action not found: {0}")]
    ActionNotFound(String),

    #[error("invalid name '{0}': must be alphanumeric with '.', '_', '-'")]
    InvalidName(String),

    #[error("failed to launch command: {0}")]
    ExecFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, QuorumError>;
