use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Classification callers match on. Two errors with the same kind are
/// handled the same way regardless of which layer produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    DuplicateUsername,
    DuplicateEmail,
    InvalidCredentials,
    CannotFollowSelf,
    InvalidInput,
    Cancelled,
    DeadlineExceeded,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("user does not have permission to access this resource")]
    AccessDenied,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("cannot follow yourself")]
    CannotFollowSelf,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// One branch of a fan-out read failed. `stage` names the branch.
    #[error("failed to {stage}: {source}")]
    SubRead {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    /// Anything the gateway could not classify. The display text stays
    /// generic; the cause is only reachable through `source()`.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AccessDenied => ErrorKind::AccessDenied,
            Self::DuplicateUsername => ErrorKind::DuplicateUsername,
            Self::DuplicateEmail => ErrorKind::DuplicateEmail,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::CannotFollowSelf => ErrorKind::CannotFollowSelf,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::SubRead { source, .. } => source.kind(),
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    pub(crate) fn in_stage(self, stage: &'static str) -> Self {
        Self::SubRead {
            stage,
            source: Box::new(self),
        }
    }
}
