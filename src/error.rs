use uuid::Uuid;

/// Outcomes and failures of the gamification core.
///
/// `AlreadyCompleted` and `NothingToUndo` are expected branch outcomes, not
/// faults: callers surface them as UI no-ops and must never log them as errors.
/// `Store` wraps a backing-collaborator failure unmodified; retry policy belongs
/// to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("goal already completed for the current period")]
    AlreadyCompleted,

    #[error("no completion to undo in the current period")]
    NothingToUndo,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl Error {
    pub fn goal_not_found(goal_id: Uuid) -> Self {
        Self::NotFound(format!("goal {goal_id}"))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".into()),
            other => Self::Store(other.into()),
        }
    }
}

pub type CoreResult<T> = Result<T, Error>;
