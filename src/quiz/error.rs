use thiserror::Error;

/// Errors emitted by the question set loader and the quiz session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    /// The generated text did not contain a usable question set.
    /// `raw` keeps the whole generator output for diagnostics.
    #[error("malformed question set: {reason}")]
    MalformedQuestionSet { reason: String, raw: String },

    #[error("question set contains no questions")]
    InvalidQuestionSet,

    #[error("no question set loaded")]
    NotLoaded,

    #[error("no question is in progress")]
    NotInProgress,

    #[error("quiz is not finished yet")]
    NotFinished,

    #[error("option index {0} is out of range")]
    InvalidOption(usize),
}

impl QuizError {
    pub(crate) fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::MalformedQuestionSet {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}
