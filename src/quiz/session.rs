use crate::quiz::{Question, QuestionSet, QuizError, OPTION_COUNT};

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No question set loaded.
    Empty,
    /// Loaded, waiting for the first `advance`.
    Ready,
    InProgress { index: usize },
    Finished,
}

/// Final result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub score: usize,
    pub total: usize,
}

/// Result of [`QuizSession::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<'a> {
    Question(&'a Question),
    Finished(Summary),
}

/// Result of [`QuizSession::submit_answer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// `scored` is false when the question was already failed or already answered.
    Correct { scored: bool },
    Incorrect,
}

/// One run of a quiz, from load through completion or restart.
///
/// Every operation either applies fully or leaves the session untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    questions: Option<QuestionSet>,
    /// `None` until the first advance.
    current: Option<usize>,
    score: usize,
    failed_current: bool,
    resolved_current: bool,
    rejected: [bool; OPTION_COUNT],
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous run, including its score.
    pub fn load(&mut self, questions: QuestionSet) -> Result<(), QuizError> {
        if questions.is_empty() {
            return Err(QuizError::InvalidQuestionSet);
        }

        log::debug!("Loading a question set of {} questions", questions.len());
        *self = Self {
            questions: Some(questions),
            ..Self::default()
        };
        Ok(())
    }

    /// Moves to the next question. Once past the last question this keeps
    /// returning the same summary without touching the session.
    pub fn advance(&mut self) -> Result<Advance<'_>, QuizError> {
        let total = self.questions.as_ref().ok_or(QuizError::NotLoaded)?.len();

        if self.current == Some(total) {
            return Ok(Advance::Finished(self.finished_summary()));
        }

        let next = self.current.map_or(0, |index| index + 1);
        self.current = Some(next);
        self.clear_question_flags();

        match self.current_question() {
            Some(question) => Ok(Advance::Question(question)),
            None => Ok(Advance::Finished(self.finished_summary())),
        }
    }

    /// Checks `option` against the active question.
    ///
    /// A point is awarded only when the question had no wrong attempt and
    /// was not already answered correctly.
    pub fn submit_answer(&mut self, option: usize) -> Result<Verdict, QuizError> {
        let Phase::InProgress { index } = self.phase() else {
            return Err(QuizError::NotInProgress);
        };
        if option >= OPTION_COUNT {
            return Err(QuizError::InvalidOption(option));
        }

        let correct = self
            .questions
            .as_ref()
            .and_then(|questions| questions.get(index))
            .map(Question::correct_option_index)
            .ok_or(QuizError::NotInProgress)?;

        if option != correct {
            self.failed_current = true;
            self.rejected[option] = true;
            return Ok(Verdict::Incorrect);
        }

        let scored = !self.failed_current && !self.resolved_current;
        if scored {
            self.score += 1;
        }
        self.resolved_current = true;
        Ok(Verdict::Correct { scored })
    }

    /// Back to an empty session. Always succeeds.
    pub fn restart(&mut self) {
        *self = Self::default();
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase() {
            Phase::InProgress { index } => self.questions.as_ref()?.get(index),
            _ => None,
        }
    }

    pub fn summary(&self) -> Result<Summary, QuizError> {
        match self.phase() {
            Phase::Finished => Ok(self.finished_summary()),
            Phase::Empty => Err(QuizError::NotLoaded),
            Phase::Ready | Phase::InProgress { .. } => Err(QuizError::NotFinished),
        }
    }

    pub fn phase(&self) -> Phase {
        let Some(questions) = &self.questions else {
            return Phase::Empty;
        };
        match self.current {
            None => Phase::Ready,
            Some(index) if index < questions.len() => Phase::InProgress { index },
            Some(_) => Phase::Finished,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    /// Number of loaded questions, zero when empty.
    pub fn total(&self) -> usize {
        self.questions.as_ref().map_or(0, QuestionSet::len)
    }

    /// Whether the active question already received a wrong answer.
    pub fn has_failed_current(&self) -> bool {
        self.failed_current
    }

    /// Whether the active question was answered correctly.
    pub fn is_resolved(&self) -> bool {
        self.resolved_current
    }

    /// Options already answered wrongly for the active question.
    pub fn rejected_options(&self) -> &[bool; OPTION_COUNT] {
        &self.rejected
    }

    fn finished_summary(&self) -> Summary {
        Summary {
            score: self.score,
            total: self.total(),
        }
    }

    fn clear_question_flags(&mut self) {
        self.failed_current = false;
        self.resolved_current = false;
        self.rejected = [false; OPTION_COUNT];
    }
}
