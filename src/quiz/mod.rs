pub mod error;
pub mod generator;
pub mod loader;
pub mod render;
pub mod session;

pub use error::QuizError;

/// Every question offers exactly this many options, labeled A to D.
pub const OPTION_COUNT: usize = 4;

const OPTION_LABELS: [char; OPTION_COUNT] = ['A', 'B', 'C', 'D'];

/// Position of an option label, case-insensitive.
pub fn label_index(label: char) -> Option<usize> {
    let label = label.to_ascii_uppercase();
    OPTION_LABELS.iter().position(|l| *l == label)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    options: [String; OPTION_COUNT],
    correct_option_index: usize,
}

impl Question {
    /// Builds a question, rejecting blank text, blank or repeated options and
    /// an out of range correct index.
    pub fn new(
        text: String,
        options: [String; OPTION_COUNT],
        correct_option_index: usize,
    ) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        for (i, option) in options.iter().enumerate() {
            if option.trim().is_empty() {
                return Err(format!("option {} is empty", OPTION_LABELS[i]));
            }
            if options[..i].contains(option) {
                return Err(format!("option {} repeats an earlier option", OPTION_LABELS[i]));
            }
        }
        if correct_option_index >= OPTION_COUNT {
            return Err(format!("correct option index {} is out of range", correct_option_index));
        }

        Ok(Self {
            text,
            options,
            correct_option_index,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_option_index(&self) -> usize {
        self.correct_option_index
    }

    /// Options paired with their labels, in display order.
    pub fn labeled_options(&self) -> impl Iterator<Item = (char, &str)> {
        OPTION_LABELS
            .iter()
            .copied()
            .zip(self.options.iter().map(String::as_str))
    }
}

/// Ordered questions produced by the loader. Replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

#[cfg(test)]
pub(crate) fn question(text: &str, options: [&str; OPTION_COUNT], correct: usize) -> Question {
    Question::new(text.to_string(), options.map(str::to_string), correct).unwrap()
}
