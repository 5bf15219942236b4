//! Turns raw generator output into a validated [`QuestionSet`].
//!
//! The generator is asked for bare JSON but regularly wraps it in code
//! fences or chatter, so the document is located by scanning for a balanced
//! top-level object instead of trimming a fixed prefix and suffix.

use serde::Deserialize;

use crate::quiz::{label_index, Question, QuestionSet, QuizError, OPTION_COUNT};

#[derive(Debug, Deserialize)]
struct RawQuestionSet {
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    answer: String,
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, String> {
        let correct = answer_index(&self.answer)
            .ok_or_else(|| format!("answer {:?} is not one of A, B, C or D", self.answer))?;
        let found = self.options.len();
        // Options become keyboard buttons, and Telegram trims button text on the way back
        let options: [String; OPTION_COUNT] = self
            .options
            .iter()
            .map(|option| option.trim().to_string())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| format!("expected {} options, found {}", OPTION_COUNT, found))?;

        Question::new(self.question.trim().to_string(), options, correct)
    }
}

/// Parses and validates a generated question set.
///
/// An empty `questions` array is accepted here; the session refuses to load it.
pub fn load(raw: &str) -> Result<QuestionSet, QuizError> {
    let document = parse_document(raw)?;

    let questions = document
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            q.into_question()
                .map_err(|reason| QuizError::malformed(format!("question {}: {}", i + 1, reason), raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Loaded {} questions", questions.len());
    Ok(QuestionSet::new(questions))
}

fn parse_document(raw: &str) -> Result<RawQuestionSet, QuizError> {
    let mut first_error = None;
    for candidate in embedded_objects(raw) {
        match serde_json::from_str::<RawQuestionSet>(candidate) {
            Ok(document) => return Ok(document),
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }

    let reason = match first_error {
        Some(err) => format!("invalid question set document: {}", err),
        None => "no JSON object found".to_string(),
    };
    Err(QuizError::malformed(reason, raw))
}

/// Every balanced `{ ... }` span in `text`, outermost first.
fn embedded_objects(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(move |(start, _)| {
            matching_brace(&text[start..]).map(|len| &text[start..start + len])
        })
}

/// Byte length of the object opening at the start of `text`, closing brace included.
/// Braces inside string literals are ignored.
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if in_string {
            match ch {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + ch.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Accepts `B`, ` b `, `B)`, `B.` or `B) 4`.
fn answer_index(answer: &str) -> Option<usize> {
    let mut chars = answer.trim().chars();
    let label = chars.next()?;
    match chars.next() {
        None | Some(')') | Some('.') | Some(':') => label_index(label),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PLUS_TWO: &str = r#"{"questions":[{"question":"2+2?","options":["3","4","5","6"],"answer":"B"}]}"#;

    fn reason(err: QuizError) -> String {
        match err {
            QuizError::MalformedQuestionSet { reason, .. } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parses_fenced_document() {
        let raw = "```json\n{\"questions\":[{\"question\":\"2+2?\",\"options\":[\"3\",\"4\",\"5\",\"6\"],\"answer\":\"B\"}]}\n```";
        let set = load(raw).unwrap();
        assert_eq!(set.len(), 1);
        let q = set.get(0).unwrap();
        assert_eq!(q.text(), "2+2?");
        assert_eq!(q.correct_option_index(), 1);
    }

    #[test]
    fn parses_document_surrounded_by_prose() {
        let raw = format!("Sure! Here is your quiz:\n\n{}\n\nGood luck {{and have fun}}", TWO_PLUS_TWO);
        let set = load(&raw).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_document() {
        let raw = r#"  {"questions":[{"question":"Which is a set literal: {1}?","options":["{1}","[1]","(1)","\"}\""],"answer":"a"}]}  "#;
        let set = load(raw).unwrap();
        let q = set.get(0).unwrap();
        assert_eq!(q.options()[3], "\"}\"");
        assert_eq!(q.correct_option_index(), 0);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let raw = r#"{"questions":[{"question":"  Capital of France? ","options":["Paris ","  Rome","Oslo\n","Bern"],"answer":"A"}]}"#;
        let set = load(raw).unwrap();
        let q = set.get(0).unwrap();
        assert_eq!(q.text(), "Capital of France?");
        assert_eq!(q.options(), &["Paris", "Rome", "Oslo", "Bern"].map(str::to_string));
    }

    #[test]
    fn options_differing_only_by_padding_are_duplicates() {
        let raw = r#"{"questions":[{"question":"q","options":["Paris","Paris ","Oslo","Bern"],"answer":"A"}]}"#;
        let err = load(raw).unwrap_err();
        assert_eq!(reason(err), "question 1: option B repeats an earlier option");
    }

    #[test]
    fn empty_question_list_is_structurally_valid() {
        let set = load(r#"{"questions":[]}"#).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn tolerant_answer_labels() {
        assert_eq!(answer_index("B"), Some(1));
        assert_eq!(answer_index(" d "), Some(3));
        assert_eq!(answer_index("C) Paris"), Some(2));
        assert_eq!(answer_index("A."), Some(0));
        assert_eq!(answer_index("E"), None);
        assert_eq!(answer_index("Berlin"), None);
        assert_eq!(answer_index(""), None);
    }

    #[test]
    fn rejects_wrong_option_count() {
        let raw = r#"{"questions":[{"question":"q","options":["a","b","c"],"answer":"A"}]}"#;
        let err = load(raw).unwrap_err();
        assert_eq!(reason(err), "question 1: expected 4 options, found 3");
    }

    #[test]
    fn rejects_unknown_answer_label() {
        let raw = r#"{"questions":[{"question":"q","options":["a","b","c","d"],"answer":"E"}]}"#;
        let err = load(raw).unwrap_err();
        assert!(reason(err).contains("not one of A, B, C or D"));
    }

    #[test]
    fn rejects_blank_question_text() {
        let raw = r#"{"questions":[{"question":"  ","options":["a","b","c","d"],"answer":"A"}]}"#;
        assert!(reason(load(raw).unwrap_err()).starts_with("question 1:"));
    }

    #[test]
    fn one_bad_entry_fails_the_whole_set() {
        let raw = r#"{"questions":[
            {"question":"ok","options":["a","b","c","d"],"answer":"A"},
            {"question":"bad","options":["a","b","c","d"]}
        ]}"#;
        assert!(matches!(load(raw), Err(QuizError::MalformedQuestionSet { .. })));
    }

    #[test]
    fn malformed_error_keeps_raw_text() {
        let raw = "I could not come up with a quiz, sorry.";
        match load(raw).unwrap_err() {
            QuizError::MalformedQuestionSet { reason, raw: kept } => {
                assert_eq!(reason, "no JSON object found");
                assert_eq!(kept, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncated_document_is_malformed() {
        let raw = r#"```json {"questions":[{"question":"q","options":["a","b""#;
        assert!(matches!(load(raw), Err(QuizError::MalformedQuestionSet { .. })));
    }

    #[test]
    fn matching_brace_counts_bytes() {
        assert_eq!(matching_brace("{\"é\":{}} tail"), Some(9));
        assert_eq!(matching_brace("{ unclosed"), None);
    }
}
