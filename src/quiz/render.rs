//! Stateless projection of a [`QuizSession`] onto bot replies.
//!
//! Nothing here talks to Telegram: a [`Screen`] is plain HTML text plus the
//! reply keyboard rows, and the bot turns it into a message.

use teloxide::utils::html;

use crate::quiz::session::{Phase, QuizSession, Summary, Verdict};
use crate::quiz::{label_index, Question, QuizError};

pub const START_BUTTON: &str = "Start";
pub const NEXT_BUTTON: &str = "Next";
pub const FINISH_BUTTON: &str = "Finish";
pub const RESTART_BUTTON: &str = "Restart quiz";

const OPTIONS_PER_ROW: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub text: String,
    /// Reply keyboard rows. Empty means the keyboard is removed.
    pub buttons: Vec<Vec<String>>,
}

impl Screen {
    fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    fn with_buttons(mut self, buttons: Vec<Vec<String>>) -> Self {
        self.buttons = buttons;
        self
    }
}

pub fn welcome() -> Screen {
    Screen::new(format!(
        "{}\nSend me any topic and I will write a multiple-choice quiz about it.",
        html::bold("Quizbot")
    ))
}

pub fn topic_prompt() -> Screen {
    Screen::new("Enter a quiz topic.")
}

pub fn generating(topic: &str) -> Screen {
    Screen::new(format!(
        "Writing a quiz about {}...",
        html::bold(&html::escape(topic))
    ))
}

pub fn loaded(session: &QuizSession) -> Screen {
    Screen::new(format!(
        "Questions loaded: {}. Press {} when you are ready.",
        session.total(),
        START_BUTTON
    ))
    .with_buttons(vec![vec![START_BUTTON.to_string()]])
}

/// What the user should be looking at for the session as it is now.
pub fn current(session: &QuizSession) -> Screen {
    match session.phase() {
        Phase::Empty => Screen::new("Please add a quiz topic first."),
        Phase::Ready => loaded(session),
        Phase::InProgress { index } => match session.current_question() {
            Some(question) => question_screen(session, index, question),
            None => Screen::new("Please add a quiz topic first."),
        },
        Phase::Finished => session
            .summary()
            .map(finished)
            .unwrap_or_else(|_| Screen::new("Please add a quiz topic first.")),
    }
}

pub fn finished(summary: Summary) -> Screen {
    Screen::new(format!(
        "{}\nYou scored {}/{}",
        html::bold("Quiz over!"),
        summary.score,
        summary.total
    ))
    .with_buttons(vec![vec![RESTART_BUTTON.to_string()]])
}

pub fn verdict(session: &QuizSession, verdict: Verdict) -> Screen {
    let text = match verdict {
        Verdict::Correct { scored: true } => "Correct answer! +1 point".to_string(),
        Verdict::Correct { scored: false } if session.has_failed_current() => {
            "Correct answer! No point this time, it took more than one try.".to_string()
        }
        Verdict::Correct { scored: false } => "Correct answer!".to_string(),
        Verdict::Incorrect => "Try again!".to_string(),
    };
    Screen::new(text).with_buttons(controls(session))
}

/// Shown when a generated set could not be used. The keyboard still
/// reflects `session`, which the failed load left untouched.
pub fn load_failed(err: &QuizError, session: &QuizSession) -> Screen {
    let text = match err {
        QuizError::MalformedQuestionSet { .. } => {
            "I could not read the quiz the generator wrote. Please send the topic again.".to_string()
        }
        QuizError::InvalidQuestionSet => {
            "The generator did not come up with any questions. Try another topic.".to_string()
        }
        other => format!("Could not load the quiz: {}", html::escape(&other.to_string())),
    };
    Screen::new(text).with_buttons(current(session).buttons)
}

pub fn generation_failed(session: &QuizSession) -> Screen {
    Screen::new("The quiz generator is not responding right now. Please try again in a moment.")
        .with_buttons(current(session).buttons)
}

/// Reply to a message that matches no control of the current screen.
pub fn hint(session: &QuizSession) -> Screen {
    let text = match session.phase() {
        Phase::Empty => "Please add a quiz topic first.",
        Phase::Ready => "Press Start to begin.",
        Phase::InProgress { .. } if session.is_resolved() => "Press the button to continue.",
        Phase::InProgress { .. } => "Please pick one of the options.",
        Phase::Finished => "The quiz is over. Press Restart quiz to play again.",
    };
    Screen::new(text).with_buttons(current(session).buttons)
}

/// Button text for an option, e.g. `B) Paris`.
pub fn option_button(label: char, option: &str) -> String {
    format!("{}) {}", label, option)
}

/// Maps an option button, or a bare letter A to D, back to an option index.
pub fn parse_option(question: &Question, text: &str) -> Option<usize> {
    let text = text.trim();
    if let Some(index) = question
        .labeled_options()
        .position(|(label, option)| option_button(label, option) == text)
    {
        return Some(index);
    }

    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(label), None) => label_index(label),
        _ => None,
    }
}

/// The topic in a free-text message. Commands and control buttons are not topics.
pub fn parse_topic(text: &str) -> Option<&str> {
    let topic = text.trim();
    let is_control = [START_BUTTON, NEXT_BUTTON, FINISH_BUTTON, RESTART_BUTTON].contains(&topic);
    if topic.is_empty() || topic.starts_with('/') || is_control {
        return None;
    }
    Some(topic)
}

fn question_screen(session: &QuizSession, index: usize, question: &Question) -> Screen {
    let mut text = format!(
        "{}\n\n{}\n",
        html::bold(&format!("Question {} of {}", index + 1, session.total())),
        html::escape(question.text())
    );
    for (label, option) in question.labeled_options() {
        text.push_str(&format!("\n{}) {}", label, html::escape(option)));
    }
    Screen::new(text).with_buttons(controls(session))
}

/// Open options, two per row, then the button that moves on.
fn controls(session: &QuizSession) -> Vec<Vec<String>> {
    let Some(question) = session.current_question() else {
        return current(session).buttons;
    };

    let mut rows = Vec::new();
    if !session.is_resolved() {
        let open: Vec<String> = question
            .labeled_options()
            .zip(session.rejected_options())
            .filter(|(_, rejected)| !**rejected)
            .map(|((label, option), _)| option_button(label, option))
            .collect();
        rows.extend(open.chunks(OPTIONS_PER_ROW).map(<[String]>::to_vec));
    }
    rows.push(vec![next_button(session).to_string()]);
    rows
}

fn next_button(session: &QuizSession) -> &'static str {
    match session.phase() {
        Phase::InProgress { index } if index + 1 == session.total() => FINISH_BUTTON,
        _ => NEXT_BUTTON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{question, QuestionSet};

    fn started() -> QuizSession {
        let mut session = QuizSession::new();
        session
            .load(QuestionSet::new(vec![
                question("2 < 3?", ["yes", "no", "maybe", "never"], 0),
                question("Capital of France?", ["Paris", "Rome", "Oslo", "Bern"], 0),
            ]))
            .unwrap();
        session.advance().unwrap();
        session
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|b| b.to_string()).collect())
            .collect()
    }

    #[test]
    fn empty_session_asks_for_a_topic() {
        let screen = current(&QuizSession::new());
        assert!(screen.text.contains("quiz topic"));
        assert!(screen.buttons.is_empty());
    }

    #[test]
    fn loaded_session_offers_start() {
        let mut session = started();
        session.load(QuestionSet::new(vec![question("q", ["a", "b", "c", "d"], 0)])).unwrap();
        let screen = current(&session);
        assert_eq!(screen.text, "Questions loaded: 1. Press Start when you are ready.");
        assert_eq!(screen.buttons, rows(&[&["Start"]]));
    }

    #[test]
    fn question_screen_escapes_and_lays_out_options() {
        let screen = current(&started());
        assert!(screen.text.starts_with("<b>Question 1 of 2</b>"));
        assert!(screen.text.contains("2 &lt; 3?"));
        assert!(screen.text.contains("\nD) never"));
        assert_eq!(
            screen.buttons,
            rows(&[&["A) yes", "B) no"], &["C) maybe", "D) never"], &["Next"]])
        );
    }

    #[test]
    fn wrong_option_is_no_longer_offered() {
        let mut session = started();
        let v = session.submit_answer(1).unwrap();
        let screen = verdict(&session, v);
        assert_eq!(screen.text, "Try again!");
        assert_eq!(
            screen.buttons,
            rows(&[&["A) yes", "C) maybe"], &["D) never"], &["Next"]])
        );
    }

    #[test]
    fn correct_answer_leaves_only_the_way_forward() {
        let mut session = started();
        session.advance().unwrap();
        let v = session.submit_answer(0).unwrap();
        let screen = verdict(&session, v);
        assert_eq!(screen.text, "Correct answer! +1 point");
        assert_eq!(screen.buttons, rows(&[&["Finish"]]));
    }

    #[test]
    fn finished_screen_shows_score_and_restart() {
        let mut session = started();
        session.submit_answer(0).unwrap();
        session.advance().unwrap();
        session.advance().unwrap();
        let screen = current(&session);
        assert_eq!(screen.text, "<b>Quiz over!</b>\nYou scored 1/2");
        assert_eq!(screen.buttons, rows(&[&["Restart quiz"]]));
    }

    #[test]
    fn parse_option_accepts_buttons_and_letters() {
        let q = question("Capital of France?", ["Paris", "Rome", "Oslo", "Bern"], 0);
        assert_eq!(parse_option(&q, "B) Rome"), Some(1));
        assert_eq!(parse_option(&q, " d "), Some(3));
        assert_eq!(parse_option(&q, "B) Paris"), None);
        assert_eq!(parse_option(&q, "Rome"), None);
        assert_eq!(parse_option(&q, "E"), None);
    }

    #[test]
    fn returned_button_text_maps_back_to_its_option() {
        let set = crate::quiz::loader::load(
            r#"{"questions":[{"question":"Capital of France?","options":["Paris ","Rome","Oslo","Bern"],"answer":"A"}]}"#,
        )
        .unwrap();
        let mut session = QuizSession::new();
        session.load(set).unwrap();
        session.advance().unwrap();

        let screen = current(&session);
        let question = session.current_question().unwrap();
        for (index, button) in screen.buttons.concat().iter().take(4).enumerate() {
            assert_eq!(parse_option(question, button.trim()), Some(index));
        }
    }

    #[test]
    fn commands_and_buttons_are_not_topics() {
        assert_eq!(parse_topic("  volcanoes "), Some("volcanoes"));
        assert_eq!(parse_topic("Restart quiz"), None);
        assert_eq!(parse_topic("Next"), None);
        assert_eq!(parse_topic("/unknown volcanoes"), None);
        assert_eq!(parse_topic("   "), None);
    }

    #[test]
    fn failed_load_keeps_the_current_keyboard() {
        let session = started();
        let err = QuizError::MalformedQuestionSet {
            reason: "no JSON object found".to_string(),
            raw: String::new(),
        };
        let screen = load_failed(&err, &session);
        assert!(screen.text.contains("send the topic again"));
        assert_eq!(screen.buttons, current(&session).buttons);
    }

    #[test]
    fn late_correct_answer_explains_the_missing_point() {
        let mut session = started();
        session.submit_answer(3).unwrap();
        let v = session.submit_answer(0).unwrap();
        assert_eq!(
            verdict(&session, v).text,
            "Correct answer! No point this time, it took more than one try."
        );
        assert_eq!(verdict(&session, Verdict::Correct { scored: false }).buttons, rows(&[&["Next"]]));
    }

    #[test]
    fn generating_escapes_the_topic() {
        assert_eq!(generating("<b>").text, "Writing a quiz about <b>&lt;b&gt;</b>...");
    }
}
