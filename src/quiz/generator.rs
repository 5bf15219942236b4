use chatgpt::prelude::*;
use chatgpt::types::CompletionResponse;

/// Asks ChatGPT for a multiple-choice quiz on a topic.
///
/// Only produces the raw reply text; [`crate::quiz::loader::load`] turns it
/// into questions.
pub struct QuizGenerator {
    chat_gpt: ChatGPT,
    question_count: usize,
}

impl QuizGenerator {
    pub fn new(chat_gpt: ChatGPT, question_count: usize) -> Self {
        Self {
            chat_gpt,
            question_count,
        }
    }

    pub fn prompt(&self, topic: &str) -> String {
        format!(
            r#"You are a quiz generator. Write a {count}-question multiple-choice quiz about the topic below.
Every question must have exactly 4 distinct answer options (A, B, C and D) and exactly one correct answer.

Quiz topic: {topic}

Reply with the JSON document only, no commentary and no code fences, using this structure:
{{
  "questions": [
    {{
      "question": "Question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "answer": "Letter of the correct option (A, B, C or D)"
    }}
  ]
}}"#,
            count = self.question_count,
            topic = topic.trim(),
        )
    }

    pub async fn generate(&self, topic: &str) -> Result<String> {
        log::info!("Generating {} questions about {:?}", self.question_count, topic);
        let prompt = self.prompt(topic);

        let response: CompletionResponse = self.chat_gpt.send_message(prompt).await?;
        let content = response.message().content.clone();

        log::debug!("Completion: {:?}", content);

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(count: usize) -> QuizGenerator {
        QuizGenerator::new(ChatGPT::new("test-key").unwrap(), count)
    }

    #[test]
    fn prompt_names_topic_and_count() {
        let prompt = generator(7).prompt("  Roman history ");
        assert!(prompt.contains("Quiz topic: Roman history\n"));
        assert!(prompt.contains("a 7-question multiple-choice quiz"));
    }

    #[test]
    fn prompt_describes_the_loader_format() {
        let prompt = generator(5).prompt("rust");
        assert!(prompt.contains(r#""questions": ["#));
        assert!(prompt.contains(r#""options": ["Option A", "Option B", "Option C", "Option D"]"#));
        assert!(prompt.contains(r#""answer""#));
    }
}
