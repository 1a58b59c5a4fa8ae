//! Prompt templates for question answering

/// Separator placed between retrieved passages
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Prompt builder for retrieval-augmented questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Concatenate retrieved passages into a single context block
    pub fn build_context(passages: &[String]) -> String {
        passages
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR)
    }

    /// Instructions that frame the retrieved context
    pub fn system_instructions() -> &'static str {
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer."
    }

    /// Build the full prompt: instructions, context, then the question
    pub fn build_qa_prompt(question: &str, passages: &[String]) -> String {
        format!(
            "{instructions}\n\n{context}\n\nQuestion: {question}\nHelpful Answer:",
            instructions = Self::system_instructions(),
            context = Self::build_context(passages),
            question = question.trim(),
        )
    }

    /// Build the user message for chat-style models (instructions go in the system message)
    pub fn build_user_message(question: &str, passages: &[String]) -> String {
        format!(
            "Context:\n{context}\n\nQuestion: {question}",
            context = Self::build_context(passages),
            question = question.trim(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context_and_question() {
        let passages = vec![
            "Either party may terminate with 30 days notice.".to_string(),
            "  ".to_string(),
            "Rent is due on the first of the month.".to_string(),
        ];
        let prompt = PromptBuilder::build_qa_prompt(" When can I terminate? ", &passages);

        assert!(prompt.starts_with("Use the following pieces of context"));
        assert!(prompt.contains(
            "Either party may terminate with 30 days notice.\n\nRent is due on the first of the month."
        ));
        assert!(prompt.ends_with("Question: When can I terminate?\nHelpful Answer:"));
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(PromptBuilder::build_context(&[]), "");
        let message = PromptBuilder::build_user_message("What is the rent?", &[]);
        assert_eq!(message, "Context:\n\n\nQuestion: What is the rent?");
    }
}
