//! Suggested-question generation with a strict response schema.
//!
//! The model is asked for a bare JSON array with an exact number of
//! question strings. A reply that does not validate fails closed with
//! [`Error::Synthesis`] instead of being string-searched for a delimiter.

use crate::error::{Error, Result};

/// Retrieval query used to pull grounding chunks before asking the model
/// to propose questions.
pub const QUESTION_ELICITATION_QUERY: &str =
    "purpose, obligations and rights established by this act";

/// Build the prompt requesting `count` citizen-level questions about the
/// act whose excerpts appear in `context_block`.
pub fn build_questions_prompt(count: usize, context_block: &str) -> String {
    format!(
        "Here are excerpts from a legislative act:\n\n{context_block}\n\
         Propose exactly {count} questions about this act that an ordinary \
         citizen might ask. Use simple, non-legal language.\n\n\
         Respond with ONLY a JSON array of {count} strings. No explanation.\n\
         Example: [\"question 1\", \"question 2\"]"
    )
}

/// Validate and parse the model's reply.
///
/// Accepts surrounding prose or a markdown fence around the array, but the
/// array itself must parse as strings and contain exactly `count` non-empty
/// entries.
pub fn parse_questions(content: &str, count: usize) -> Result<Vec<String>> {
    let json_str = match (content.find('['), content.rfind(']')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(Error::Synthesis(format!(
                "question list is not a JSON array: {content:.120}"
            )))
        }
    };

    let questions: Vec<String> = serde_json::from_str(json_str)
        .map_err(|e| Error::Synthesis(format!("question list failed to parse: {e}")))?;

    if questions.len() != count {
        return Err(Error::Synthesis(format!(
            "expected {count} questions, model returned {}",
            questions.len()
        )));
    }
    if questions.iter().any(|q| q.trim().is_empty()) {
        return Err(Error::Synthesis(
            "question list contains an empty entry".to_string(),
        ));
    }

    Ok(questions)
}
