//! Answer synthesis: prompt construction, the grounding contract, and
//! extraction of the SOURCES section from the model's reply.

use std::fmt::Write;

use crate::error::Result;
use crate::llm::ChatModel;
use crate::models::{Answer, ChatMessage, RetrievedChunk};

/// Conversation turns (user + assistant) kept when building the prompt.
pub const MAX_HISTORY_TURNS: usize = 10;

/// Ask the model to answer `question` using only `retrieved` as evidence.
///
/// The reply must carry a SOURCES section naming the minimal set of
/// excerpts used; an explicit "I do not know" with an empty SOURCES
/// section is a designed success outcome, not an error.
pub async fn synthesize(
    model: &dyn ChatModel,
    history: &[ChatMessage],
    retrieved: &[RetrievedChunk],
    question: &str,
) -> Result<Answer> {
    let context_block = build_context_block(retrieved);
    let messages = build_messages(system_prompt(), history, &context_block, question);

    let text = model.complete(messages).await?;
    let sources = parse_sources(&text);

    Ok(Answer { text, sources })
}

/// Persona and formatting rules sent as the system instruction.
fn system_prompt() -> String {
    String::from(
        "You are a legal adviser. Answer the provided questions in simple \
         language, understandable without a background in legal education. \
         Be detailed. Answer ONLY from the provided excerpts of the act.\n\
         ALWAYS end your answer with a line starting with \"SOURCES:\" \
         listing only the minimal set of excerpt ids needed to answer the \
         question, comma-separated.\n\
         If the excerpts are insufficient to answer, state plainly that you \
         do not know and leave the SOURCES line empty. Never fabricate an \
         answer.\n\
         If you must use a legal term, explain it below the SOURCES line.",
    )
}

/// Format the retrieved chunks as the evidentiary context block.
pub fn build_context_block(retrieved: &[RetrievedChunk]) -> String {
    let mut ctx = String::from("Here are excerpts from the act:\n\n");

    if retrieved.is_empty() {
        ctx.push_str("(No relevant excerpts were found for this question.)\n");
    } else {
        for chunk in retrieved {
            write!(
                ctx,
                "--- {}#{} ---\n{}\n\n",
                chunk.source_id, chunk.chunk_index, chunk.text
            )
            .unwrap();
        }
    }

    ctx
}

fn build_messages(
    system_prompt: String,
    history: &[ChatMessage],
    context_block: &str,
    question: &str,
) -> Vec<ChatMessage> {
    let bounded = bound_history(history);

    let mut messages = Vec::with_capacity(bounded.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(bounded.iter().map(|m| (*m).clone()));
    // The context rides in the user message so smaller models attend to it
    messages.push(ChatMessage::user(format!(
        "{context_block}---\nQuestion: {question}"
    )));
    messages
}

/// Keep only the most recent turns.
fn bound_history(history: &[ChatMessage]) -> Vec<&ChatMessage> {
    let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history.iter().skip(skip).collect()
}

/// Pull the source ids out of the reply's SOURCES line.
/// Missing or empty SOURCES (the "I do not know" case) yields an empty list.
pub fn parse_sources(text: &str) -> Vec<String> {
    for line in text.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed
            .strip_prefix("SOURCES:")
            .or_else(|| trimmed.strip_prefix("SOURCES"))
        else {
            continue;
        };

        return rest
            .trim_start_matches(':')
            .split(',')
            .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|s| !s.is_empty() && *s != "none" && *s != "N/A")
            .map(|s| s.to_string())
            .collect();
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(source_id: &str, chunk_index: usize, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            source_id: source_id.to_string(),
            chunk_index,
            score: 0.9,
        }
    }

    // ─── Context block ───────────────────────────────────

    #[test]
    fn test_context_block_labels_chunks() {
        let ctx = build_context_block(&[retrieved("act.pdf", 0, "Art. 1. Text.")]);
        assert!(ctx.contains("--- act.pdf#0 ---"));
        assert!(ctx.contains("Art. 1. Text."));
    }

    #[test]
    fn test_context_block_empty_retrieval() {
        let ctx = build_context_block(&[]);
        assert!(ctx.contains("No relevant excerpts"));
    }

    // ─── Message assembly ────────────────────────────────

    #[test]
    fn test_messages_structure() {
        let history = vec![
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
        ];
        let msgs = build_messages("sys".into(), &history, "ctx\n", "q2");
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0].role, "system");
        assert_eq!(msgs[1].role, "user");
        assert_eq!(msgs[2].role, "assistant");
        assert_eq!(msgs[3].role, "user");
        assert!(msgs[3].content.contains("ctx"));
        assert!(msgs[3].content.contains("q2"));
    }

    #[test]
    fn test_history_bounded_to_most_recent() {
        let history: Vec<ChatMessage> = (0..25)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("msg {i}"))
                } else {
                    ChatMessage::assistant(format!("msg {i}"))
                }
            })
            .collect();
        let msgs = build_messages("sys".into(), &history, "ctx\n", "final");
        // system + 10 turns + final user message
        assert_eq!(msgs.len(), MAX_HISTORY_TURNS + 2);
        assert_eq!(msgs[1].content, "msg 15");
    }

    // ─── SOURCES parsing ─────────────────────────────────

    #[test]
    fn test_parse_sources_comma_separated() {
        let text = "Art. 1 gives everyone the right to ask.\n\nSOURCES: act.pdf#0, act.pdf#3";
        assert_eq!(parse_sources(text), vec!["act.pdf#0", "act.pdf#3"]);
    }

    #[test]
    fn test_parse_sources_single() {
        let text = "Answer.\nSOURCES: act.pdf#1";
        assert_eq!(parse_sources(text), vec!["act.pdf#1"]);
    }

    #[test]
    fn test_parse_sources_empty_means_no_answer() {
        let text = "I do not know based on the provided excerpts.\nSOURCES:";
        assert!(parse_sources(text).is_empty());
    }

    #[test]
    fn test_parse_sources_missing_section() {
        assert!(parse_sources("Just an answer with no citation.").is_empty());
    }

    #[test]
    fn test_parse_sources_ignores_none_placeholder() {
        let text = "I do not know.\nSOURCES: none";
        assert!(parse_sources(text).is_empty());
    }

    // ─── End-to-end with a scripted model ────────────────

    struct ScriptedModel {
        reply: String,
        seen: parking_lot::Mutex<Vec<ChatMessage>>,
    }

    #[async_trait::async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
            *self.seen.lock() = messages;
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_synthesize_returns_parsed_answer() {
        let model = ScriptedModel {
            reply: "Art. 1 lets you ask questions.\nSOURCES: act.pdf#0".to_string(),
            seen: parking_lot::Mutex::new(Vec::new()),
        };

        let chunks = vec![retrieved("act.pdf", 0, "Art. 1. Everyone may ask.")];
        let answer = synthesize(&model, &[], &chunks, "What does Art. 1 say?")
            .await
            .unwrap();

        assert_eq!(answer.sources, vec!["act.pdf#0"]);
        assert!(answer.text.contains("Art. 1"));

        let seen = model.seen.lock();
        assert_eq!(seen[0].role, "system");
        assert!(seen.last().unwrap().content.contains("What does Art. 1 say?"));
        assert!(seen.last().unwrap().content.contains("Everyone may ask."));
    }

    #[tokio::test]
    async fn test_synthesize_do_not_know_is_success() {
        let model = ScriptedModel {
            reply: "I do not know based on the provided excerpts.\nSOURCES:".to_string(),
            seen: parking_lot::Mutex::new(Vec::new()),
        };

        let answer = synthesize(&model, &[], &[], "Unanswerable?").await.unwrap();
        assert!(answer.sources.is_empty());
        assert!(answer.text.contains("do not know"));
    }
}
