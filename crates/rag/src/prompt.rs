//! Question-answering prompt.

use sift_core::passage::Passage;

/// Answer strictly from the supplied context; admitting ignorance is allowed.
pub const QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:";

/// Join passage bodies with a blank line, in the order given.
pub fn join_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the prompt. The caller has already fitted `context` to the budget.
pub fn assemble(question: &str, context: &str) -> String {
    // Fill `{question}` last so braces in retrieved text are left alone.
    let (head, tail) = QA_TEMPLATE
        .split_once("{context}")
        .unwrap_or((QA_TEMPLATE, ""));
    let mut prompt = String::with_capacity(QA_TEMPLATE.len() + context.len() + question.len());
    prompt.push_str(head);
    prompt.push_str(context);
    prompt.push_str(&tail.replace("{question}", question));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_context_then_question() {
        let prompt = assemble("What is Rust?", "Rust is a language.");
        assert!(prompt.starts_with("Use the following pieces of context"));
        assert!(prompt.contains("don't know"));
        assert!(prompt.contains("\n\nRust is a language.\n\nQuestion: What is Rust?\n"));
        assert!(prompt.ends_with("Helpful Answer:"));
    }

    #[test]
    fn joins_with_blank_line_in_order() {
        let passages = vec![
            Passage::new("a", "first"),
            Passage::new("b", "second"),
            Passage::new("c", "third"),
        ];
        assert_eq!(join_context(&passages), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn empty_context_still_renders() {
        let prompt = assemble("q", &join_context(&[]));
        assert!(prompt.contains("answer.\n\n\n\nQuestion: q"));
    }

    #[test]
    fn placeholder_text_in_context_is_not_substituted() {
        let prompt = assemble("real question", "a doc mentioning {question}");
        assert!(prompt.contains("a doc mentioning {question}"));
        assert!(prompt.contains("Question: real question"));
    }
}
