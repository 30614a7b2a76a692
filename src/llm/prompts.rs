//! Prompt templates for keyword extraction and grounded summarization.

use serde_json::Value;

/// Render the prompt that reduces a conversational query to its keywords.
pub fn keyword_prompt(query: &str) -> String {
    format!(
        "Extract the main entities and topics from the user query below.\n\
         Reply with a single line of comma-separated keywords and nothing else.\n\
         Do not use punctuation other than the separating commas and do not rephrase the query.\n\n\
         Query: {query}\n\
         Keywords:"
    )
}

/// Render the prompt that answers `query` from the supplied hits only.
pub fn summary_prompt(query: &str, hits: &[Value]) -> String {
    let context = render_context(hits);
    format!(
        "You answer questions using only the context passages below.\n\
         Do not use any knowledge that is not contained in the context.\n\
         If the context does not contain enough information to answer, reply that you cannot \
         answer the question from the provided documents.\n\n\
         Context:\n{context}\n\n\
         Question: {query}\n\
         Answer:"
    )
}

fn render_context(hits: &[Value]) -> String {
    if hits.is_empty() {
        return "(no passages)".to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(position, hit)| {
            let text = hit
                .get("chunk")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| hit.to_string());
            match hit.get("url").and_then(Value::as_str) {
                Some(url) => format!("[{}] ({url}) {text}", position + 1),
                None => format!("[{}] {text}", position + 1),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize a raw keyword completion into a comma-separated list without punctuation.
pub fn clean_keywords(raw: &str) -> String {
    raw.lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default()
        .split(',')
        .map(|keyword| {
            keyword
                .chars()
                .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|keyword| !keyword.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_prompt_lists_chunks_and_urls() {
        let prompt = summary_prompt(
            "What is AI?",
            &[
                json!({ "id": "1__0", "chunk": "AI is a field.", "url": "http://a" }),
                json!({ "id": "2__0", "chunk": "Robots use AI." }),
            ],
        );
        assert!(prompt.contains("[1] (http://a) AI is a field."));
        assert!(prompt.contains("[2] Robots use AI."));
        assert!(prompt.contains("Question: What is AI?"));
        assert!(prompt.contains("cannot answer"));
    }

    #[test]
    fn empty_hits_are_rendered_explicitly() {
        assert!(summary_prompt("q", &[]).contains("(no passages)"));
    }

    #[test]
    fn clean_keywords_strips_punctuation() {
        assert_eq!(clean_keywords("AI, technology."), "AI, technology");
        assert_eq!(
            clean_keywords("\n  \"machine learning\" ,  neural-nets!\nignored"),
            "machine learning, neural-nets"
        );
        assert_eq!(clean_keywords("   "), "");
    }
}
