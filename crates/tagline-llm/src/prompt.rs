use tagline_types::ConversationRecord;

/// System message for chat-style providers
pub const SYSTEM_PROMPT: &str =
    "You are an expert in information retrieval and data processing.";

/// Build the single analysis prompt for a conversation
pub fn analysis_prompt(conversation: &ConversationRecord) -> String {
    format!(
        r#"You are an information retrieval and data processing expert. Create a concise index title for the conversation below and extract its core keywords as tags.

[Conversation]:
User: {user}
AI: {ai}
---
Reply strictly in the following JSON format, without any extra explanation or text:
{{
    "index_title": "A highly condensed title of at most 20 characters.",
    "tags": ["3 to 7 of the most relevant keywords or phrases, as an array of strings."]
}}
"#,
        user = conversation.user_prompt,
        ai = conversation.ai_response,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_sides() {
        let conversation = ConversationRecord::new(1, "ts", "How do I sort a Vec?", "Use sort()");
        let prompt = analysis_prompt(&conversation);
        assert!(prompt.contains("User: How do I sort a Vec?"));
        assert!(prompt.contains("AI: Use sort()"));
        assert!(prompt.contains("\"index_title\""));
    }
}
