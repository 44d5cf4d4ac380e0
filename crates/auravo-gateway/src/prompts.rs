//! Prompt templates and starter prompts.

/// Standing instruction sent with every chat request.
pub const SYSTEM_INSTRUCTION: &str = "You are Auravo, a helpful and friendly AI assistant. \
Answer clearly and concisely, and format longer answers with markdown.";

/// Instruction placed in front of recorded audio.
pub const TRANSCRIPTION_INSTRUCTION: &str = "Transcribe the following audio recording. \
Respond with the transcript only, without commentary.";

/// Starter prompts offered on an empty conversation.
const INITIAL_PROMPTS: [&str; 8] = [
    "Explain quantum computing in simple terms.",
    "Write a short story about a robot who discovers music.",
    "What are some healthy and delicious breakfast ideas?",
    "Create a workout plan for building muscle at home.",
    "Summarize the plot of the movie 'Inception'.",
    "Translate 'Where is the nearest library?' to French.",
    "Write a python script to sort a list of numbers.",
    "Give me some tips for learning a new language.",
];

/// The first `count` starter prompts.
pub fn suggested_prompts(count: usize) -> Vec<&'static str> {
    INITIAL_PROMPTS.iter().copied().take(count).collect()
}

/// Prompt asking for a short title for a conversation transcript.
pub fn summary_prompt(conversation: &str) -> String {
    format!(
        "Summarize the following conversation as a short title of at most six words. \
Respond with the title only, without quotes or trailing punctuation.\n\n\
Conversation:\n{}",
        conversation
    )
}

/// Normalize a model-written title: first line, no surrounding quotes,
/// markdown emphasis or trailing period.
pub fn clean_title(raw: &str) -> String {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let line = line.strip_prefix("Title:").unwrap_or(line).trim();
    line.trim_end_matches('.')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '*' | '`' | '#'))
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_prompts_count() {
        assert_eq!(suggested_prompts(4).len(), 4);
        assert_eq!(suggested_prompts(4)[0], "Explain quantum computing in simple terms.");
        assert_eq!(suggested_prompts(100).len(), 8);
        assert!(suggested_prompts(0).is_empty());
    }

    #[test]
    fn test_summary_prompt_embeds_conversation() {
        let prompt = summary_prompt("user: Hello\nmodel: Hi there!");
        assert!(prompt.ends_with("user: Hello\nmodel: Hi there!"));
        assert!(prompt.contains("short title"));
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("\"Friendly Greeting\"\n"), "Friendly Greeting");
        assert_eq!(clean_title("**Quantum Basics**."), "Quantum Basics");
        assert_eq!(clean_title("\n\nTitle: Cat Pictures\nextra"), "Cat Pictures");
        assert_eq!(clean_title("   "), "");
    }
}
