use serde::Deserialize;

/// How many history turns are kept when building the prompt. Older turns are
/// dropped silently; the context window is bounded, not an error condition.
pub const HISTORY_WINDOW: usize = 10;

/// System prompt giving the model its PhilogicAI persona and CRM context.
pub const SYSTEM_PROMPT: &str = "You are PhilogicAI, an intelligent assistant for the PhilogicHub CRM system.
You help with questions about:
- Company data and CRM features
- Sales opportunities and pipeline management
- Contact management and activities
- Analytics and reporting

Answer precisely and professionally.";

/// A single prior turn of the conversation, supplied entirely by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

fn role_label(role: &str) -> &'static str {
    if role == "user" {
        "User"
    } else {
        "Assistant"
    }
}

/// Builds the full prompt text fed to llama.cpp: system prompt, the last
/// [`HISTORY_WINDOW`] turns, the new message, and an open assistant label so
/// the model continues generation from that point.
pub fn assemble(system_prompt: &str, history: &[ChatTurn], message: &str) -> String {
    let mut prompt = format!("{system_prompt}\n\n");

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for turn in &history[start..] {
        prompt.push_str(role_label(&turn.role));
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }

    prompt.push_str(&format!("User: {message}\nAssistant: "));
    prompt
}
