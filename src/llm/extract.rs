/// Marker separating echoed prompt text from the real completion.
const ASSISTANT_MARKER: &str = "Assistant:";

const FALLBACK_RESPONSE: &str =
    "Sorry, I could not generate a response. Please try again.";

/// Isolates the newly generated completion from raw llama.cpp stdout.
///
/// The executable may echo the prompt (including earlier turns, each carrying
/// the assistant label) ahead of the real completion, so only the segment
/// after the last marker is trustworthy. Without a marker the whole output is
/// taken as the completion.
///
/// Known ambiguity: if the completion itself contains the literal marker
/// text, everything before that occurrence is cut off as well.
pub fn extract(raw: &str) -> String {
    let text = match raw.rfind(ASSISTANT_MARKER) {
        Some(idx) => &raw[idx + ASSISTANT_MARKER.len()..],
        None => raw,
    };

    let text = text.trim();
    if text.is_empty() {
        FALLBACK_RESPONSE.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_text_after_marker() {
        assert_eq!(extract("preamble Assistant: real answer"), "real answer");
    }

    #[test]
    fn takes_last_marker_when_prompt_is_echoed() {
        let raw = "User: hi\nAssistant: old reply\nUser: again\nAssistant: new reply\n";
        assert_eq!(extract(raw), "new reply");
    }

    #[test]
    fn no_marker_returns_trimmed_whole_text() {
        assert_eq!(extract("  just the answer \n"), "just the answer");
    }

    #[test]
    fn whitespace_only_yields_fallback() {
        assert_eq!(extract("   \n\t "), FALLBACK_RESPONSE);
    }

    #[test]
    fn marker_only_yields_fallback() {
        assert_eq!(extract("Assistant: "), FALLBACK_RESPONSE);
        assert_eq!(extract("Assistant:"), FALLBACK_RESPONSE);
    }

    #[test]
    fn empty_input_yields_fallback() {
        assert_eq!(extract(""), FALLBACK_RESPONSE);
    }
}
