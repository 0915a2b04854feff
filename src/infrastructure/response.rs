use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[^\n]*\n(.*?)\n?```$").unwrap());

static STRAY_FENCE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"```").unwrap());

/// Removes enclosing Markdown code fences that models wrap around plain-text
/// answers, then any stray fence markers left inside.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();

    let unfenced = match FENCE_BLOCK_PATTERN.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    };

    STRAY_FENCE_PATTERN
        .replace_all(&unfenced, "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_plain_fence() {
        let input = "```\nسلام دنیا\n```";
        assert_eq!(strip_code_fences(input), "سلام دنیا");
    }

    #[test]
    fn test_strip_fence_with_language_tag() {
        let input = "```text\nHello there\n```";
        assert_eq!(strip_code_fences(input), "Hello there");
    }

    #[test]
    fn test_strip_multiline_fence() {
        let input = "```\nline one\nline two\n```";
        assert_eq!(strip_code_fences(input), "line one\nline two");
    }

    #[test]
    fn test_strip_stray_fences() {
        let input = "partial ``` marker";
        assert_eq!(strip_code_fences(input), "partial  marker");
    }

    #[test]
    fn test_preserves_unfenced_text() {
        let input = "An ordinary translation result.";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_trims_whitespace() {
        let input = "  padded result \n";
        assert_eq!(strip_code_fences(input), "padded result");
    }
}
