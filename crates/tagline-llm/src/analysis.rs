// Extraction of the analysis object from model output text

use tagline_types::AnalysisResult;

/// Parse the model's JSON answer, tolerating a surrounding Markdown code fence
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, String> {
    let trimmed = strip_code_fence(text.trim());
    serde_json::from_str::<AnalysisResult>(trimmed)
        .map_err(|e| format!("malformed analysis JSON: {}", e))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let result = parse_analysis(r#"{"index_title": "Rust lifetimes", "tags": ["rust", "borrowck"]}"#).unwrap();
        assert_eq!(result.index_title, "Rust lifetimes");
        assert_eq!(result.tags, vec!["rust", "borrowck"]);
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"index_title\": \"T\", \"tags\": [\"x\"]}\n```\n";
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.index_title, "T");
        assert_eq!(result.tags, vec!["x"]);
    }

    #[test]
    fn test_missing_title_is_error() {
        assert!(parse_analysis(r#"{"tags": ["x"]}"#).is_err());
        assert!(parse_analysis("not json").is_err());
    }
}
