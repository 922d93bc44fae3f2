//! Deterministic placeholder for a final response with no generated content.

/// Longest requirement excerpt quoted in the fallback text, in characters
pub const FALLBACK_EXCERPT_CHARS: usize = 160;

/// Build the fallback final response for `requirement`.
///
/// The result depends only on the input and is never empty.
///
/// ```rust
/// use rfpgen_utils::fallback::fallback_response;
///
/// assert_eq!(
///     fallback_response("  Supports SSO "),
///     "No generated response is available yet for requirement: \"Supports SSO\""
/// );
/// assert!(fallback_response("").contains("(requirement text unavailable)"));
/// ```
#[must_use]
pub fn fallback_response(requirement: &str) -> String {
    let trimmed = requirement.trim();
    let excerpt = if trimmed.is_empty() {
        "(requirement text unavailable)".to_string()
    } else if trimmed.chars().count() > FALLBACK_EXCERPT_CHARS {
        let head: String = trimmed.chars().take(FALLBACK_EXCERPT_CHARS).collect();
        format!("{}...", head.trim_end())
    } else {
        trimmed.to_string()
    };
    format!("No generated response is available yet for requirement: \"{excerpt}\"")
}
