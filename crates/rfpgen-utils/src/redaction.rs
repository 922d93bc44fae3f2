//! Secret redaction for log lines and user-facing error text.
//!
//! Provider error bodies and transport errors can echo request URLs or API
//! keys back at us. Everything that leaves the process through a log event or
//! an error message goes through [`redact_secrets`] first.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern to match URLs with embedded credentials
static URL_WITH_CREDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(https?://)[^:@\s]+:[^@\s]+@").expect("URL credential pattern is valid")
});

/// Pattern to match bearer tokens in echoed headers
static BEARER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+").expect("bearer pattern is valid")
});

/// Pattern to match potential API keys (long alphanumeric strings)
///
/// Matches sequences of 32+ characters that are alphanumeric, underscore, or dash.
static POTENTIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}(?:[^A-Za-z0-9_-]|$)")
        .expect("key pattern is valid")
});

/// Redact sensitive information from a message.
///
/// Redaction rules:
/// - URLs with embedded credentials keep scheme and host only
/// - bearer tokens are replaced
/// - long key-like tokens are replaced with `[REDACTED_KEY]`
#[must_use]
pub fn redact_secrets(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = BEARER_TOKEN.replace_all(&redacted, "${1}[REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, |caps: &regex::Captures<'_>| {
        let matched = &caps[0];
        let lead = matched
            .chars()
            .next()
            .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'));
        let trail = matched
            .chars()
            .last()
            .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'));
        let mut out = String::new();
        if let Some(c) = lead {
            out.push(c);
        }
        out.push_str("[REDACTED_KEY]");
        if let Some(c) = trail {
            out.push(c);
        }
        out
    });
    redacted.into_owned()
}
