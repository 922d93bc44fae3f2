//! Prompt construction for both generation phases.
//!
//! Each builder returns three messages: a system brief, the working material,
//! and a closing self-check the model runs before answering.

use rfpgen_config::{Config, DEFAULT_PROMPT_MAX_REFERENCES, DEFAULT_PROMPT_MIN_SCORE};
use rfpgen_llm::Message;
use rfpgen_retrieval::SimilarMatch;
use rfpgen_utils::types::ProviderId;

/// Words of a reference requirement quoted in its source title
const TITLE_WORDS: usize = 5;

/// Which retrieved references are quoted in the Phase 1 prompt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptSettings {
    pub min_score: f32,
    pub max_references: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_PROMPT_MIN_SCORE,
            max_references: DEFAULT_PROMPT_MAX_REFERENCES,
        }
    }
}

impl PromptSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_score: config.prompt_min_score(),
            max_references: config.prompt_max_references(),
        }
    }
}

const PHASE1_VALIDATION: &str = "Review the draft response against these checks before answering:
1. Every statement comes from the previous responses provided.
2. The response is at most 200 words.
3. The tone is professional and aimed at business readers.
4. There is no meta-text, speculation or hedging.
5. The response states a clear value proposition for this requirement.
6. Every factual claim cites its source title and similarity score.
7. Nothing appears that cannot be traced back to a source.

Revise the response if any check fails, then output only the final response.";

const PHASE2_VALIDATION: &str = "FINAL CHECKS:
1. Does the response fully address the requirement?
2. Is every statement taken from the provided responses?
3. Is it roughly 200 words?
4. Is the language clear, professional and free of needless jargon?
5. Does it name concrete capabilities and a clear value proposition?
6. Can it be submitted without further editing?

Revise the response if any check fails, then output only the final response.";

/// Short label for a reference: its first five words
fn source_title(requirement: &str) -> String {
    let words: Vec<&str> = requirement.split_whitespace().take(TITLE_WORDS).collect();
    let mut title = words.join(" ");
    if words.len() >= TITLE_WORDS {
        title.push_str("...");
    }
    title
}

/// References that qualify for quoting, in ranked order
fn qualifying<'a>(
    references: &'a [SimilarMatch],
    settings: &PromptSettings,
) -> impl Iterator<Item = &'a SimilarMatch> {
    references
        .iter()
        .filter(move |r| r.score >= settings.min_score)
        .take(settings.max_references)
}

fn format_sources(references: &[SimilarMatch], settings: &PromptSettings) -> String {
    let mut out = String::new();
    for (i, reference) in qualifying(references, settings).enumerate() {
        let label = reference
            .label
            .as_deref()
            .map(|l| format!(" for {l}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "**Source {}: {}{} (Similarity: {:.2})**\nOriginal Requirement: {}\nPrevious Response: {}\n\n",
            i + 1,
            source_title(&reference.requirement),
            label,
            reference.score,
            reference.requirement,
            reference.response,
        ));
    }
    if out.is_empty() {
        out.push_str("(no previous responses met the similarity threshold)\n");
    }
    out
}

/// Messages asking one provider to answer `requirement` from its references.
#[must_use]
pub fn phase1_messages(
    requirement: &str,
    category: Option<&str>,
    references: &[SimilarMatch],
    settings: &PromptSettings,
) -> Vec<Message> {
    let category = category.unwrap_or("Unspecified");
    let system = format!(
        r"You are a senior RFP specialist with over 15 years of experience in wealth management software.
You write precise, business-aligned answers to RFP requirements.

CONTEXT:
- Domain: Wealth Management Software
- Requirement Category: {category}
- Current Requirement: {requirement}
- Audience: business decision-makers in wealth management

TASK:
Answer the current requirement using ONLY the previous responses supplied, preferring those with higher similarity scores.

RULES:
1. Professional, clear and concise; about 200 words; ready for submission.
2. Open with the most relevant capability, support it with specifics, close with the business value.
3. Cite the source title and similarity score for every factual claim.
4. Never add content the sources do not support, and never include commentary about the answer itself."
    );

    let user = format!(
        r"Previous responses and their similarity scores:

{}
Instructions:
1. Use only responses scoring {:.2} or higher.
2. Draft a response that follows every rule in the system message.
3. Leave out any claim the sources do not support.

Current Requirement: {requirement}",
        format_sources(references, settings),
        settings.min_score,
    );

    vec![
        Message::system(system),
        Message::user(user),
        Message::user(PHASE1_VALIDATION),
    ]
}

/// Messages asking the synthesis route to merge the Phase 1 answers.
///
/// `outputs` holds the non-empty provider answers; providers without one are
/// simply not listed.
#[must_use]
pub fn phase2_messages(requirement: &str, outputs: &[(ProviderId, String)]) -> Vec<Message> {
    let system = format!(
        r"You are a senior RFP specialist at a financial technology company with 15+ years of experience winning wealth management RFPs.

OBJECTIVE:
Combine several candidate responses into one response that directly addresses the requirement: {requirement}

SYNTHESIS RULES:
1. Lead with the strongest capability, then supporting specifics, then the business impact.
2. Merge overlapping points and resolve contradictions in favour of the most relevant detail.
3. Keep specific metrics and terminology intact.
4. Use only information present in the candidate responses.
5. Produce a single response of about 200 words with no meta-commentary and no mention of the sources."
    );

    let mut sources = String::new();
    for (provider, text) in outputs {
        sources.push_str(&format!("{} Response:\n{}\n\n", provider.display_name(), text));
    }

    let user = format!(
        r"REQUIREMENT TO ADDRESS:
{requirement}

SOURCE RESPONSES TO SYNTHESIZE:
{sources}Provide the synthesized response that best addresses the requirement."
    );

    vec![
        Message::system(system),
        Message::user(user),
        Message::user(PHASE2_VALIDATION),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfpgen_llm::Role;

    fn reference(requirement: &str, score: f32) -> SimilarMatch {
        SimilarMatch {
            category: None,
            requirement: requirement.to_string(),
            response: format!("answer to {requirement}"),
            label: None,
            score,
        }
    }

    #[test]
    fn test_phase1_has_three_messages() {
        let messages = phase1_messages("Supports SSO", Some("Security"), &[], &PromptSettings::default());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("Requirement Category: Security"));
        assert!(messages[1].content.contains("Current Requirement: Supports SSO"));
        assert!(messages[1].content.contains("no previous responses met"));
    }

    #[test]
    fn test_phase1_quotes_only_qualifying_references() {
        let refs = vec![
            reference("Portfolio rebalancing across multiple custodians daily", 0.95),
            reference("Low match", 0.5),
            reference("Second strong", 0.92),
            reference("Third strong", 0.91),
            reference("Fourth strong", 0.90),
        ];
        let messages = phase1_messages("r", None, &refs, &PromptSettings::default());
        let user = &messages[1].content;

        assert!(user.contains("**Source 1: Portfolio rebalancing across multiple custodians... (Similarity: 0.95)**"));
        assert!(user.contains("**Source 2: Second strong (Similarity: 0.92)**"));
        assert!(user.contains("Source 3: Third strong"));
        assert!(!user.contains("Source 4"));
        assert!(!user.contains("Low match"));
    }

    #[test]
    fn test_phase2_lists_only_present_outputs() {
        let outputs = vec![
            (ProviderId::OpenAi, "A-text".to_string()),
            (ProviderId::DeepSeek, "C-text".to_string()),
        ];
        let messages = phase2_messages("Supports SSO", &outputs);
        let user = &messages[1].content;

        assert!(user.contains("OpenAI Response:\nA-text"));
        assert!(user.contains("DeepSeek Response:\nC-text"));
        assert!(!user.contains("Anthropic Response:"));
        assert!(messages[2].content.starts_with("FINAL CHECKS"));
    }

    #[test]
    fn test_source_title_truncates_to_five_words() {
        assert_eq!(source_title("one two three"), "one two three");
        assert_eq!(source_title("a b c d e f g"), "a b c d e...");
    }
}
