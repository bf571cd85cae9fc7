//! Answer quality gate.
//!
//! The gate is the one place answer-acceptance policy lives: a pure decision
//! over a [`QueryOutcome`] that either presents the synthesized answer or
//! replaces it with a single fixed fallback. Every rejection yields the
//! same fallback text.

use serde::{Deserialize, Serialize};

use crate::document::QueryOutcome;

/// The gate's decision for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    /// Whether the synthesized answer was accepted.
    pub has_answer: bool,
    /// The user-facing text: the answer when accepted, the fallback otherwise.
    pub answer: String,
    /// Source link from the top retrieved chunk, present only on acceptance.
    pub article_url: Option<String>,
}

/// Configurable acceptance policy, applied in rule order (first match wins).
///
/// All knobs are deployment configuration, not code branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatePolicy {
    /// Minimum character count of the trimmed answer. Guards against
    /// degenerate one-word answers.
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
    /// Phrases (any language) that mean "no information found". Matched
    /// case-insensitively against the answer text.
    #[serde(default = "default_negative_markers")]
    pub negative_markers: Vec<String>,
    /// When set, an otherwise valid answer is rejected unless the top
    /// retrieved chunk carries a source link.
    #[serde(default)]
    pub require_source_url: bool,
    /// The fixed text shown for every rejection.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

fn default_min_answer_chars() -> usize {
    20
}

fn default_negative_markers() -> Vec<String> {
    // Deployments answer in English or Russian; both sets stay in the defaults.
    [
        "no information",
        "not enough information",
        "i don't know",
        "cannot answer",
        "нет информации",
        "не найдено",
        "информация не найдена",
        "не могу ответить",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_fallback_message() -> String {
    "Sorry, I couldn't find an answer to that. Would you like to talk to a human operator?"
        .to_string()
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            min_answer_chars: default_min_answer_chars(),
            negative_markers: default_negative_markers(),
            require_source_url: false,
            fallback_message: default_fallback_message(),
        }
    }
}

impl GatePolicy {
    /// Classify a raw query outcome as an accepted answer or a fallback.
    ///
    /// Pure: the verdict depends only on `outcome` and this policy.
    pub fn evaluate(&self, outcome: &QueryOutcome) -> Verdict {
        if outcome.retrieved.is_empty() {
            return self.reject();
        }

        let answer = outcome.answer_text.trim();
        if answer.is_empty() {
            return self.reject();
        }

        let lowered = answer.to_lowercase();
        if self.negative_markers.iter().any(|m| lowered.contains(&m.to_lowercase())) {
            return self.reject();
        }

        if answer.chars().count() < self.min_answer_chars {
            return self.reject();
        }

        let article_url = outcome.retrieved[0].chunk.url().map(str::to_string);
        if self.require_source_url && article_url.is_none() {
            return self.reject();
        }

        Verdict { has_answer: true, answer: answer.to_string(), article_url }
    }

    fn reject(&self) -> Verdict {
        Verdict { has_answer: false, answer: self.fallback_message.clone(), article_url: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, Document, ScoredChunk};

    fn outcome(answer: &str, url: Option<&str>) -> QueryOutcome {
        let mut doc = Document::new("doc1", "The deadline is Friday at noon.", "Deadlines");
        if let Some(url) = url {
            doc = doc.with_url(url);
        }
        let mut chunk = Chunk::new(&doc, 0, doc.text.clone());
        chunk.embedding = vec![1.0, 0.0];
        QueryOutcome {
            answer_text: answer.to_string(),
            retrieved: vec![ScoredChunk { chunk, score: 0.9 }],
        }
    }

    #[test]
    fn rejects_without_grounding_evidence() {
        let verdict = GatePolicy::default().evaluate(&QueryOutcome::empty());
        assert!(!verdict.has_answer);
        assert_eq!(verdict.article_url, None);
        assert_eq!(verdict.answer, GatePolicy::default().fallback_message);
    }

    #[test]
    fn rejects_blank_answer() {
        let verdict = GatePolicy::default().evaluate(&outcome("   \n ", Some("https://x/doc1")));
        assert!(!verdict.has_answer);
    }

    #[test]
    fn accepts_grounded_answer_with_source() {
        let verdict = GatePolicy::default()
            .evaluate(&outcome("The deadline is Friday at noon.", Some("https://x/doc1")));
        assert!(verdict.has_answer);
        assert_eq!(verdict.answer, "The deadline is Friday at noon.");
        assert_eq!(verdict.article_url.as_deref(), Some("https://x/doc1"));
    }

    #[test]
    fn rejects_negative_marker_regardless_of_evidence() {
        let verdict =
            GatePolicy::default().evaluate(&outcome("No information found.", Some("https://x/1")));
        assert!(!verdict.has_answer);
        assert_eq!(verdict.article_url, None);
    }

    #[test]
    fn negative_markers_match_case_insensitively() {
        let policy = GatePolicy::default();
        assert!(!policy.evaluate(&outcome("НЕТ ИНФОРМАЦИИ по этому вопросу.", None)).has_answer);
        assert!(!policy.evaluate(&outcome("Unfortunately I DON'T KNOW that.", None)).has_answer);
    }

    #[test]
    fn rejects_degenerate_short_answer() {
        let verdict = GatePolicy::default().evaluate(&outcome("Friday.", Some("https://x/1")));
        assert!(!verdict.has_answer);
    }

    #[test]
    fn strict_mode_requires_source_link() {
        let policy = GatePolicy { require_source_url: true, ..GatePolicy::default() };
        let verdict = policy.evaluate(&outcome("The deadline is Friday at noon.", None));
        assert!(!verdict.has_answer);

        // The same answer with a link passes.
        let verdict = policy.evaluate(&outcome("The deadline is Friday at noon.", Some("https://x/1")));
        assert!(verdict.has_answer);
    }

    #[test]
    fn lenient_mode_accepts_missing_source_link() {
        let verdict =
            GatePolicy::default().evaluate(&outcome("The deadline is Friday at noon.", None));
        assert!(verdict.has_answer);
        assert_eq!(verdict.article_url, None);
    }

    #[test]
    fn rejection_text_is_uniform() {
        let policy = GatePolicy::default();
        let blank = policy.evaluate(&outcome(" ", None));
        let negative = policy.evaluate(&outcome("No information found.", None));
        let ungrounded = policy.evaluate(&QueryOutcome::empty());
        assert_eq!(blank, negative);
        assert_eq!(negative, ungrounded);
    }
}
