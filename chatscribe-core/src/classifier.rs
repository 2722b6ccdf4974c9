//! Content classifier that decides whether a capture looks like a chat transcript.
//!
//! Scoring is additive: a [`Signals`] pre-pass measures the text once, then
//! every [`Rule`] in the table reads its measurement and contributes points.
//! The verdict is a heuristic. False positives and negatives are expected.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Captures shorter than this (in characters) are rejected without scoring.
pub const MIN_CHARS: usize = 100;

/// Default acceptance threshold.
pub const DEFAULT_THRESHOLD: i32 = 6;

/// Emoji glyphs that commonly decorate agent replies.
const EMOJI_ALLOW_LIST: &[char] = &[
    '✅', '❌', '🎯', '🚀', '📋', '🔧', '💡', '⚡', '🛡', '👻',
];

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("classifier pattern must compile")
}

static USER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?mi)^[ \t]*(?:USER|You|👤)[\s:]"));

static AGENT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?mi)^[ \t]*(?:AGENT|AI|Assistant|🤖|Thought for)[\s:]"));

static IMAGE_REF: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)User uploaded image \d+"));

static MARKDOWN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?m)^#{1,3}[ \t]+[A-Z]"));

// Whole words only: a substring match would count "show" as "how".
static EXPLANATION_CUE: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(r"(?i)\b(?:explicar|explicación|cómo|how|why|porque|para que)\b")
});

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"(?s)```.*?```"));

static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| compile_regex(r"\n[ \t]*\n"));

static THOUGHT_TIMER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)Thought for \d+s"));

static PROGRESS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)Progress Updates|Files Edited|Task"));

static SOURCE_CODE: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        compile_regex(r"(?m)^import .+ from"),
        compile_regex(r"(?m)^export (?:default |const )"),
        compile_regex(r"(?m)^interface \w+"),
    ]
});

/// Measurements taken from a capture in one pass.
///
/// Rules only ever read these, which keeps each rule independent of the others
/// even when its condition mentions another rule's measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub user_markers: usize,
    pub agent_markers: usize,
    pub image_refs: usize,
    pub markdown_headers: usize,
    pub has_question: bool,
    pub has_explanation: bool,
    pub emojis: usize,
    pub code_blocks: usize,
    pub paragraphs: usize,
    pub has_thought_timer: bool,
    pub has_progress_markers: bool,
    pub looks_like_source: bool,
}

impl Signals {
    pub fn measure(text: &str) -> Self {
        let text = normalize_newlines(text);
        let text = text.as_str();

        Self {
            user_markers: USER_MARKER.find_iter(text).count(),
            agent_markers: AGENT_MARKER.find_iter(text).count(),
            image_refs: IMAGE_REF.find_iter(text).count(),
            markdown_headers: MARKDOWN_HEADER.find_iter(text).count(),
            has_question: text.contains('?') || text.contains('¿'),
            has_explanation: EXPLANATION_CUE.is_match(text),
            emojis: text.chars().filter(|c| EMOJI_ALLOW_LIST.contains(c)).count(),
            code_blocks: CODE_FENCE.find_iter(text).count(),
            paragraphs: PARAGRAPH_BREAK
                .split(text)
                .filter(|p| p.trim().chars().count() > 20)
                .count(),
            has_thought_timer: THOUGHT_TIMER.is_match(text),
            has_progress_markers: PROGRESS_MARKER.is_match(text),
            looks_like_source: SOURCE_CODE.iter().any(|re| re.is_match(text)),
        }
    }

    pub fn role_markers(&self) -> usize {
        self.user_markers + self.agent_markers
    }
}

/// How a rule turns its measurement into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    /// `points` per hit, optionally capped in total.
    PerHit { points: i32, cap: Option<i32> },
    /// `points` once the measurement reaches `min_hits`.
    Flat { points: i32, min_hits: usize },
}

/// A single scoring rule: a measurement plus a weight.
#[derive(Clone)]
pub struct Rule {
    pub label: &'static str,
    pub weight: Weight,
    measure: fn(&Signals) -> usize,
}

/// A rule that contributed to a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub label: &'static str,
    pub hits: usize,
    pub points: i32,
}

impl fmt::Display for RuleHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x{} ({:+})", self.label, self.hits, self.points)
    }
}

impl Rule {
    pub fn new(label: &'static str, weight: Weight, measure: fn(&Signals) -> usize) -> Self {
        Self {
            label,
            weight,
            measure,
        }
    }

    /// Evaluate this rule alone. Returns `None` when it does not fire.
    pub fn apply(&self, signals: &Signals) -> Option<RuleHit> {
        let hits = (self.measure)(signals);
        let points = match self.weight {
            Weight::PerHit { points, cap } if hits > 0 => {
                let raw = points.saturating_mul(i32::try_from(hits).unwrap_or(i32::MAX));
                cap.map_or(raw, |cap| raw.min(cap))
            }
            Weight::Flat { points, min_hits } if hits >= min_hits.max(1) => points,
            _ => return None,
        };

        Some(RuleHit {
            label: self.label,
            hits,
            points,
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Verdict for one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub accepted: bool,
    pub score: i32,
    pub threshold: i32,
    pub reasons: Vec<String>,
}

impl Classification {
    fn too_short(chars: usize, threshold: i32) -> Self {
        Self {
            accepted: false,
            score: 0,
            threshold,
            reasons: vec![format!("too short: {chars} < {MIN_CHARS} chars")],
        }
    }
}

/// Weighted-rule classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
    threshold: i32,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

impl Classifier {
    pub fn new(rules: Vec<Rule>, threshold: i32) -> Self {
        Self { rules, threshold }
    }

    /// The built-in rule table with [`DEFAULT_THRESHOLD`].
    pub fn with_default_rules() -> Self {
        Self::new(default_rules(), DEFAULT_THRESHOLD)
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Score `text`. Pure: identical input yields an identical verdict.
    pub fn classify(&self, text: &str) -> Classification {
        let chars = text.chars().count();
        if chars < MIN_CHARS {
            return Classification::too_short(chars, self.threshold);
        }

        let signals = Signals::measure(text);
        let hits: Vec<RuleHit> = self
            .rules
            .iter()
            .filter_map(|rule| rule.apply(&signals))
            .collect();

        let score: i32 = hits.iter().map(|hit| hit.points).sum();
        let accepted = score >= self.threshold;

        debug!(
            score,
            threshold = self.threshold,
            accepted,
            chars,
            "classified capture"
        );
        for hit in &hits {
            debug!("  {}", hit);
        }

        Classification {
            accepted,
            score,
            threshold: self.threshold,
            reasons: hits.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The rule table used by [`Classifier::with_default_rules`].
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "role markers",
            Weight::PerHit { points: 2, cap: None },
            Signals::role_markers,
        ),
        Rule::new(
            "uploaded images",
            Weight::PerHit { points: 3, cap: None },
            |s| s.image_refs,
        ),
        Rule::new(
            "markdown sections",
            Weight::Flat { points: 2, min_hits: 2 },
            |s| s.markdown_headers,
        ),
        Rule::new(
            "question and explanation",
            Weight::Flat { points: 3, min_hits: 1 },
            |s| usize::from(s.has_question && s.has_explanation),
        ),
        Rule::new(
            "emojis",
            Weight::PerHit { points: 1, cap: Some(3) },
            |s| s.emojis,
        ),
        Rule::new(
            "code blocks in conversation",
            Weight::Flat { points: 2, min_hits: 1 },
            |s| if s.role_markers() > 0 { s.code_blocks } else { 0 },
        ),
        Rule::new(
            "paragraphs",
            Weight::Flat { points: 2, min_hits: 3 },
            |s| s.paragraphs,
        ),
        Rule::new(
            "thought timer",
            Weight::Flat { points: 4, min_hits: 1 },
            |s| usize::from(s.has_thought_timer),
        ),
        Rule::new(
            "progress markers",
            Weight::Flat { points: 3, min_hits: 1 },
            |s| usize::from(s.has_progress_markers),
        ),
        Rule::new(
            "source code without chat context",
            Weight::Flat { points: -5, min_hits: 1 },
            |s| usize::from(s.looks_like_source && s.role_markers() == 0 && s.image_refs == 0),
        ),
    ]
}

pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "This paragraph is ordinary prose that pads the capture well past the minimum length.";

    fn rule(label: &str) -> Rule {
        default_rules()
            .into_iter()
            .find(|r| r.label == label)
            .unwrap()
    }

    #[test]
    fn test_short_text_is_rejected_without_scoring() {
        let classifier = Classifier::default();
        let verdict = classifier.classify("USER: hi\nAGENT: hello ✅✅✅ Thought for 3s");
        assert!(!verdict.accepted);
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn test_short_text_counts_chars_not_bytes() {
        // 60 emoji are 240 bytes but only 60 chars
        let text = "🚀".repeat(60);
        let verdict = Classifier::default().classify(&text);
        assert_eq!(verdict.score, 0);
        assert!(!verdict.accepted);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let text = format!("USER: why does this fail?\n\n{FILLER}\n\nAGENT: because ✅\n\n{FILLER}");
        let classifier = Classifier::default();
        assert_eq!(classifier.classify(&text), classifier.classify(&text));
    }

    #[test]
    fn test_role_markers_score_per_occurrence() {
        let signals = Signals::measure("USER: a\nAGENT: b\n  You: c\n🤖 d\nAssistant: e");
        assert_eq!(signals.user_markers, 2);
        assert_eq!(signals.agent_markers, 3);

        let hit = rule("role markers").apply(&signals).unwrap();
        assert_eq!(hit.points, 10);
    }

    #[test]
    fn test_marker_requires_separator() {
        let signals = Signals::measure("Your code is fine\nAIR quality\nuserland");
        assert_eq!(signals.role_markers(), 0);
    }

    #[test]
    fn test_image_refs_are_strong_signal() {
        let signals = Signals::measure("User uploaded image 1\nuser uploaded image 2");
        let hit = rule("uploaded images").apply(&signals).unwrap();
        assert_eq!(hit.points, 6);
    }

    #[test]
    fn test_markdown_headers_need_two() {
        let one = Signals::measure("## Summary\nbody");
        assert!(rule("markdown sections").apply(&one).is_none());

        let two = Signals::measure("## Summary\nbody\n### Details\nmore\n#### Ignored");
        assert_eq!(two.markdown_headers, 2);
        assert_eq!(rule("markdown sections").apply(&two).unwrap().points, 2);
    }

    #[test]
    fn test_question_needs_explanation_cue() {
        let only_question = Signals::measure("Is this right?");
        assert!(rule("question and explanation").apply(&only_question).is_none());

        let both = Signals::measure("¿Cómo funciona esto?");
        assert_eq!(
            rule("question and explanation").apply(&both).unwrap().points,
            3
        );
    }

    #[test]
    fn test_explanation_cues_match_whole_words() {
        assert!(!Signals::measure("Can you show the output?").has_explanation);
        assert!(!Signals::measure("Anyhow, somewhy it broke?").has_explanation);
        assert!(Signals::measure("So how does it work?").has_explanation);
    }

    #[test]
    fn test_emoji_points_are_capped() {
        let signals = Signals::measure("✅ ❌ 🎯 🚀 📋 🔧");
        assert_eq!(signals.emojis, 6);
        assert_eq!(rule("emojis").apply(&signals).unwrap().points, 3);
    }

    #[test]
    fn test_code_blocks_only_count_inside_conversation() {
        let code_only = Signals::measure("```rust\nfn main() {}\n```");
        assert!(rule("code blocks in conversation").apply(&code_only).is_none());

        let in_chat = Signals::measure("USER: show me\n```rust\nfn main() {}\n```");
        assert_eq!(
            rule("code blocks in conversation").apply(&in_chat).unwrap().points,
            2
        );
    }

    #[test]
    fn test_paragraphs_need_three_long_blocks() {
        let text = format!("{FILLER}\n\nshort\n\n{FILLER}\r\n\r\n{FILLER}");
        let signals = Signals::measure(&text);
        assert_eq!(signals.paragraphs, 3);
        assert_eq!(rule("paragraphs").apply(&signals).unwrap().points, 2);
    }

    #[test]
    fn test_thought_timer_and_progress_markers() {
        let signals = Signals::measure("Thought for 12s\nProgress Updates\nFiles Edited");
        assert_eq!(rule("thought timer").apply(&signals).unwrap().points, 4);
        assert_eq!(rule("progress markers").apply(&signals).unwrap().points, 3);
    }

    #[test]
    fn test_source_penalty_skipped_with_chat_context() {
        let source = Signals::measure("import x from 'y'\nexport default x");
        assert_eq!(
            rule("source code without chat context").apply(&source).unwrap().points,
            -5
        );

        let chat = Signals::measure("USER: what does this do\nimport x from 'y'");
        assert!(rule("source code without chat context").apply(&chat).is_none());
    }

    #[test]
    fn test_typescript_source_is_rejected() {
        let source = r#"import { useState } from 'react';
import type { Props } from './types';

export interface ButtonProps {
  label: string;
  onClick: () => void;
}

export default function Button({ label, onClick }: ButtonProps) {
  const [pressed, setPressed] = useState(false);
  return <button onClick={() => { setPressed(!pressed); onClick(); }}>{label}</button>;
}
"#;
        let verdict = Classifier::default().classify(source);
        assert!(!verdict.accepted, "score was {}", verdict.score);
        assert!(verdict.score < 0);
    }

    #[test]
    fn test_conversation_with_structure_is_accepted() {
        let text = format!(
            "## Question\n\nUSER: What is a for-loop?\n\n## Answer\n\nAGENT: It repeats code. 🔧\n\n{FILLER}"
        );
        let verdict = Classifier::default().classify(&text);
        // markers 4 + headers 2 + emoji 1
        assert!(verdict.accepted, "score was {}", verdict.score);
        assert!(verdict.score >= 7);
        assert!(verdict.reasons.iter().any(|r| r.starts_with("role markers")));
    }

    #[test]
    fn test_threshold_is_tunable() {
        let text = format!("USER: hello there\n\n{FILLER}\n\nAGENT: hi 🔧");
        let strict = Classifier::default().with_threshold(20).classify(&text);
        assert!(!strict.accepted);
        assert_eq!(strict.threshold, 20);

        let lenient = Classifier::default().with_threshold(1).classify(&text);
        assert!(lenient.accepted);
    }

    #[test]
    fn test_rule_hit_display() {
        let hit = RuleHit {
            label: "emojis",
            hits: 5,
            points: 3,
        };
        assert_eq!(hit.to_string(), "emojis x5 (+3)");
    }
}
