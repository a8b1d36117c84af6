//! Intent and urgency classification
//!
//! A pure, table-driven classifier: intent comes from a static keyword
//! table with per-category priority weights, urgency from an independent
//! keyword table. The two never imply each other - "I need housing
//! tonight" is (housing, high), not (emergency, critical).

use unicode_segmentation::UnicodeSegmentation;

use support_agent_core::{ResourceCategory, UrgencyLevel};

use crate::fingerprint::normalize_message;

/// One row of the intent keyword table.
///
/// Multi-word keywords match as substrings of the normalized utterance;
/// single-word keywords match whole tokens.
struct IntentRule {
    category: ResourceCategory,
    /// Higher weight wins when several categories match
    priority: u8,
    keywords: &'static [&'static str],
}

/// Intent keyword table, iterated in declaration order. Declaration order
/// is the final tie-break, so earlier rows win exact ties.
static INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        category: ResourceCategory::Emergency,
        priority: 100,
        keywords: &[
            "emergency",
            "urgent help",
            "help now",
            "crisis",
            "000",
            "police",
            "ambulance",
            "fire",
            "suicide",
            "danger",
            "domestic violence",
            "assault",
            "bleeding",
            "life threatening",
        ],
    },
    IntentRule {
        category: ResourceCategory::Exploitation,
        priority: 90,
        keywords: &[
            "exploitation",
            "exploited",
            "underpaid",
            "wage theft",
            "unfair pay",
            "unsafe work",
            "not paid",
            "rights at work",
        ],
    },
    IntentRule {
        category: ResourceCategory::Housing,
        priority: 50,
        keywords: &[
            "house",
            "housing",
            "rent",
            "accommodation",
            "homeless",
            "shelter",
            "eviction",
            "tenant",
            "lease",
        ],
    },
    IntentRule {
        category: ResourceCategory::Healthcare,
        priority: 50,
        keywords: &[
            "doctor",
            "hospital",
            "medicare",
            "health",
            "medical",
            "sick",
            "medicine",
            "gp",
            "counselling",
            "mental health",
        ],
    },
    IntentRule {
        category: ResourceCategory::Employment,
        priority: 50,
        keywords: &[
            "job",
            "work",
            "employment",
            "career",
            "skill",
            "qualification",
            "business",
            "training",
            "resume",
        ],
    },
    IntentRule {
        category: ResourceCategory::Education,
        priority: 50,
        keywords: &[
            "school",
            "education",
            "study",
            "english class",
            "university",
            "tafe",
            "course",
            "enrol",
        ],
    },
    IntentRule {
        category: ResourceCategory::Legal,
        priority: 50,
        keywords: &[
            "lawyer",
            "legal",
            "visa",
            "court",
            "immigration",
            "asylum",
            "appeal",
            "legal aid",
        ],
    },
    IntentRule {
        category: ResourceCategory::Financial,
        priority: 50,
        keywords: &[
            "money",
            "financial",
            "food bank",
            "no money",
            "afford",
            "debt",
            "bills",
            "vouchers",
            "payment",
        ],
    },
    IntentRule {
        category: ResourceCategory::DigitalAssistance,
        priority: 50,
        keywords: &[
            "mygov",
            "online",
            "computer",
            "internet",
            "email",
            "digital",
            "website",
            "centrelink",
            "app",
        ],
    },
];

/// Urgency keyword table, checked in declaration order (critical first).
static URGENCY_RULES: &[(UrgencyLevel, &[&str])] = &[
    (
        UrgencyLevel::Critical,
        &[
            "emergency",
            "urgent",
            "right now",
            "immediately",
            "crisis",
            "suicide",
            "danger",
            "life threatening",
            "000",
        ],
    ),
    (
        UrgencyLevel::High,
        &[
            "today",
            "tonight",
            "asap",
            "homeless",
            "eviction",
            "no food",
            "this week",
            "soon",
        ],
    ),
    (
        UrgencyLevel::Low,
        &[
            "sometime",
            "eventually",
            "curious",
            "just wondering",
            "information only",
            "later",
            "planning",
        ],
    ),
];

/// Classification output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub intent: ResourceCategory,
    pub urgency: UrgencyLevel,
    /// Fraction of keyword groups (intent, urgency) that matched.
    /// Logging and telemetry only - never used for branching.
    pub confidence: f32,
}

/// Deterministic intent and urgency classifier
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an utterance. Never fails: an utterance matching nothing
    /// classifies as (general, standard, 0.0).
    pub fn classify(&self, utterance: &str) -> Classification {
        let normalized = normalize_message(utterance);
        let tokens: std::collections::HashSet<&str> = normalized.unicode_words().collect();

        let mut best: Option<(&IntentRule, usize)> = None;
        for rule in INTENT_RULES {
            let matched = Self::matched_tokens(&normalized, &tokens, rule.keywords);
            if matched == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, current_matched)) => {
                    (rule.priority, matched) > (current.priority, current_matched)
                }
            };
            if better {
                best = Some((rule, matched));
            }
        }

        let urgency = Self::classify_urgency(&normalized, &tokens);

        let (intent, intent_matched) = match best {
            Some((rule, _)) => (rule.category, true),
            None => (ResourceCategory::General, false),
        };

        let urgency_matched = urgency != UrgencyLevel::Standard;
        let confidence = match (intent_matched, urgency_matched) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.5,
            (false, false) => 0.0,
        };

        tracing::debug!(
            intent = %intent,
            urgency = %urgency,
            confidence,
            "Classified utterance"
        );

        Classification {
            intent,
            urgency,
            confidence,
        }
    }

    /// Count matched tokens for a keyword set. A multi-word keyword
    /// contributes one count per word, so longer matches outweigh single
    /// tokens when breaking priority ties.
    fn matched_tokens(
        normalized: &str,
        tokens: &std::collections::HashSet<&str>,
        keywords: &[&str],
    ) -> usize {
        keywords
            .iter()
            .map(|keyword| {
                if keyword.contains(' ') {
                    if normalized.contains(keyword) {
                        keyword.split_whitespace().count()
                    } else {
                        0
                    }
                } else if tokens.contains(keyword) {
                    1
                } else {
                    0
                }
            })
            .sum()
    }

    /// Urgency is derived from its own keyword table, independent of
    /// intent. First matching tier in table order wins.
    fn classify_urgency(
        normalized: &str,
        tokens: &std::collections::HashSet<&str>,
    ) -> UrgencyLevel {
        for (level, keywords) in URGENCY_RULES {
            if Self::matched_tokens(normalized, tokens, keywords) > 0 {
                return *level;
            }
        }
        UrgencyLevel::Standard
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
