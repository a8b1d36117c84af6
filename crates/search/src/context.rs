//! Conversation context analysis
//!
//! Infers "hidden needs" - related service categories the user has not
//! explicitly asked for - from the intents seen earlier in the
//! conversation. Advisory only: suggestions are appended to responses and
//! never reorder or suppress primary results.

use support_agent_core::{HistoryTurn, ResourceCategory};

/// Maximum hidden-need suggestions per response
pub const MAX_HIDDEN_NEEDS: usize = 3;

/// Intent adjacency table: (seen intent, suggested intent, base score).
/// Declaration order is the deterministic tie-break for equal scores.
static ADJACENCY: &[(ResourceCategory, ResourceCategory, f32)] = &[
    (ResourceCategory::Housing, ResourceCategory::Financial, 0.6),
    (ResourceCategory::Housing, ResourceCategory::Employment, 0.4),
    (ResourceCategory::Exploitation, ResourceCategory::Legal, 0.7),
    (ResourceCategory::Legal, ResourceCategory::Healthcare, 0.4),
    (
        ResourceCategory::DigitalAssistance,
        ResourceCategory::Financial,
        0.5,
    ),
    (ResourceCategory::Employment, ResourceCategory::Education, 0.5),
    (ResourceCategory::Emergency, ResourceCategory::Healthcare, 0.5),
    (ResourceCategory::Healthcare, ResourceCategory::Financial, 0.3),
    (ResourceCategory::Education, ResourceCategory::Employment, 0.3),
    (ResourceCategory::Financial, ResourceCategory::Housing, 0.3),
];

/// A suggested related need
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenNeed {
    pub intent: ResourceCategory,
    pub confidence: f32,
}

/// Conversation stage, derived from history length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStage {
    Greeting,
    NeedsAssessment,
    ServiceMatching,
    FollowUp,
}

impl ConversationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStage::Greeting => "greeting",
            ConversationStage::NeedsAssessment => "needs_assessment",
            ConversationStage::ServiceMatching => "service_matching",
            ConversationStage::FollowUp => "follow_up",
        }
    }
}

/// Hidden-need and conversation-stage analyzer
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Infer hidden needs from history.
    ///
    /// For every historical intent, its adjacency scores accumulate onto
    /// candidate intents. The current intent and any intent already
    /// surfaced in the result set are excluded. Output is sorted by
    /// accumulated score descending, ties by table declaration order,
    /// bounded to `MAX_HIDDEN_NEEDS`.
    pub fn analyze(
        &self,
        history: &[HistoryTurn],
        current_intent: ResourceCategory,
        surfaced: &[ResourceCategory],
    ) -> Vec<HiddenNeed> {
        // candidate -> (accumulated score, first declaration index)
        let mut scores: Vec<(ResourceCategory, f32, usize)> = Vec::new();

        let mut seen_intents: Vec<ResourceCategory> = history
            .iter()
            .filter_map(|turn| ResourceCategory::parse(&turn.intent))
            .collect();
        seen_intents.push(current_intent);

        for seen in &seen_intents {
            for (index, (from, to, base)) in ADJACENCY.iter().enumerate() {
                if from != seen {
                    continue;
                }
                if *to == current_intent || surfaced.contains(to) {
                    continue;
                }
                if let Some(entry) = scores.iter_mut().find(|entry| entry.0 == *to) {
                    entry.1 += *base;
                } else {
                    scores.push((*to, *base, index));
                }
            }
        }

        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.2.cmp(&b.2)));

        scores
            .into_iter()
            .take(MAX_HIDDEN_NEEDS)
            .map(|(intent, score, _)| HiddenNeed {
                intent,
                confidence: score.min(1.0),
            })
            .collect()
    }

    /// Conversation stage by history length
    pub fn stage(&self, history: &[HistoryTurn]) -> ConversationStage {
        match history.len() {
            0 => ConversationStage::Greeting,
            1 => ConversationStage::NeedsAssessment,
            2..=4 => ConversationStage::ServiceMatching,
            _ => ConversationStage::FollowUp,
        }
    }
}

impl Default for ContextAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(intent: &str) -> HistoryTurn {
        HistoryTurn {
            utterance: String::new(),
            intent: intent.to_string(),
        }
    }

    #[test]
    fn test_empty_history_uses_current_intent() {
        let analyzer = ContextAnalyzer::new();
        let needs = analyzer.analyze(&[], ResourceCategory::Housing, &[]);
        // housing -> financial (0.6) and housing -> employment (0.4)
        assert_eq!(needs[0].intent, ResourceCategory::Financial);
        assert_eq!(needs[1].intent, ResourceCategory::Employment);
    }

    #[test]
    fn test_excludes_current_and_surfaced() {
        let analyzer = ContextAnalyzer::new();
        let needs = analyzer.analyze(
            &[turn("housing")],
            ResourceCategory::Financial,
            &[ResourceCategory::Employment],
        );
        // financial is the current intent, employment already surfaced;
        // only housing<-financial remains, pointing back at housing.
        assert!(needs.iter().all(|n| n.intent != ResourceCategory::Financial));
        assert!(needs.iter().all(|n| n.intent != ResourceCategory::Employment));
    }

    #[test]
    fn test_scores_accumulate_across_turns() {
        let analyzer = ContextAnalyzer::new();
        // housing appears twice: financial accumulates 0.6 + 0.6, but
        // confidence is clamped to 1.0.
        let needs = analyzer.analyze(
            &[turn("housing"), turn("housing")],
            ResourceCategory::Housing,
            &[],
        );
        assert_eq!(needs[0].intent, ResourceCategory::Financial);
        assert!((needs[0].confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bounded_output() {
        let analyzer = ContextAnalyzer::new();
        let history = vec![
            turn("housing"),
            turn("legal"),
            turn("employment"),
            turn("exploitation"),
            turn("emergency"),
        ];
        let needs = analyzer.analyze(&history, ResourceCategory::General, &[]);
        assert!(needs.len() <= MAX_HIDDEN_NEEDS);
    }

    #[test]
    fn test_unknown_intent_strings_ignored() {
        let analyzer = ContextAnalyzer::new();
        let needs = analyzer.analyze(&[turn("not_an_intent")], ResourceCategory::General, &[]);
        assert!(needs.is_empty());
    }

    #[test]
    fn test_deterministic_tie_break() {
        let analyzer = ContextAnalyzer::new();
        let a = analyzer.analyze(&[turn("legal"), turn("employment")], ResourceCategory::General, &[]);
        let b = analyzer.analyze(&[turn("legal"), turn("employment")], ResourceCategory::General, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stage_progression() {
        let analyzer = ContextAnalyzer::new();
        assert_eq!(analyzer.stage(&[]), ConversationStage::Greeting);
        assert_eq!(analyzer.stage(&[turn("housing")]), ConversationStage::NeedsAssessment);
        let mid: Vec<HistoryTurn> = (0..3).map(|_| turn("housing")).collect();
        assert_eq!(analyzer.stage(&mid), ConversationStage::ServiceMatching);
        let long: Vec<HistoryTurn> = (0..6).map(|_| turn("housing")).collect();
        assert_eq!(analyzer.stage(&long), ConversationStage::FollowUp);
    }
}
