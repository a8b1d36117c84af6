//! Response assembly
//!
//! Merges primary results, hidden-need suggestions, and fallback content
//! into the outbound payload. Degraded searches keep `results` empty and
//! carry statically-known emergency contacts in `fallback_contacts`.

use serde::Serialize;

use support_agent_core::{RankedResult, ResourceCategory, SearchMethod, UrgencyLevel};
use support_agent_search::{Classification, ConversationStage, HiddenNeed, SearchOutcome};

/// One service in the outbound payload
#[derive(Debug, Clone, Serialize)]
pub struct ServiceCard {
    pub resource_id: String,
    pub name: String,
    pub description: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub similarity_score: f32,
    pub urgency_served: UrgencyLevel,
    pub languages: Vec<String>,
}

impl From<&RankedResult> for ServiceCard {
    fn from(result: &RankedResult) -> Self {
        Self {
            resource_id: result.resource_id.clone(),
            name: result.name.clone(),
            description: result.description.clone(),
            phone: result.contact.phone.clone(),
            website: result.contact.website.clone(),
            location: result.contact.address.clone(),
            similarity_score: result.score,
            urgency_served: result.urgency_served,
            languages: result.languages.clone(),
        }
    }
}

/// A hidden-need suggestion in the outbound payload
#[derive(Debug, Clone, Serialize)]
pub struct HiddenNeedItem {
    pub intent: ResourceCategory,
    pub confidence: f32,
}

/// Response metadata block
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    pub intent: ResourceCategory,
    pub urgency: UrgencyLevel,
    pub confidence: f32,
    pub conversation_stage: &'static str,
    pub category_fallback: bool,
}

/// Outbound payload for the query endpoint
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<ServiceCard>,
    pub hidden_needs: Vec<HiddenNeedItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallback_contacts: Vec<ServiceCard>,
    pub method_used: SearchMethod,
    pub cache_hit: bool,
    pub metadata: ResponseMetadata,
}

/// Builds outbound payloads
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble a search response
    pub fn assemble(
        &self,
        classification: &Classification,
        outcome: &SearchOutcome,
        hidden_needs: &[HiddenNeed],
        stage: ConversationStage,
    ) -> QueryResponse {
        let results: Vec<ServiceCard> = outcome.results.iter().map(ServiceCard::from).collect();

        let fallback_contacts = if outcome.method == SearchMethod::Degraded {
            Self::fallback_contacts()
        } else {
            Vec::new()
        };

        let message = Self::message_line(
            outcome.method,
            classification.intent,
            classification.urgency,
            results.len(),
        );

        QueryResponse {
            success: true,
            message,
            results,
            hidden_needs: hidden_needs
                .iter()
                .map(|need| HiddenNeedItem {
                    intent: need.intent,
                    confidence: need.confidence,
                })
                .collect(),
            quick_replies: Self::quick_replies(classification.intent, hidden_needs),
            fallback_contacts,
            method_used: outcome.method,
            cache_hit: outcome.cache_hit,
            metadata: ResponseMetadata {
                intent: classification.intent,
                urgency: classification.urgency,
                confidence: classification.confidence,
                conversation_stage: stage.as_str(),
                category_fallback: outcome.category_fallback,
            },
        }
    }

    /// Assemble an emergency response from the fixed service list
    pub fn assemble_emergency(
        &self,
        classification: &Classification,
        results: &[RankedResult],
        stage: ConversationStage,
    ) -> QueryResponse {
        QueryResponse {
            success: true,
            message: "This is urgent. Immediate help is available:".to_string(),
            results: results.iter().map(ServiceCard::from).collect(),
            hidden_needs: Vec::new(),
            quick_replies: vec![
                "Call 000".to_string(),
                "I'm safe now".to_string(),
                "Need interpreter".to_string(),
                "Other help".to_string(),
            ],
            fallback_contacts: Vec::new(),
            method_used: SearchMethod::Emergency,
            cache_hit: false,
            metadata: ResponseMetadata {
                intent: classification.intent,
                urgency: classification.urgency,
                confidence: classification.confidence,
                conversation_stage: stage.as_str(),
                category_fallback: false,
            },
        }
    }

    fn message_line(
        method: SearchMethod,
        intent: ResourceCategory,
        urgency: UrgencyLevel,
        count: usize,
    ) -> String {
        if method == SearchMethod::Degraded {
            return "I couldn't reach the service directory right now. For immediate help:"
                .to_string();
        }
        if urgency == UrgencyLevel::Critical {
            return "This is urgent. Here's immediate help:".to_string();
        }
        if intent == ResourceCategory::Exploitation {
            return "Confidential help - your visa status will NOT be checked:".to_string();
        }
        match count {
            0 => "I couldn't find exact matches, but related services may still help:".to_string(),
            1 => "I found one service that can help you:".to_string(),
            n => format!("I found {} services that can help you:", n),
        }
    }

    fn quick_replies(intent: ResourceCategory, hidden_needs: &[HiddenNeed]) -> Vec<String> {
        let template: &[&str] = match intent {
            ResourceCategory::Exploitation => {
                &["Report anonymously", "Know my rights", "Get legal help"]
            }
            ResourceCategory::DigitalAssistance => {
                &["MyGov help", "Internet access", "Learn computer skills"]
            }
            ResourceCategory::Employment => &["Find jobs", "Skills assessment", "Free training"],
            ResourceCategory::Housing => {
                &["Emergency shelter", "Rental assistance", "Tenant rights"]
            }
            _ => &["Tell me more", "Other services", "Emergency help"],
        };

        let mut replies: Vec<String> = template.iter().map(|r| r.to_string()).collect();
        for need in hidden_needs.iter().take(2) {
            replies.push(format!("Help with {}", need.intent.as_str().replace('_', " ")));
        }
        replies
    }

    /// Statically-known contacts substituted when search degrades
    fn fallback_contacts() -> Vec<ServiceCard> {
        vec![
            ServiceCard {
                resource_id: "emergency-000".to_string(),
                name: "Emergency Services (000)".to_string(),
                description: "Police, Fire, Ambulance".to_string(),
                phone: Some("000".to_string()),
                website: None,
                location: None,
                similarity_score: 1.0,
                urgency_served: UrgencyLevel::Critical,
                languages: vec!["All languages via interpreter".to_string()],
            },
            ServiceCard {
                resource_id: "emergency-interpreter".to_string(),
                name: "Translating and Interpreting Service".to_string(),
                description: "24/7 interpretation in your language".to_string(),
                phone: Some("131 450".to_string()),
                website: None,
                location: None,
                similarity_score: 1.0,
                urgency_served: UrgencyLevel::Critical,
                languages: vec!["All languages".to_string()],
            },
        ]
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification() -> Classification {
        Classification {
            intent: ResourceCategory::Housing,
            urgency: UrgencyLevel::Standard,
            confidence: 0.5,
        }
    }

    fn outcome(method: SearchMethod, results: Vec<RankedResult>) -> SearchOutcome {
        SearchOutcome {
            results,
            method,
            cache_hit: method == SearchMethod::CacheHit,
            category_fallback: false,
        }
    }

    #[test]
    fn test_degraded_keeps_results_empty_with_fallback_contacts() {
        let assembler = ResponseAssembler::new();
        let response = assembler.assemble(
            &classification(),
            &outcome(SearchMethod::Degraded, vec![]),
            &[],
            ConversationStage::Greeting,
        );

        assert!(response.success);
        assert!(response.results.is_empty());
        assert_eq!(response.method_used, SearchMethod::Degraded);
        assert!(!response.fallback_contacts.is_empty());
        assert_eq!(response.fallback_contacts[0].phone.as_deref(), Some("000"));
    }

    #[test]
    fn test_computed_response_has_no_fallback_contacts() {
        let assembler = ResponseAssembler::new();
        let result = RankedResult {
            resource_id: "a".to_string(),
            name: "A".to_string(),
            description: "d".to_string(),
            category: ResourceCategory::Housing,
            urgency_served: UrgencyLevel::Standard,
            languages: vec!["English".to_string()],
            contact: Default::default(),
            score: 0.8,
            flags: Default::default(),
            ordinal: 0,
        };
        let response = assembler.assemble(
            &classification(),
            &outcome(SearchMethod::Computed, vec![result]),
            &[],
            ConversationStage::Greeting,
        );

        assert_eq!(response.results.len(), 1);
        assert!(response.fallback_contacts.is_empty());
        assert_eq!(response.message, "I found one service that can help you:");
    }

    #[test]
    fn test_hidden_needs_appended_not_merged() {
        let assembler = ResponseAssembler::new();
        let hidden = vec![HiddenNeed {
            intent: ResourceCategory::Financial,
            confidence: 0.6,
        }];
        let response = assembler.assemble(
            &classification(),
            &outcome(SearchMethod::Computed, vec![]),
            &hidden,
            ConversationStage::NeedsAssessment,
        );

        assert_eq!(response.hidden_needs.len(), 1);
        assert_eq!(response.hidden_needs[0].intent, ResourceCategory::Financial);
        // Hidden needs never become primary results.
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_emergency_payload_shape() {
        let assembler = ResponseAssembler::new();
        let classification = Classification {
            intent: ResourceCategory::Emergency,
            urgency: UrgencyLevel::Critical,
            confidence: 1.0,
        };
        let handler = support_agent_search::EmergencyHandler::new();
        let response = assembler.assemble_emergency(
            &classification,
            &handler.handle("crisis"),
            ConversationStage::Greeting,
        );

        assert_eq!(response.method_used, SearchMethod::Emergency);
        assert!(!response.cache_hit);
        assert!(!response.results.is_empty());
    }
}
