//! Emergency short-circuit path
//!
//! Invoked whenever urgency classifies critical, regardless of intent.
//! The handler is pure in-memory data: no cache, no index, no embedding
//! provider, and therefore no failure mode.

use support_agent_core::{
    ContactBlock, MatchFlags, RankedResult, ResourceCategory, UrgencyLevel,
};

/// Emergency profile selected from the utterance. Determines which fixed
/// services accompany the life-threatening-emergency line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmergencyProfile {
    General,
    Suicide,
    DomesticViolence,
    ChildProtection,
    MentalHealth,
}

/// Fixed emergency responder
pub struct EmergencyHandler;

impl EmergencyHandler {
    pub fn new() -> Self {
        Self
    }

    /// Produce the fixed critical-urgency service list.
    ///
    /// Always opens with 000 and closes with the 24/7 interpreter line;
    /// the utterance selects which crisis services sit between them.
    pub fn handle(&self, utterance: &str) -> Vec<RankedResult> {
        let profile = Self::profile_for(utterance);

        let mut results = vec![Self::triple_zero()];
        match profile {
            EmergencyProfile::Suicide => results.push(Self::lifeline()),
            EmergencyProfile::DomesticViolence => results.push(Self::respect_line()),
            EmergencyProfile::ChildProtection => results.push(Self::child_protection()),
            EmergencyProfile::MentalHealth => {
                results.push(Self::mental_health_crisis());
                results.push(Self::lifeline());
            }
            EmergencyProfile::General => results.push(Self::lifeline()),
        }
        results.push(Self::interpreter_line());

        for (ordinal, result) in results.iter_mut().enumerate() {
            result.ordinal = ordinal;
        }

        tracing::info!(profile = ?profile, services = results.len(), "Emergency path taken");
        results
    }

    fn profile_for(utterance: &str) -> EmergencyProfile {
        let text = utterance.to_lowercase();

        if ["suicide", "kill myself", "end my life"]
            .iter()
            .any(|w| text.contains(w))
        {
            EmergencyProfile::Suicide
        } else if ["domestic", "violence", "abuse", "hit me", "hurt me"]
            .iter()
            .any(|w| text.contains(w))
        {
            EmergencyProfile::DomesticViolence
        } else if ["child", "kids"].iter().any(|w| text.contains(w)) {
            EmergencyProfile::ChildProtection
        } else if ["mental", "breakdown", "panic", "anxiety"]
            .iter()
            .any(|w| text.contains(w))
        {
            EmergencyProfile::MentalHealth
        } else {
            EmergencyProfile::General
        }
    }

    fn service(
        id: &str,
        name: &str,
        description: &str,
        phone: &str,
        languages: &[&str],
    ) -> RankedResult {
        RankedResult {
            resource_id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: ResourceCategory::Emergency,
            urgency_served: UrgencyLevel::Critical,
            languages: languages.iter().map(|l| l.to_string()).collect(),
            contact: ContactBlock {
                phone: Some(phone.to_string()),
                website: None,
                address: None,
                hours: Some("24/7".to_string()),
            },
            score: 1.0,
            flags: MatchFlags::default(),
            ordinal: 0,
        }
    }

    fn triple_zero() -> RankedResult {
        Self::service(
            "emergency-000",
            "Emergency Services (000)",
            "Police, Fire, Ambulance - life threatening emergencies",
            "000",
            &["All languages via interpreter"],
        )
    }

    fn lifeline() -> RankedResult {
        Self::service(
            "emergency-lifeline",
            "Lifeline Crisis Support",
            "Crisis support and suicide prevention",
            "13 11 14",
            &["English"],
        )
    }

    fn respect_line() -> RankedResult {
        Self::service(
            "emergency-1800respect",
            "1800RESPECT",
            "Domestic violence support and counselling",
            "1800 737 732",
            &["Multiple languages"],
        )
    }

    fn child_protection() -> RankedResult {
        Self::service(
            "emergency-child-protection",
            "Child Protection",
            "Report child abuse or get help",
            "1300 556 729",
            &["English"],
        )
    }

    fn mental_health_crisis() -> RankedResult {
        Self::service(
            "emergency-mental-health",
            "Mental Health Crisis Team",
            "ACT mental health crisis support",
            "1800 648 911",
            &["English"],
        )
    }

    fn interpreter_line() -> RankedResult {
        Self::service(
            "emergency-interpreter",
            "Translating and Interpreting Service",
            "24/7 interpretation in your language",
            "131 450",
            &["All languages"],
        )
    }
}

impl Default for EmergencyHandler {
    fn default() -> Self {
        Self::new()
    }
}
