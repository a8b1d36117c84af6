//! Query fingerprinting
//!
//! The fingerprint is the cache key: a digest of the normalized utterance
//! plus every hint field plus the result limit. Casing and whitespace
//! variants of the same utterance collide by design; any difference in a
//! hint separates.

use sha2::{Digest, Sha256};

use support_agent_core::QueryRequest;

/// Normalize an utterance: case-fold and collapse whitespace.
pub fn normalize_message(message: &str) -> String {
    message
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Deterministic digest identifying a cacheable query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryFingerprint(String);

// Unit separator keeps adjacent fields from running together, so
// ("ab", "c") never collides with ("a", "bc").
const FIELD_SEPARATOR: u8 = 0x1f;

impl QueryFingerprint {
    pub fn compute(request: &QueryRequest) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(normalize_message(&request.message).as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(
            request
                .category
                .map(|c| c.as_str())
                .unwrap_or("-")
                .as_bytes(),
        );
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(request.urgency.map(|u| u.as_str()).unwrap_or("-").as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(request.language.as_deref().unwrap_or("-").as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        hasher.update(request.limit.to_string().as_bytes());

        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support_agent_core::{ResourceCategory, UrgencyLevel};

    #[test]
    fn test_normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize_message("I need HELP  now"), "i need help now");
        assert_eq!(normalize_message("  spaced\t\tout \n"), "spaced out");
    }

    #[test]
    fn test_casing_and_whitespace_collide() {
        let a = QueryFingerprint::compute(&QueryRequest::new("I need HELP  now"));
        let b = QueryFingerprint::compute(&QueryRequest::new("i need help now"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_category_hint_separates() {
        let mut a = QueryRequest::new("where can I get advice");
        a.category = Some(ResourceCategory::Legal);
        let mut b = a.clone();
        b.category = Some(ResourceCategory::Housing);
        assert_ne!(
            QueryFingerprint::compute(&a),
            QueryFingerprint::compute(&b)
        );
    }

    #[test]
    fn test_each_hint_field_separates() {
        let base = QueryRequest::new("help me");

        let mut with_urgency = base.clone();
        with_urgency.urgency = Some(UrgencyLevel::High);

        let mut with_language = base.clone();
        with_language.language = Some("Arabic".to_string());

        let mut with_limit = base.clone();
        with_limit.limit = 5;

        let fingerprints = [
            QueryFingerprint::compute(&base),
            QueryFingerprint::compute(&with_urgency),
            QueryFingerprint::compute(&with_language),
            QueryFingerprint::compute(&with_limit),
        ];
        for (i, a) in fingerprints.iter().enumerate() {
            for b in fingerprints.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_history_does_not_affect_fingerprint() {
        let a = QueryRequest::new("help me");
        let mut b = a.clone();
        b.history.push(support_agent_core::HistoryTurn {
            utterance: "earlier".to_string(),
            intent: "housing".to_string(),
        });
        assert_eq!(QueryFingerprint::compute(&a), QueryFingerprint::compute(&b));
    }
}
