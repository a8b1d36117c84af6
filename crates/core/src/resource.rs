//! Resource catalog types
//!
//! Catalog entries are created by ingestion before the service starts and
//! are read-only to the search core. A reload produces a whole new
//! snapshot; entries are never mutated mid-query.

use serde::{Deserialize, Serialize};

/// Service category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Emergency,
    Housing,
    Healthcare,
    Employment,
    Education,
    Legal,
    Financial,
    Exploitation,
    DigitalAssistance,
    General,
}

impl ResourceCategory {
    /// All categories in declaration order
    pub const ALL: [ResourceCategory; 10] = [
        ResourceCategory::Emergency,
        ResourceCategory::Housing,
        ResourceCategory::Healthcare,
        ResourceCategory::Employment,
        ResourceCategory::Education,
        ResourceCategory::Legal,
        ResourceCategory::Financial,
        ResourceCategory::Exploitation,
        ResourceCategory::DigitalAssistance,
        ResourceCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::Emergency => "emergency",
            ResourceCategory::Housing => "housing",
            ResourceCategory::Healthcare => "healthcare",
            ResourceCategory::Employment => "employment",
            ResourceCategory::Education => "education",
            ResourceCategory::Legal => "legal",
            ResourceCategory::Financial => "financial",
            ResourceCategory::Exploitation => "exploitation",
            ResourceCategory::DigitalAssistance => "digital_assistance",
            ResourceCategory::General => "general",
        }
    }

    /// Parse from a wire string. Returns None for anything outside the
    /// closed set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency tier a catalog entry is most appropriate for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Critical,
    High,
    Standard,
    Low,
}

impl UrgencyLevel {
    /// Sort rank: critical-serving entries order before all others
    pub fn rank(&self) -> u8 {
        match self {
            UrgencyLevel::Critical => 0,
            UrgencyLevel::High => 1,
            UrgencyLevel::Standard => 2,
            UrgencyLevel::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::High => "high",
            UrgencyLevel::Standard => "standard",
            UrgencyLevel::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(UrgencyLevel::Critical),
            "high" => Some(UrgencyLevel::High),
            "standard" => Some(UrgencyLevel::Standard),
            "low" => Some(UrgencyLevel::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for UrgencyLevel {
    fn default() -> Self {
        UrgencyLevel::Standard
    }
}

/// Contact details for a service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactBlock {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub hours: Option<String>,
}

fn default_languages() -> Vec<String> {
    vec!["English".to_string()]
}

fn default_cost() -> String {
    "Free".to_string()
}

/// A catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceEntry {
    /// Stable identifier
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: ResourceCategory,
    /// Urgency tier this service is most appropriate for
    #[serde(default)]
    pub urgency_served: UrgencyLevel,
    /// Languages the service supports directly
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_cost")]
    pub cost: String,
    #[serde(default)]
    pub contact: ContactBlock,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Precomputed embedding vector; empty until ingestion backfills it
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Catalog insertion index, assigned by the loader. Used as the final
    /// ranking tie-break so equal-score orderings stay stable.
    #[serde(default)]
    pub ordinal: usize,
}

impl ResourceEntry {
    /// Text fed to the embedding provider for this entry
    pub fn embedding_text(&self) -> String {
        let mut text = format!("{}. {}", self.name, self.description);
        if !self.keywords.is_empty() {
            text.push_str(". ");
            text.push_str(&self.keywords.join(", "));
        }
        text
    }

    /// Case-insensitive language support check
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}
