//! The closed set of model-backed operations and the per-call hints that
//! travel with them to the model service.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the nine structured-extraction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    MarketNews,
    PriceSuggestion,
    ShopQuery,
    VisualBilling,
    VoiceCommand,
    SmartInsights,
    FaceDescription,
    FaceIdentification,
    UpsellSuggestion,
}

impl TaskKind {
    pub const ALL: [Self; 9] = [
        Self::MarketNews,
        Self::PriceSuggestion,
        Self::ShopQuery,
        Self::VisualBilling,
        Self::VoiceCommand,
        Self::SmartInsights,
        Self::FaceDescription,
        Self::FaceIdentification,
        Self::UpsellSuggestion,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarketNews => "market_news",
            Self::PriceSuggestion => "price_suggestion",
            Self::ShopQuery => "shop_query",
            Self::VisualBilling => "visual_billing",
            Self::VoiceCommand => "voice_command",
            Self::SmartInsights => "smart_insights",
            Self::FaceDescription => "face_description",
            Self::FaceIdentification => "face_identification",
            Self::UpsellSuggestion => "upsell_suggestion",
        }
    }

    /// Tasks whose answer is a structured JSON document rather than prose.
    #[must_use]
    pub fn expects_json(self) -> bool {
        matches!(
            self,
            Self::VisualBilling | Self::VoiceCommand | Self::SmartInsights | Self::FaceIdentification
        )
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much reasoning the model service should spend before answering.
///
/// Latency-critical tasks ask for `Minimal`; `Default` leaves the choice to
/// the service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    #[default]
    Default,
    High,
}

/// Output format requested from the model service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

impl ResponseFormat {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Text => "text/plain",
            Self::Json => "application/json",
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_kind_serde_matches_as_str() {
        for kind in TaskKind::ALL {
            let serialized = serde_json::to_string(&kind).unwrap();
            assert_eq!(serialized, format!("\"{}\"", kind.as_str()));
            let parsed: TaskKind = serde_json::from_str(&serialized).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn json_tasks() {
        let json: Vec<_> = TaskKind::ALL
            .into_iter()
            .filter(|k| k.expects_json())
            .collect();
        assert_eq!(json, vec![
            TaskKind::VisualBilling,
            TaskKind::VoiceCommand,
            TaskKind::SmartInsights,
            TaskKind::FaceIdentification,
        ]);
    }

    #[test]
    fn reasoning_effort_defaults_to_service_choice() {
        assert_eq!(ReasoningEffort::default(), ReasoningEffort::Default);
        let parsed: ReasoningEffort = serde_json::from_str("\"minimal\"").unwrap();
        assert_eq!(parsed, ReasoningEffort::Minimal);
    }

    #[test]
    fn unknown_task_kind_rejected() {
        assert!(serde_json::from_str::<TaskKind>("\"refund\"").is_err());
    }
}
