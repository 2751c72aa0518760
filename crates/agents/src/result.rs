//! Typed results per task, and the fallback table used when a call fails.

use {
    serde::{Deserialize, Serialize},
    shelfwise_common::TaskKind,
};

/// Substitute for any insight field the model did not provide.
pub const NO_DATA: &str = "No data";

pub const MARKET_NEWS_FALLBACK: &str = "Market news is unavailable right now.";
pub const PRICE_SUGGESTION_FALLBACK: &str = "Price suggestions are unavailable right now.";
pub const SHOP_QUERY_FALLBACK: &str = "Sorry, I couldn't answer that right now.";
pub const FACE_DESCRIPTION_FALLBACK: &str = "Unable to describe the customer.";

/// A point-of-sale action spoken by the cashier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceCommand {
    AddItem {
        #[serde(rename = "productId")]
        product_id: String,
        /// Pack units; fractional for partial packs.
        quantity: f64,
    },
    Checkout,
    ClearBill,
}

/// One recognized product on a billing photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLine {
    pub product_id: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapEntry {
    pub product_name: String,
    /// Relative sales intensity, 0..=100.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartInsights {
    pub stock_prediction: String,
    pub staff_performance: String,
    pub sales_heatmap: Vec<HeatmapEntry>,
}

impl Default for SmartInsights {
    fn default() -> Self {
        Self {
            stock_prediction: NO_DATA.into(),
            staff_performance: NO_DATA.into(),
            sales_heatmap: Vec::new(),
        }
    }
}

/// Result of one task, always fully formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "task", content = "result", rename_all = "snake_case")]
pub enum ParsedResult {
    MarketNews(String),
    PriceSuggestion(String),
    ShopQuery(String),
    VisualBilling(Vec<BillLine>),
    VoiceCommand(Option<VoiceCommand>),
    SmartInsights(SmartInsights),
    FaceDescription(String),
    FaceIdentification(Option<String>),
    UpsellSuggestion(Option<String>),
}

impl ParsedResult {
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::MarketNews(_) => TaskKind::MarketNews,
            Self::PriceSuggestion(_) => TaskKind::PriceSuggestion,
            Self::ShopQuery(_) => TaskKind::ShopQuery,
            Self::VisualBilling(_) => TaskKind::VisualBilling,
            Self::VoiceCommand(_) => TaskKind::VoiceCommand,
            Self::SmartInsights(_) => TaskKind::SmartInsights,
            Self::FaceDescription(_) => TaskKind::FaceDescription,
            Self::FaceIdentification(_) => TaskKind::FaceIdentification,
            Self::UpsellSuggestion(_) => TaskKind::UpsellSuggestion,
        }
    }

    /// The documented substitute for `kind`.
    #[must_use]
    pub fn fallback(kind: TaskKind) -> Self {
        match kind {
            TaskKind::MarketNews => Self::MarketNews(MARKET_NEWS_FALLBACK.into()),
            TaskKind::PriceSuggestion => Self::PriceSuggestion(PRICE_SUGGESTION_FALLBACK.into()),
            TaskKind::ShopQuery => Self::ShopQuery(SHOP_QUERY_FALLBACK.into()),
            TaskKind::VisualBilling => Self::VisualBilling(Vec::new()),
            TaskKind::VoiceCommand => Self::VoiceCommand(None),
            TaskKind::SmartInsights => Self::SmartInsights(SmartInsights::default()),
            TaskKind::FaceDescription => Self::FaceDescription(FACE_DESCRIPTION_FALLBACK.into()),
            TaskKind::FaceIdentification => Self::FaceIdentification(None),
            TaskKind::UpsellSuggestion => Self::UpsellSuggestion(None),
        }
    }

    /// Wrap plain text in the variant for a text-answer task.
    pub(crate) fn text(kind: TaskKind, text: String) -> Option<Self> {
        match kind {
            TaskKind::MarketNews => Some(Self::MarketNews(text)),
            TaskKind::PriceSuggestion => Some(Self::PriceSuggestion(text)),
            TaskKind::ShopQuery => Some(Self::ShopQuery(text)),
            TaskKind::FaceDescription => Some(Self::FaceDescription(text)),
            TaskKind::UpsellSuggestion => Some(Self::UpsellSuggestion(Some(text))),
            _ => None,
        }
    }

    /// Inner text of a text-answer variant.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::MarketNews(t)
            | Self::PriceSuggestion(t)
            | Self::ShopQuery(t)
            | Self::FaceDescription(t) => Some(t),
            Self::UpsellSuggestion(t) => t,
            _ => None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn fallback_kind_matches() {
        for kind in TaskKind::ALL {
            assert_eq!(ParsedResult::fallback(kind).kind(), kind);
        }
    }

    #[test]
    fn voice_command_wire_shape() {
        let cmd = VoiceCommand::AddItem {
            product_id: "p1".into(),
            quantity: 0.5,
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({"type": "ADD_ITEM", "productId": "p1", "quantity": 0.5})
        );
        assert_eq!(
            serde_json::to_value(VoiceCommand::Checkout).unwrap(),
            json!({"type": "CHECKOUT"})
        );
        assert_eq!(
            serde_json::to_value(VoiceCommand::ClearBill).unwrap(),
            json!({"type": "CLEAR_BILL"})
        );
    }

    #[test]
    fn insights_default_is_placeholder() {
        let insights = SmartInsights::default();
        assert_eq!(insights.stock_prediction, NO_DATA);
        assert_eq!(insights.staff_performance, NO_DATA);
        assert!(insights.sales_heatmap.is_empty());
    }

    #[test]
    fn parsed_result_serializes_with_task_tag() {
        let v = serde_json::to_value(ParsedResult::FaceIdentification(None)).unwrap();
        assert_eq!(v, json!({"task": "face_identification", "result": null}));
        let v = serde_json::to_value(ParsedResult::VisualBilling(vec![BillLine {
            product_id: "p1".into(),
            quantity: 2.0,
        }]))
        .unwrap();
        assert_eq!(v["result"][0]["productId"], "p1");
    }

    #[test]
    fn into_text_for_text_tasks_only() {
        assert_eq!(
            ParsedResult::fallback(TaskKind::MarketNews).into_text().as_deref(),
            Some(MARKET_NEWS_FALLBACK)
        );
        assert!(ParsedResult::fallback(TaskKind::UpsellSuggestion).into_text().is_none());
        assert!(ParsedResult::fallback(TaskKind::VisualBilling).into_text().is_none());
    }
}
