//! The nine operations the point-of-sale screens call.
//!
//! Each method returns the task's typed value. Failures never surface: the
//! dispatcher has already substituted the documented fallback.

use std::sync::Arc;

use {
    shelfwise_common::{Customer, InlineImage, Product, TaskKind, Transaction},
    shelfwise_config::ShelfwiseConfig,
    shelfwise_providers::{ModelGateway, ModelService},
};

use crate::{
    context::DomainSlice,
    dispatcher::TaskDispatcher,
    prompt::TaskInput,
    result::{
        BillLine, FACE_DESCRIPTION_FALLBACK, MARKET_NEWS_FALLBACK, PRICE_SUGGESTION_FALLBACK,
        ParsedResult, SHOP_QUERY_FALLBACK, SmartInsights, VoiceCommand,
    },
};

#[derive(Debug, Clone)]
pub struct PosAssistant {
    dispatcher: TaskDispatcher,
}

impl PosAssistant {
    pub fn new(dispatcher: TaskDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Wire the production service from configuration. A missing API key is
    /// reported here, once, instead of on every call.
    pub fn from_config(config: ShelfwiseConfig) -> shelfwise_providers::Result<Self> {
        let gateway = ModelGateway::from_config(&config)?;
        Ok(Self::new(TaskDispatcher::new(gateway, config)))
    }

    /// Use an arbitrary service, e.g. a scripted one.
    pub fn with_service(service: Arc<dyn ModelService>, config: ShelfwiseConfig) -> Self {
        Self::new(TaskDispatcher::new(ModelGateway::new(service), config))
    }

    pub fn dispatcher(&self) -> &TaskDispatcher {
        &self.dispatcher
    }

    pub async fn fetch_market_news(&self) -> String {
        self.text_task(TaskKind::MarketNews, TaskInput::default(), MARKET_NEWS_FALLBACK)
            .await
    }

    pub async fn fetch_price_variation_suggestion(&self) -> String {
        self.text_task(
            TaskKind::PriceSuggestion,
            TaskInput::default(),
            PRICE_SUGGESTION_FALLBACK,
        )
        .await
    }

    pub async fn ask_shop_ai(&self, shop_summary: &str, question: &str) -> String {
        let input = TaskInput {
            slice: DomainSlice {
                shop_summary: Some(shop_summary),
                ..Default::default()
            },
            text: Some(question),
            image: None,
        };
        self.text_task(TaskKind::ShopQuery, input, SHOP_QUERY_FALLBACK)
            .await
    }

    pub async fn analyze_image_for_billing(
        &self,
        image: &InlineImage,
        inventory: &[Product],
    ) -> Vec<BillLine> {
        let input = TaskInput {
            slice: DomainSlice {
                inventory,
                ..Default::default()
            },
            text: None,
            image: Some(image),
        };
        match self.dispatcher.run(TaskKind::VisualBilling, &input).await {
            ParsedResult::VisualBilling(lines) => lines,
            _ => Vec::new(),
        }
    }

    pub async fn process_voice_command(
        &self,
        transcript: &str,
        inventory: &[Product],
    ) -> Option<VoiceCommand> {
        let input = TaskInput {
            slice: DomainSlice {
                inventory,
                ..Default::default()
            },
            text: Some(transcript),
            image: None,
        };
        match self.dispatcher.run(TaskKind::VoiceCommand, &input).await {
            ParsedResult::VoiceCommand(command) => command,
            _ => None,
        }
    }

    pub async fn generate_smart_insights(
        &self,
        recent_sales: &[Transaction],
        inventory: &[Product],
    ) -> SmartInsights {
        let input = TaskInput {
            slice: DomainSlice {
                inventory,
                sales: recent_sales,
                ..Default::default()
            },
            ..Default::default()
        };
        match self.dispatcher.run(TaskKind::SmartInsights, &input).await {
            ParsedResult::SmartInsights(insights) => insights,
            _ => SmartInsights::default(),
        }
    }

    pub async fn analyze_customer_face(&self, image: &InlineImage) -> String {
        let input = TaskInput {
            image: Some(image),
            ..Default::default()
        };
        self.text_task(TaskKind::FaceDescription, input, FACE_DESCRIPTION_FALLBACK)
            .await
    }

    /// Id of the matching customer, if any.
    pub async fn identify_customer_from_image(
        &self,
        image: &InlineImage,
        customers: &[Customer],
    ) -> Option<String> {
        let input = TaskInput {
            slice: DomainSlice {
                customers,
                ..Default::default()
            },
            text: None,
            image: Some(image),
        };
        match self.dispatcher.run(TaskKind::FaceIdentification, &input).await {
            ParsedResult::FaceIdentification(id) => id,
            _ => None,
        }
    }

    pub async fn get_smart_upsell_suggestion(&self, cart_item_names: &[String]) -> Option<String> {
        let input = TaskInput {
            slice: DomainSlice {
                cart_item_names,
                ..Default::default()
            },
            ..Default::default()
        };
        match self.dispatcher.run(TaskKind::UpsellSuggestion, &input).await {
            ParsedResult::UpsellSuggestion(suggestion) => suggestion,
            _ => None,
        }
    }

    async fn text_task(&self, kind: TaskKind, input: TaskInput<'_>, fallback: &str) -> String {
        self.dispatcher
            .run(kind, &input)
            .await
            .into_text()
            .unwrap_or_else(|| fallback.to_string())
    }
}
