//! Prompt construction per task.
//!
//! Each prompt carries the minimized [`ContextPayload`] as compact JSON and
//! spells out the exact output shape, since the service is not otherwise
//! schema-constrained.

use {
    shelfwise_common::{InlineImage, ReasoningEffort, ResponseFormat, TaskKind},
    shelfwise_config::ShopConfig,
};

use crate::context::{ContextPayload, DomainSlice};

/// Fixed per-task request hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskProfile {
    pub response_format: ResponseFormat,
    pub reasoning_effort: ReasoningEffort,
    pub needs_image: bool,
}

#[must_use]
pub fn profile(kind: TaskKind) -> TaskProfile {
    let (response_format, reasoning_effort, needs_image) = match kind {
        TaskKind::MarketNews | TaskKind::PriceSuggestion | TaskKind::ShopQuery => {
            (ResponseFormat::Text, ReasoningEffort::Default, false)
        },
        TaskKind::VisualBilling => (ResponseFormat::Json, ReasoningEffort::Low, true),
        // Spoken at the till; latency matters more than depth.
        TaskKind::VoiceCommand => (ResponseFormat::Json, ReasoningEffort::Minimal, false),
        TaskKind::SmartInsights => (ResponseFormat::Json, ReasoningEffort::Default, false),
        TaskKind::FaceDescription => (ResponseFormat::Text, ReasoningEffort::Low, true),
        TaskKind::FaceIdentification => (ResponseFormat::Json, ReasoningEffort::Low, true),
        TaskKind::UpsellSuggestion => (ResponseFormat::Text, ReasoningEffort::Minimal, false),
    };
    TaskProfile {
        response_format,
        reasoning_effort,
        needs_image,
    }
}

/// Caller input for one task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskInput<'a> {
    pub slice: DomainSlice<'a>,
    /// Transcript for voice commands, question for shop queries.
    pub text: Option<&'a str>,
    pub image: Option<&'a InlineImage>,
}

impl<'a> TaskInput<'a> {
    /// Trimmed user text, `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        self.text.map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to serialize context: {0}")]
    Context(#[from] serde_json::Error),

    #[error("{0} requires an image")]
    MissingImage(TaskKind),

    #[error("{0} requires user text")]
    MissingText(TaskKind),
}

/// A fully prepared request. Borrows the image from the caller's input.
#[derive(Debug, Clone)]
pub struct BuiltRequest<'a> {
    pub kind: TaskKind,
    pub prompt: String,
    pub context: ContextPayload,
    pub image: Option<&'a InlineImage>,
    pub response_format: ResponseFormat,
    pub reasoning_effort: ReasoningEffort,
}

#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    shop: ShopConfig,
}

impl RequestBuilder {
    pub fn new(shop: ShopConfig) -> Self {
        Self { shop }
    }

    pub fn build<'a>(
        &self,
        kind: TaskKind,
        input: &TaskInput<'a>,
    ) -> Result<BuiltRequest<'a>, BuildError> {
        let profile = profile(kind);
        let image = if profile.needs_image {
            Some(input.image.ok_or(BuildError::MissingImage(kind))?)
        } else {
            None
        };

        let context = ContextPayload::build(kind, &input.slice)?;
        let prompt = match kind {
            TaskKind::MarketNews => self.market_news(),
            TaskKind::PriceSuggestion => self.price_suggestion(),
            TaskKind::ShopQuery => {
                let question = input.text().ok_or(BuildError::MissingText(kind))?;
                self.shop_query(&context, question)?
            },
            TaskKind::VisualBilling => visual_billing(&context),
            TaskKind::VoiceCommand => {
                let transcript = input.text().ok_or(BuildError::MissingText(kind))?;
                voice_command(&context, transcript)?
            },
            TaskKind::SmartInsights => smart_insights(&context),
            TaskKind::FaceDescription => face_description(),
            TaskKind::FaceIdentification => face_identification(&context),
            TaskKind::UpsellSuggestion => upsell(&context),
        };

        Ok(BuiltRequest {
            kind,
            prompt,
            context,
            image,
            response_format: profile.response_format,
            reasoning_effort: profile.reasoning_effort,
        })
    }

    fn market_news(&self) -> String {
        format!(
            "You advise {name}, a small retail shop in {region}. Summarize today's \
             wholesale and consumer market news that affects grocery and FMCG pricing \
             in {region}. Reply with at most five short bullet points in plain text.",
            name = self.shop.name,
            region = self.shop.region,
        )
    }

    fn price_suggestion(&self) -> String {
        format!(
            "You advise {name}, a small retail shop in {region}. Based on current \
             seasonal and market trends, suggest which common product categories \
             should have their prices raised or lowered this week, with amounts in \
             {currency}. Reply in plain text, at most five lines.",
            name = self.shop.name,
            region = self.shop.region,
            currency = self.shop.currency,
        )
    }

    fn shop_query(
        &self,
        context: &ContextPayload,
        question: &str,
    ) -> Result<String, serde_json::Error> {
        let summary = context
            .section("shopSummary")
            .and_then(|v| v.as_str())
            .unwrap_or("No summary available.");
        Ok(format!(
            "You are the assistant for {name}. Amounts are in {currency}.\n\
             Shop summary:\n{summary}\n\n\
             Question (JSON string): {question}\n\n\
             Answer the question concisely in plain text using only the summary.",
            name = self.shop.name,
            currency = self.shop.currency,
            question = serde_json::to_string(question)?,
        ))
    }
}

fn visual_billing(context: &ContextPayload) -> String {
    format!(
        "Identify the products visible in the photo using only this inventory:\n\
         {inventory}\n\n\
         Return a JSON array of objects {{\"productId\": string, \"quantity\": number}}, \
         one per distinct product, where productId is an id from the inventory. \
         Use quantity 1 when unsure of the count. Return [] if nothing matches. \
         Return only the JSON array.",
        inventory = context.section_json("inventory"),
    )
}

fn voice_command(context: &ContextPayload, transcript: &str) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Interpret a cashier's spoken point-of-sale command.\n\
         Inventory: {inventory}\n\
         Transcript (JSON string): {transcript}\n\n\
         Return exactly one JSON object of one of these forms:\n\
         {{\"type\": \"ADD_ITEM\", \"productId\": string, \"quantity\": number}}\n\
         {{\"type\": \"CHECKOUT\"}}\n\
         {{\"type\": \"CLEAR_BILL\"}}\n\
         productId must be an id from the inventory. quantity counts packs of the \
         product as named: 500 grams of a 1kg item is 0.5, two packets is 2. \
         If the command is not understood, return null. Return only JSON.",
        inventory = context.section_json("inventory"),
        transcript = serde_json::to_string(transcript)?,
    ))
}

fn smart_insights(context: &ContextPayload) -> String {
    format!(
        "Analyze this shop's recent sales (newest first) and inventory.\n\
         Sales: {sales}\n\
         Inventory: {inventory}\n\n\
         Return a JSON object with exactly these fields:\n\
         \"stockPrediction\": string, which items will run out soon,\n\
         \"staffPerformance\": string, a short note on staff sales,\n\
         \"salesHeatmap\": array of {{\"productName\": string, \"score\": number 0-100}}, \
         hottest products first.\n\
         Return only the JSON object.",
        sales = context.section_json("sales"),
        inventory = context.section_json("inventory"),
    )
}

fn face_description() -> String {
    "Describe the customer in the photo for later recognition at the counter: \
     visible features such as hair, glasses, facial hair and approximate age. \
     Do not guess names or identity. Reply in one or two plain sentences."
        .to_string()
}

fn face_identification(context: &ContextPayload) -> String {
    format!(
        "Compare the person in the photo with these stored customer descriptions:\n\
         {customers}\n\n\
         Return a JSON object {{\"matchedId\": string or null}} where matchedId is the \
         id of the matching customer, or null if none matches confidently. \
         Return only the JSON object.",
        customers = context.section_json("customers"),
    )
}

fn upsell(context: &ContextPayload) -> String {
    format!(
        "A customer's cart holds: {cart}\n\
         Suggest one complementary product the cashier could offer, in a single short \
         plain-text sentence.",
        cart = context.section_json("cart"),
    )
}
