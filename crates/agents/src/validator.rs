//! Parse sanitized model text and check it against the task's shape.
//!
//! Structured tasks get a JSON parse (with best-effort repair) followed by a
//! per-task shape check. Locally repairable problems (an unknown product on a
//! bill, a missing insight field) are fixed in place; anything else is a
//! [`ValidationFailure`].

use std::collections::HashSet;

use {
    serde_json::{Map, Value},
    shelfwise_common::TaskKind,
    tracing::debug,
};

use crate::{
    context::DomainSlice,
    json_repair,
    result::{BillLine, HeatmapEntry, NO_DATA, ParsedResult, SmartInsights, VoiceCommand},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("empty response")]
    Empty,
    #[error("parse error: {0}")]
    Parse(String),
    #[error("shape error: {0}")]
    Shape(String),
}

impl ValidationFailure {
    fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

/// Ids the model is allowed to refer to.
#[derive(Debug, Default)]
pub struct ValidationContext<'a> {
    product_ids: HashSet<&'a str>,
    customer_ids: HashSet<&'a str>,
}

impl<'a> ValidationContext<'a> {
    /// Products come from the inventory; customers only from those with a
    /// stored face descriptor, since only they were offered to the model.
    #[must_use]
    pub fn from_slice(slice: &DomainSlice<'a>) -> Self {
        Self {
            product_ids: slice.inventory.iter().map(|p| p.id.as_str()).collect(),
            customer_ids: slice
                .customers
                .iter()
                .filter(|c| c.descriptor().is_some())
                .map(|c| c.id.as_str())
                .collect(),
        }
    }

    fn has_product(&self, id: &str) -> bool {
        self.product_ids.contains(id)
    }

    fn has_customer(&self, id: &str) -> bool {
        self.customer_ids.contains(id)
    }
}

/// Validate `text` (already sanitized) for `kind`.
pub fn validate(
    kind: TaskKind,
    text: &str,
    ctx: &ValidationContext<'_>,
) -> Result<ParsedResult, ValidationFailure> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ValidationFailure::Empty);
    }

    match kind {
        TaskKind::VoiceCommand => validate_voice_command(parse(text)?, ctx),
        TaskKind::VisualBilling => validate_bill(parse(text)?, ctx),
        TaskKind::FaceIdentification => validate_face_match(parse(text)?, ctx),
        TaskKind::SmartInsights => validate_insights(parse(text)?),
        TaskKind::MarketNews
        | TaskKind::PriceSuggestion
        | TaskKind::ShopQuery
        | TaskKind::FaceDescription
        | TaskKind::UpsellSuggestion => ParsedResult::text(kind, text.to_string())
            .ok_or_else(|| ValidationFailure::shape(format!("{kind} is not a text task"))),
    }
}

fn parse(text: &str) -> Result<Value, ValidationFailure> {
    json_repair::parse_lenient(text).map_err(|e| ValidationFailure::Parse(e.to_string()))
}

// ── Voice command ───────────────────────────────────────────────────────────

fn validate_voice_command(
    doc: Value,
    ctx: &ValidationContext<'_>,
) -> Result<ParsedResult, ValidationFailure> {
    let map = match doc {
        // The model signals "not a command" with null.
        Value::Null => return Ok(ParsedResult::VoiceCommand(None)),
        Value::Object(map) => map,
        other => {
            return Err(ValidationFailure::shape(format!(
                "voice command must be an object or null, got {}",
                type_name(&other)
            )));
        },
    };

    let command_type = map
        .get("type")
        .and_then(Value::as_str)
        .map(normalize_command_type)
        .ok_or_else(|| ValidationFailure::shape("voice command is missing `type`"))?;

    let command = match command_type.as_str() {
        "ADD_ITEM" => {
            let product_id = non_empty_str(&map, "productId")
                .ok_or_else(|| ValidationFailure::shape("ADD_ITEM is missing `productId`"))?;
            if !ctx.has_product(product_id) {
                return Err(ValidationFailure::shape(format!(
                    "ADD_ITEM refers to unknown product {product_id}"
                )));
            }
            let quantity = match map.get("quantity") {
                None | Some(Value::Null) => 1.0,
                Some(v) => positive_number(v).ok_or_else(|| {
                    ValidationFailure::shape(format!("ADD_ITEM quantity must be positive, got {v}"))
                })?,
            };
            VoiceCommand::AddItem {
                product_id: product_id.to_string(),
                quantity,
            }
        },
        "CHECKOUT" => VoiceCommand::Checkout,
        "CLEAR_BILL" => VoiceCommand::ClearBill,
        other => {
            return Err(ValidationFailure::shape(format!(
                "unknown voice command type {other}"
            )));
        },
    };
    Ok(ParsedResult::VoiceCommand(Some(command)))
}

/// `add item`, `add-item` and `Add_Item` all mean `ADD_ITEM`.
fn normalize_command_type(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

// ── Visual billing ──────────────────────────────────────────────────────────

fn validate_bill(doc: Value, ctx: &ValidationContext<'_>) -> Result<ParsedResult, ValidationFailure> {
    let entries = match doc {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(ValidationFailure::shape(
                    "bill must be an array or an object with an `items` array",
                ));
            },
        },
        other => {
            return Err(ValidationFailure::shape(format!(
                "bill must be an array, got {}",
                type_name(&other)
            )));
        },
    };

    let mut lines: Vec<BillLine> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let Some(obj) = entry.as_object() else {
            debug!(entry = %entry, "dropping non-object bill entry");
            continue;
        };
        let Some(product_id) = non_empty_str(obj, "productId") else {
            debug!(entry = %entry, "dropping bill entry without productId");
            continue;
        };
        if !ctx.has_product(product_id) {
            debug!(product_id, "dropping bill entry for unknown product");
            continue;
        }
        let quantity = match obj.get("quantity") {
            None | Some(Value::Null) => 1.0,
            Some(v) => match positive_number(v) {
                Some(q) => q,
                None => {
                    debug!(product_id, quantity = %v, "dropping bill entry with invalid quantity");
                    continue;
                },
            },
        };

        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(existing) => existing.quantity += quantity,
            None => lines.push(BillLine {
                product_id: product_id.to_string(),
                quantity,
            }),
        }
    }
    Ok(ParsedResult::VisualBilling(lines))
}

// ── Face identification ─────────────────────────────────────────────────────

fn validate_face_match(
    doc: Value,
    ctx: &ValidationContext<'_>,
) -> Result<ParsedResult, ValidationFailure> {
    let Value::Object(map) = doc else {
        return Err(ValidationFailure::shape(
            "face match must be an object with `matchedId`",
        ));
    };
    let Some(matched) = map.get("matchedId") else {
        return Err(ValidationFailure::shape("face match is missing `matchedId`"));
    };

    let id = matched
        .as_str()
        .map(str::trim)
        .filter(|id| ctx.has_customer(id));
    if id.is_none() && !matched.is_null() {
        debug!(matched = %matched, "treating unrecognized matchedId as no match");
    }
    Ok(ParsedResult::FaceIdentification(id.map(str::to_string)))
}

// ── Smart insights ──────────────────────────────────────────────────────────

fn validate_insights(doc: Value) -> Result<ParsedResult, ValidationFailure> {
    let Value::Object(map) = doc else {
        return Err(ValidationFailure::shape(format!(
            "insights must be an object, got {}",
            type_name(&doc)
        )));
    };

    let sales_heatmap = match map.get("salesHeatmap") {
        Some(Value::Array(entries)) => entries.iter().filter_map(heatmap_entry).collect(),
        _ => Vec::new(),
    };

    Ok(ParsedResult::SmartInsights(SmartInsights {
        stock_prediction: summary_text(&map, "stockPrediction"),
        staff_performance: summary_text(&map, "staffPerformance"),
        sales_heatmap,
    }))
}

/// A summary field as text; string lists are joined line by line. Anything
/// else becomes the placeholder.
fn summary_text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Array(items)) => {
            let lines: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if lines.is_empty() {
                NO_DATA.into()
            } else {
                lines.join("\n")
            }
        },
        _ => NO_DATA.into(),
    }
}

fn heatmap_entry(entry: &Value) -> Option<HeatmapEntry> {
    let obj = entry.as_object()?;
    let product_name = non_empty_str(obj, "productName").or_else(|| non_empty_str(obj, "name"))?;
    let score = number(obj.get("score")?)?;
    Some(HeatmapEntry {
        product_name: product_name.to_string(),
        score: score.clamp(0.0, 100.0),
    })
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn non_empty_str<'v>(map: &'v Map<String, Value>, key: &str) -> Option<&'v str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A finite number, accepting numeric strings.
fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn positive_number(value: &Value) -> Option<f64> {
    number(value).filter(|n| *n > 0.0)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        rstest::rstest,
        shelfwise_common::{Customer, Product},
    };

    fn inventory() -> Vec<Product> {
        vec![
            Product::named("p1", "Rice 1kg"),
            Product::named("p2", "Toor Dal 500g"),
        ]
    }

    fn customers() -> Vec<Customer> {
        vec![
            Customer {
                id: "c1".into(),
                name: "Meena".into(),
                phone: None,
                loyalty_points: 0,
                face_descriptor: Some("long braid, bindi".into()),
            },
            Customer {
                id: "c2".into(),
                name: "Arjun".into(),
                phone: None,
                loyalty_points: 0,
                face_descriptor: None,
            },
        ]
    }

    fn check(kind: TaskKind, text: &str) -> Result<ParsedResult, ValidationFailure> {
        let inventory = inventory();
        let customers = customers();
        let slice = DomainSlice {
            inventory: &inventory,
            customers: &customers,
            ..Default::default()
        };
        validate(kind, text, &ValidationContext::from_slice(&slice))
    }

    #[rstest]
    #[case(TaskKind::VoiceCommand)]
    #[case(TaskKind::VisualBilling)]
    #[case(TaskKind::SmartInsights)]
    #[case(TaskKind::FaceIdentification)]
    #[case(TaskKind::MarketNews)]
    #[case(TaskKind::UpsellSuggestion)]
    fn blank_text_is_empty(#[case] kind: TaskKind) {
        assert_eq!(check(kind, "  \n "), Err(ValidationFailure::Empty));
    }

    // ── voice ──────────────────────────────────────────────────────

    #[test]
    fn voice_add_item_fraction() {
        let r = check(
            TaskKind::VoiceCommand,
            r#"{"type": "ADD_ITEM", "productId": "p1", "quantity": 0.5}"#,
        )
        .unwrap();
        assert_eq!(
            r,
            ParsedResult::VoiceCommand(Some(VoiceCommand::AddItem {
                product_id: "p1".into(),
                quantity: 0.5,
            }))
        );
    }

    #[rstest]
    #[case(r#"{"type": "CHECKOUT"}"#, VoiceCommand::Checkout)]
    #[case(r#"{"type": "checkout"}"#, VoiceCommand::Checkout)]
    #[case(r#"{"type": "clear bill"}"#, VoiceCommand::ClearBill)]
    #[case(r#"{"type": "CLEAR_BILL", "extra": true}"#, VoiceCommand::ClearBill)]
    fn voice_simple_commands(#[case] text: &str, #[case] expected: VoiceCommand) {
        assert_eq!(
            check(TaskKind::VoiceCommand, text).unwrap(),
            ParsedResult::VoiceCommand(Some(expected))
        );
    }

    #[test]
    fn voice_null_means_not_understood() {
        assert_eq!(
            check(TaskKind::VoiceCommand, "null").unwrap(),
            ParsedResult::VoiceCommand(None)
        );
    }

    #[test]
    fn voice_quantity_defaults_and_numeric_strings() {
        let r = check(TaskKind::VoiceCommand, r#"{"type":"ADD_ITEM","productId":"p2"}"#).unwrap();
        assert_eq!(
            r,
            ParsedResult::VoiceCommand(Some(VoiceCommand::AddItem {
                product_id: "p2".into(),
                quantity: 1.0,
            }))
        );
        let r = check(
            TaskKind::VoiceCommand,
            r#"{"type":"ADD_ITEM","productId":"p2","quantity":"3"}"#,
        )
        .unwrap();
        assert!(matches!(
            r,
            ParsedResult::VoiceCommand(Some(VoiceCommand::AddItem { quantity, .. })) if quantity == 3.0
        ));
    }

    #[rstest]
    #[case(r#"{"type":"ADD_ITEM","productId":"p1","quantity":0}"#)]
    #[case(r#"{"type":"ADD_ITEM","productId":"p1","quantity":-2}"#)]
    #[case(r#"{"type":"ADD_ITEM","productId":"p1","quantity":"lots"}"#)]
    #[case(r#"{"type":"ADD_ITEM","productId":"p404","quantity":1}"#)]
    #[case(r#"{"type":"ADD_ITEM","quantity":1}"#)]
    #[case(r#"{"type":"REFUND"}"#)]
    #[case(r#"{"productId":"p1"}"#)]
    #[case(r#"["CHECKOUT"]"#)]
    #[case(r#""CHECKOUT""#)]
    fn voice_shape_errors(#[case] text: &str) {
        assert!(matches!(
            check(TaskKind::VoiceCommand, text),
            Err(ValidationFailure::Shape(_))
        ));
    }

    #[test]
    fn voice_garbage_is_parse_error() {
        assert!(matches!(
            check(TaskKind::VoiceCommand, "I think they want rice"),
            Err(ValidationFailure::Parse(_))
        ));
    }

    // ── billing ────────────────────────────────────────────────────

    #[test]
    fn bill_drops_unknown_and_defaults_quantity() {
        let r = check(
            TaskKind::VisualBilling,
            r#"[{"productId":"p1","quantity":2},{"productId":"ghost","quantity":1},{"productId":"p2"}]"#,
        )
        .unwrap();
        assert_eq!(
            r,
            ParsedResult::VisualBilling(vec![
                BillLine {
                    product_id: "p1".into(),
                    quantity: 2.0
                },
                BillLine {
                    product_id: "p2".into(),
                    quantity: 1.0
                },
            ])
        );
    }

    #[test]
    fn bill_merges_duplicates_and_skips_junk() {
        let r = check(
            TaskKind::VisualBilling,
            r#"{"items": [{"productId":"p1"}, 7, {"productId":"p1","quantity":3}, {"productId":"p2","quantity":-1}, {"quantity":2}]}"#,
        )
        .unwrap();
        assert_eq!(
            r,
            ParsedResult::VisualBilling(vec![BillLine {
                product_id: "p1".into(),
                quantity: 4.0
            }])
        );
    }

    #[test]
    fn bill_empty_array_is_valid() {
        assert_eq!(
            check(TaskKind::VisualBilling, "[]").unwrap(),
            ParsedResult::VisualBilling(vec![])
        );
    }

    #[test]
    fn bill_wrong_shape() {
        assert!(matches!(
            check(TaskKind::VisualBilling, r#"{"products": []}"#),
            Err(ValidationFailure::Shape(_))
        ));
        assert!(matches!(
            check(TaskKind::VisualBilling, "42"),
            Err(ValidationFailure::Shape(_))
        ));
    }

    // ── face identification ────────────────────────────────────────

    #[rstest]
    #[case(r#"{"matchedId": "c1"}"#, Some("c1"))]
    #[case(r#"{"matchedId": " c1 "}"#, Some("c1"))]
    #[case(r#"{"matchedId": null}"#, None)]
    #[case(r#"{"matchedId": "c2"}"#, None)]
    #[case(r#"{"matchedId": "stranger"}"#, None)]
    #[case(r#"{"matchedId": 17}"#, None)]
    fn face_match_values(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(
            check(TaskKind::FaceIdentification, text).unwrap(),
            ParsedResult::FaceIdentification(expected.map(str::to_string))
        );
    }

    #[test]
    fn face_match_requires_field() {
        assert!(matches!(
            check(TaskKind::FaceIdentification, r#"{"id": "c1"}"#),
            Err(ValidationFailure::Shape(_))
        ));
    }

    // ── insights ───────────────────────────────────────────────────

    #[test]
    fn insights_full() {
        let r = check(
            TaskKind::SmartInsights,
            r#"{"stockPrediction":"Rice runs out Friday","staffPerformance":"Asha led sales","salesHeatmap":[{"productName":"Rice 1kg","score":92},{"productName":"Dal","score":140},{"productName":"Oil","score":-3}]}"#,
        )
        .unwrap();
        let ParsedResult::SmartInsights(insights) = r else {
            panic!("wrong variant");
        };
        assert_eq!(insights.stock_prediction, "Rice runs out Friday");
        assert_eq!(insights.staff_performance, "Asha led sales");
        let scores: Vec<f64> = insights.sales_heatmap.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![92.0, 100.0, 0.0]);
    }

    #[test]
    fn insights_missing_fields_use_placeholders() {
        let r = check(
            TaskKind::SmartInsights,
            r#"{"stockPrediction": ["Sugar low", "Tea low"]}"#,
        )
        .unwrap();
        let ParsedResult::SmartInsights(insights) = r else {
            panic!("wrong variant");
        };
        assert_eq!(insights.stock_prediction, "Sugar low\nTea low");
        assert_eq!(insights.staff_performance, NO_DATA);
        assert!(insights.sales_heatmap.is_empty());
    }

    #[test]
    fn insights_drops_bad_heatmap_entries() {
        let r = check(
            TaskKind::SmartInsights,
            r#"{"salesHeatmap":[{"productName":"Rice","score":"55"},{"score":10},{"productName":"Oil"},"x"]}"#,
        )
        .unwrap();
        let ParsedResult::SmartInsights(insights) = r else {
            panic!("wrong variant");
        };
        assert_eq!(insights.sales_heatmap, vec![HeatmapEntry {
            product_name: "Rice".into(),
            score: 55.0,
        }]);
    }

    #[test]
    fn insights_must_be_object() {
        assert!(matches!(
            check(TaskKind::SmartInsights, "[1,2]"),
            Err(ValidationFailure::Shape(_))
        ));
    }

    // ── text tasks ─────────────────────────────────────────────────

    #[test]
    fn text_tasks_take_trimmed_text() {
        assert_eq!(
            check(TaskKind::MarketNews, "  Onion prices up 8%.  ").unwrap(),
            ParsedResult::MarketNews("Onion prices up 8%.".into())
        );
        assert_eq!(
            check(TaskKind::UpsellSuggestion, "Offer butter with the bread.").unwrap(),
            ParsedResult::UpsellSuggestion(Some("Offer butter with the bread.".into()))
        );
    }

    #[test]
    fn text_tasks_accept_non_json() {
        assert!(check(TaskKind::ShopQuery, "{ not json").is_ok());
    }

    #[test]
    fn normalizes_command_types() {
        assert_eq!(normalize_command_type(" add-item "), "ADD_ITEM");
        assert_eq!(normalize_command_type("Clear Bill"), "CLEAR_BILL");
    }
}
