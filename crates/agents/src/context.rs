//! Per-task projection of shop data into the smallest payload the model needs.
//!
//! Every record is serialized and then cut down to the fields listed for the
//! task in [`whitelist`]. Nothing outside that table can reach a prompt.

use {
    serde::Serialize,
    serde_json::{Map, Value},
    shelfwise_common::{Customer, Product, TaskKind, Transaction},
};

/// Sales history sent for insights is capped to this many transactions.
pub const RECENT_SALES_LIMIT: usize = 20;

/// Read-only shop data available to a call. Sections a task does not use are
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainSlice<'a> {
    pub inventory: &'a [Product],
    pub sales: &'a [Transaction],
    pub customers: &'a [Customer],
    pub cart_item_names: &'a [String],
    /// Caller-prepared summary of the shop for free-form questions.
    pub shop_summary: Option<&'a str>,
}

impl DomainSlice<'_> {
    /// Customers that carry a usable face descriptor.
    pub fn customers_with_descriptor(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().filter(|c| c.descriptor().is_some())
    }

    /// Cart item names with blanks removed.
    pub fn cart_names(&self) -> impl Iterator<Item = &str> {
        self.cart_item_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
    }
}

/// Fields a task may see, by record type. Names are the serialized
/// (camelCase) field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWhitelist {
    pub inventory: &'static [&'static str],
    pub sales: &'static [&'static str],
    pub sale_lines: &'static [&'static str],
    pub customers: &'static [&'static str],
    pub sales_limit: Option<usize>,
}

impl FieldWhitelist {
    const NONE: Self = Self {
        inventory: &[],
        sales: &[],
        sale_lines: &[],
        customers: &[],
        sales_limit: None,
    };
}

/// The whitelist table.
#[must_use]
pub fn whitelist(kind: TaskKind) -> FieldWhitelist {
    match kind {
        TaskKind::VoiceCommand => FieldWhitelist {
            inventory: &["id", "name"],
            ..FieldWhitelist::NONE
        },
        TaskKind::VisualBilling => FieldWhitelist {
            inventory: &["id", "name", "brand"],
            ..FieldWhitelist::NONE
        },
        TaskKind::SmartInsights => FieldWhitelist {
            inventory: &["name", "stock"],
            sales: &["timestamp", "items", "total", "staffName"],
            sale_lines: &["name", "quantity"],
            sales_limit: Some(RECENT_SALES_LIMIT),
            ..FieldWhitelist::NONE
        },
        TaskKind::FaceIdentification => FieldWhitelist {
            customers: &["id", "faceDescriptor"],
            ..FieldWhitelist::NONE
        },
        TaskKind::MarketNews
        | TaskKind::PriceSuggestion
        | TaskKind::ShopQuery
        | TaskKind::FaceDescription
        | TaskKind::UpsellSuggestion => FieldWhitelist::NONE,
    }
}

/// The minimized context for one call, keyed by section name
/// (`inventory`, `sales`, `customers`, `cart`, `shopSummary`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContextPayload(Map<String, Value>);

impl ContextPayload {
    /// Project `slice` for `kind`.
    pub fn build(kind: TaskKind, slice: &DomainSlice<'_>) -> Result<Self, serde_json::Error> {
        let fields = whitelist(kind);
        let mut sections = Map::new();

        if !fields.inventory.is_empty() {
            let items = slice
                .inventory
                .iter()
                .map(|p| project(p, fields.inventory))
                .collect::<Result<Vec<_>, _>>()?;
            sections.insert("inventory".into(), Value::Array(items));
        }

        if !fields.sales.is_empty() {
            let mut recent: Vec<&Transaction> = slice.sales.iter().collect();
            recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            if let Some(limit) = fields.sales_limit {
                recent.truncate(limit);
            }
            let sales = recent
                .into_iter()
                .map(|t| project_sale(t, &fields))
                .collect::<Result<Vec<_>, _>>()?;
            sections.insert("sales".into(), Value::Array(sales));
        }

        if !fields.customers.is_empty() {
            let customers = slice
                .customers_with_descriptor()
                .map(|c| project(c, fields.customers))
                .collect::<Result<Vec<_>, _>>()?;
            sections.insert("customers".into(), Value::Array(customers));
        }

        match kind {
            TaskKind::UpsellSuggestion => {
                let cart = slice
                    .cart_names()
                    .map(|n| Value::String(n.to_string()))
                    .collect();
                sections.insert("cart".into(), Value::Array(cart));
            },
            TaskKind::ShopQuery => {
                if let Some(summary) = slice.shop_summary.map(str::trim).filter(|s| !s.is_empty()) {
                    sections.insert("shopSummary".into(), Value::String(summary.to_string()));
                }
            },
            _ => {},
        }

        Ok(Self(sections))
    }

    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON for one section, `[]` when absent.
    #[must_use]
    pub fn section_json(&self, name: &str) -> String {
        self.0
            .get(name)
            .map(Value::to_string)
            .unwrap_or_else(|| "[]".into())
    }

    /// Every key that appears in any record of `section`.
    #[must_use]
    pub fn record_keys(&self, section: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .0
            .get(section)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .flat_map(|obj| obj.keys().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

fn project<T: Serialize>(record: &T, fields: &[&str]) -> Result<Value, serde_json::Error> {
    let mut map = match serde_json::to_value(record)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.retain(|key, _| fields.contains(&key.as_str()));
    Ok(Value::Object(map))
}

fn project_sale(sale: &Transaction, fields: &FieldWhitelist) -> Result<Value, serde_json::Error> {
    let mut projected = project(sale, fields.sales)?;
    if let Some(Value::Array(lines)) = projected.get_mut("items") {
        for line in lines.iter_mut() {
            if let Value::Object(map) = line {
                map.retain(|key, _| fields.sale_lines.contains(&key.as_str()));
            }
        }
    }
    Ok(projected)
}
