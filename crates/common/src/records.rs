use serde::{Deserialize, Serialize};

/// A stocked item as the point-of-sale knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<f64>,
    #[serde(default)]
    pub stock: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_restocked: Option<String>,
}

impl Product {
    /// Minimal product with only identity fields populated.
    #[must_use]
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: None,
            category: None,
            price: 0.0,
            cost_price: None,
            stock: 0.0,
            unit: None,
            expiry_date: None,
            last_restocked: None,
        }
    }
}

/// One line of a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub price: f64,
}

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Unix epoch milliseconds.
    pub timestamp: u64,
    #[serde(default)]
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub loyalty_points: u64,
    /// Free-text description of the customer's face produced by an earlier
    /// `FaceDescription` run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_descriptor: Option<String>,
}

impl Customer {
    /// Stored face descriptor, ignoring blank values.
    #[must_use]
    pub fn descriptor(&self) -> Option<&str> {
        self.face_descriptor
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn product_parses_with_sparse_fields() {
        let p: Product = serde_json::from_value(json!({"id": "p1", "name": "Rice 1kg"})).unwrap();
        assert_eq!(p, Product::named("p1", "Rice 1kg"));
    }

    #[test]
    fn product_serializes_camel_case() {
        let p = Product {
            cost_price: Some(40.0),
            expiry_date: Some("2026-12-01".into()),
            ..Product::named("p1", "Rice 1kg")
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["costPrice"], 40.0);
        assert_eq!(v["expiryDate"], "2026-12-01");
        assert!(v.get("brand").is_none());
    }

    #[test]
    fn transaction_round_trip() {
        let v = json!({
            "id": "t1",
            "timestamp": 1_700_000_000_000u64,
            "items": [{"productId": "p1", "name": "Rice", "quantity": 2, "price": 60}],
            "total": 120,
            "staffName": "Asha",
        });
        let t: Transaction = serde_json::from_value(v).unwrap();
        assert_eq!(t.items.len(), 1);
        assert_eq!(t.staff_name.as_deref(), Some("Asha"));
        assert!(t.customer_id.is_none());
    }

    #[test]
    fn blank_descriptor_is_absent() {
        let mut c = Customer {
            id: "c1".into(),
            name: "Ravi".into(),
            phone: None,
            loyalty_points: 0,
            face_descriptor: Some("   ".into()),
        };
        assert!(c.descriptor().is_none());
        c.face_descriptor = Some(" round glasses, beard ".into());
        assert_eq!(c.descriptor(), Some("round glasses, beard"));
    }
}
