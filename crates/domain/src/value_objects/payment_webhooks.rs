use serde::Deserialize;
use serde_json::Value;

/// Provider status codes that mean the sale is settled (approved / completed).
pub const SETTLED_STATUS_CODES: [i64; 2] = [2, 10];

/// Provider status labels that mean the sale is settled.
pub const SETTLED_STATUS_LABELS: [&str; 7] = [
    "approved",
    "completed",
    "paid",
    "aprovado",
    "aprovada",
    "pago",
    "completo",
];

/// Payload exactly as the provider posts it. Every field is optional and
/// loosely typed; nothing downstream reads it directly.
#[derive(Clone, Default, Deserialize)]
pub struct RawWebhookPayload {
    #[serde(default)]
    pub token: Option<Value>,
    #[serde(default)]
    pub sale_status: Option<Value>,
    #[serde(default)]
    pub sale_status_enum: Option<Value>,
    #[serde(default)]
    pub customer: Option<RawCustomer>,
    #[serde(default)]
    pub product: Option<RawProduct>,
    #[serde(default)]
    pub sale_amount: Option<Value>,
    #[serde(default)]
    pub transaction_code: Option<Value>,
    #[serde(default)]
    pub transaction: Option<Value>,
}

// Hand-written so the shared secret never reaches the logs.
impl std::fmt::Debug for RawWebhookPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawWebhookPayload")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("sale_status", &self.sale_status)
            .field("sale_status_enum", &self.sale_status_enum)
            .field("customer", &self.customer)
            .field("product", &self.product)
            .field("sale_amount", &self.sale_amount)
            .field("transaction_code", &self.transaction_code)
            .field("transaction", &self.transaction)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCustomer {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub name: Option<String>,
}

impl RawWebhookPayload {
    pub fn body_token(&self) -> Option<String> {
        self.token.as_ref().and_then(value_as_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleStatus {
    pub code: Option<i64>,
    pub label: Option<String>,
}

impl SaleStatus {
    /// The numeric enum is authoritative when present.
    pub fn is_settled(&self) -> bool {
        match (self.code, self.label.as_deref()) {
            (Some(code), _) => SETTLED_STATUS_CODES.contains(&code),
            (None, Some(label)) => SETTLED_STATUS_LABELS.contains(&label.to_lowercase().as_str()),
            (None, None) => false,
        }
    }

    pub fn describe(&self) -> String {
        match (self.code, self.label.as_deref()) {
            (Some(code), Some(label)) => format!("{label} ({code})"),
            (Some(code), None) => code.to_string(),
            (None, Some(label)) => label.to_string(),
            (None, None) => "missing".to_string(),
        }
    }
}

/// Strictly typed webhook event. Built once from the raw payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub status: SaleStatus,
    pub customer_email: Option<String>,
    pub product_name: String,
    pub amount_minor: Option<i64>,
    pub transaction_id: Option<String>,
}

impl WebhookEvent {
    pub fn from_raw(raw: &RawWebhookPayload) -> Self {
        let mut code = raw.sale_status_enum.as_ref().and_then(value_as_code);
        let mut label = None;
        if let Some(value) = raw.sale_status.as_ref() {
            match value_as_code(value) {
                Some(numeric) if code.is_none() => code = Some(numeric),
                Some(_) => {}
                None => label = value_as_text(value),
            }
        }

        let customer_email = raw
            .customer
            .as_ref()
            .and_then(|customer| customer.email.as_deref())
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());

        let product_name = raw
            .product
            .as_ref()
            .and_then(|product| product.name.as_deref())
            .map(|name| name.trim().to_string())
            .unwrap_or_default();

        let transaction_id = raw
            .transaction_code
            .as_ref()
            .and_then(value_as_text)
            .or_else(|| raw.transaction.as_ref().and_then(value_as_text));

        Self {
            status: SaleStatus { code, label },
            customer_email,
            product_name,
            amount_minor: raw.sale_amount.as_ref().and_then(value_as_amount_minor),
            transaction_id,
        }
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn value_as_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `97`, `97.5`, `"97,50"` and `"97.50"`. Zero and negatives are treated as absent.
fn value_as_amount_minor(value: &Value) -> Option<i64> {
    let major = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().replace(',', ".").parse::<f64>().ok()?,
        _ => return None,
    };
    if !major.is_finite() || major <= 0.0 {
        return None;
    }
    let minor = (major * 100.0).round();
    (minor >= 1.0 && minor < i64::MAX as f64).then_some(minor as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> WebhookEvent {
        let raw: RawWebhookPayload = serde_json::from_value(value).unwrap();
        WebhookEvent::from_raw(&raw)
    }

    #[test]
    fn coerces_a_full_payload() {
        let event = parse(json!({
            "token": "secret",
            "sale_status_enum": 2,
            "customer": { "email": "  A@X.com " },
            "product": { "name": "Elite Black" },
            "sale_amount": "97,90",
            "transaction_code": "TX1"
        }));

        assert!(event.status.is_settled());
        assert_eq!(event.customer_email.as_deref(), Some("a@x.com"));
        assert_eq!(event.product_name, "Elite Black");
        assert_eq!(event.amount_minor, Some(9_790));
        assert_eq!(event.transaction_id.as_deref(), Some("TX1"));
    }

    #[test]
    fn pending_label_is_not_settled() {
        let event = parse(json!({ "sale_status": "Pending" }));
        assert!(!event.status.is_settled());
        assert_eq!(event.status.describe(), "Pending");
    }

    #[test]
    fn numeric_enum_wins_over_label() {
        let event = parse(json!({ "sale_status": "approved", "sale_status_enum": "7" }));
        assert!(!event.status.is_settled());
        assert_eq!(event.status.code, Some(7));
    }

    #[test]
    fn transaction_falls_back_to_transaction_field() {
        let event = parse(json!({ "transaction": 123456 }));
        assert_eq!(event.transaction_id.as_deref(), Some("123456"));
    }

    #[test]
    fn zero_or_garbage_amount_is_absent() {
        assert_eq!(parse(json!({ "sale_amount": 0 })).amount_minor, None);
        assert_eq!(parse(json!({ "sale_amount": "abc" })).amount_minor, None);
        assert_eq!(parse(json!({ "sale_amount": 49.9 })).amount_minor, Some(4_990));
    }

    #[test]
    fn debug_output_redacts_token() {
        let raw: RawWebhookPayload =
            serde_json::from_value(json!({ "token": "super-secret" })).unwrap();
        let rendered = format!("{raw:?}");
        assert!(!rendered.contains("super-secret"));
        assert_eq!(raw.body_token().as_deref(), Some("super-secret"));
    }
}
