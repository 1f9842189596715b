//! Charge request and response types
//!
//! Requests are built as form fields; responses are classified into
//! [`ChargeOutcome`] before anything else looks at them.

use crate::error::{AppError, AppResult, ExternalError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where the charged funds come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSource {
    /// One-time token, sent as `source`
    Token(String),
    /// Saved customer, sent as `customer`
    Customer(String),
}

impl PaymentSource {
    pub fn form_field(&self) -> (&'static str, &str) {
        match self {
            PaymentSource::Token(token) => ("source", token),
            PaymentSource::Customer(customer) => ("customer", customer),
        }
    }
}

/// Body of a charge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub description: String,
    pub source: Option<PaymentSource>,
    /// Processor-formatted amount fields (`amount`, `currency`)
    pub amount_fields: BTreeMap<String, String>,
}

impl ChargeRequest {
    /// Form fields in a stable order
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![("description".to_string(), self.description.clone())];
        if let Some(source) = &self.source {
            let (name, value) = source.form_field();
            form.push((name.to_string(), value.to_string()));
        }
        form.extend(
            self.amount_fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        form
    }
}

/// A form-encoded HTTP request handed to a [`ChargeTransport`]
///
/// [`ChargeTransport`]: crate::payments::traits::ChargeTransport
#[derive(Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub method: reqwest::Method,
    pub url: String,
    pub form: Vec<(String, String)>,
    /// Basic-auth username and password
    pub basic_auth: Option<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl FormRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for FormRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("form", &self.form)
            .field("basic_auth", &self.basic_auth.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers)
            .finish()
    }
}

/// What a transport hands back
#[derive(Debug, Clone, PartialEq)]
pub enum TransportResponse {
    /// Undecoded HTTP response body
    Raw { status: u16, body: String },
    /// Body already decoded by the transport
    Decoded(Value),
}

impl TransportResponse {
    pub fn into_json(self) -> AppResult<Value> {
        match self {
            TransportResponse::Decoded(value) => Ok(value),
            TransportResponse::Raw { status, body } => {
                serde_json::from_str(&body).map_err(|e| {
                    AppError::from(ExternalError::InvalidResponse {
                        provider: "Stripe".to_string(),
                        message: format!("HTTP {} with undecodable body: {}", status, e),
                    })
                })
            }
        }
    }
}

/// Classified charge response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    Succeeded { charge_id: String },
    ProcessorError { message: String, error_type: String },
    Failed { code: String, message: String },
    NotPaid,
}

impl ChargeOutcome {
    /// Classify a decoded response.
    ///
    /// Checked in order: `error` object, then `failure_code`/`failure_message`,
    /// then the `paid` flag. A paid response without an `id` is invalid.
    pub fn from_response(data: &Value) -> AppResult<Self> {
        if let Some(error) = data.get("error").filter(|v| is_truthy(v)) {
            let outcome = if error.is_object() {
                ChargeOutcome::ProcessorError {
                    message: text_field(error, "message"),
                    error_type: text_field(error, "type"),
                }
            } else {
                ChargeOutcome::ProcessorError {
                    message: render(error),
                    error_type: String::new(),
                }
            };
            return Ok(outcome);
        }

        let failure_code = data.get("failure_code").filter(|v| is_truthy(v));
        let failure_message = data.get("failure_message").filter(|v| is_truthy(v));
        if failure_code.is_some() || failure_message.is_some() {
            return Ok(ChargeOutcome::Failed {
                code: failure_code.map(render).unwrap_or_default(),
                message: failure_message.map(render).unwrap_or_default(),
            });
        }

        if !data.get("paid").is_some_and(is_truthy) {
            return Ok(ChargeOutcome::NotPaid);
        }

        match data.get("id").filter(|v| is_truthy(v)) {
            Some(id) => Ok(ChargeOutcome::Succeeded {
                charge_id: render(id),
            }),
            None => Err(ExternalError::InvalidResponse {
                provider: "Stripe".to_string(),
                message: "paid charge is missing its id".to_string(),
            }
            .into()),
        }
    }

    /// User-facing error for a non-successful outcome
    pub fn problem(&self) -> Option<AppError> {
        let message = match self {
            ChargeOutcome::Succeeded { .. } => return None,
            ChargeOutcome::ProcessorError {
                message,
                error_type,
            } => format!("Error! Stripe: {} ({}).", message, error_type),
            ChargeOutcome::Failed { code, message } => {
                format!("Stripe: {} ({}).", message, code)
            }
            ChargeOutcome::NotPaid => "Stripe Charge does not say 'paid'.".to_string(),
        };
        Some(AppError::problem(message))
    }
}

/// JSON truthiness: null, false, zero, "" and empty containers are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn text_field(object: &Value, name: &str) -> String {
    object.get(name).map(render).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_object_wins_over_everything() {
        let outcome = ChargeOutcome::from_response(&json!({
            "error": {"message": "card declined", "type": "card_error"},
            "failure_code": "card_declined",
            "paid": true,
            "id": "ch_1",
        }))
        .unwrap();

        assert_eq!(
            outcome,
            ChargeOutcome::ProcessorError {
                message: "card declined".to_string(),
                error_type: "card_error".to_string(),
            }
        );
        assert_eq!(
            outcome.problem().unwrap().to_string(),
            "Error! Stripe: card declined (card_error)."
        );
    }

    #[test]
    fn test_error_string_keeps_its_text() {
        let outcome = ChargeOutcome::from_response(&json!({"error": "boom"})).unwrap();
        assert_eq!(
            outcome.problem().unwrap().to_string(),
            "Error! Stripe: boom ()."
        );
    }

    #[test]
    fn test_empty_error_object_is_ignored() {
        let outcome = ChargeOutcome::from_response(&json!({
            "error": {},
            "paid": true,
            "id": "ch_2",
        }))
        .unwrap();
        assert_eq!(
            outcome,
            ChargeOutcome::Succeeded {
                charge_id: "ch_2".to_string()
            }
        );
        assert!(outcome.problem().is_none());
    }

    #[test]
    fn test_failure_fields_render_both_placeholders() {
        let outcome = ChargeOutcome::from_response(&json!({
            "failure_code": "card_declined",
            "failure_message": null,
            "paid": true,
        }))
        .unwrap();
        assert_eq!(
            outcome.problem().unwrap().to_string(),
            "Stripe:  (card_declined)."
        );

        let outcome = ChargeOutcome::from_response(&json!({
            "failure_message": "Your card has insufficient funds.",
        }))
        .unwrap();
        assert_eq!(
            outcome.problem().unwrap().to_string(),
            "Stripe: Your card has insufficient funds. ()."
        );
    }

    #[test]
    fn test_empty_failure_fields_fall_through() {
        let outcome = ChargeOutcome::from_response(&json!({
            "failure_code": "",
            "failure_message": "",
            "paid": false,
        }))
        .unwrap();
        assert_eq!(outcome, ChargeOutcome::NotPaid);
    }

    #[test]
    fn test_empty_failure_fields_with_paid_succeed() {
        let outcome = ChargeOutcome::from_response(&json!({
            "id": "ch_5",
            "paid": true,
            "failure_code": "",
            "failure_message": null,
        }))
        .unwrap();
        assert_eq!(
            outcome,
            ChargeOutcome::Succeeded {
                charge_id: "ch_5".to_string()
            }
        );
    }

    #[test]
    fn test_falsy_paid_values() {
        for data in [
            json!({"id": "ch_3"}),
            json!({"id": "ch_3", "paid": false}),
            json!({"id": "ch_3", "paid": 0}),
            json!({"id": "ch_3", "paid": null}),
            json!({"id": "ch_3", "paid": ""}),
        ] {
            let outcome = ChargeOutcome::from_response(&data).unwrap();
            assert_eq!(outcome, ChargeOutcome::NotPaid, "{}", data);
            assert_eq!(
                outcome.problem().unwrap().to_string(),
                "Stripe Charge does not say 'paid'."
            );
        }
    }

    #[test]
    fn test_paid_without_id_is_invalid() {
        let err = ChargeOutcome::from_response(&json!({"paid": true})).unwrap_err();
        assert!(!err.is_problem());
    }

    #[test]
    fn test_raw_response_decoding() {
        let raw = TransportResponse::Raw {
            status: 200,
            body: r#"{"id":"ch_1","paid":true}"#.to_string(),
        };
        assert_eq!(raw.into_json().unwrap(), json!({"id": "ch_1", "paid": true}));

        let garbage = TransportResponse::Raw {
            status: 502,
            body: "<html>Bad gateway</html>".to_string(),
        };
        assert!(garbage.into_json().is_err());
    }

    #[test]
    fn test_form_fields_order() {
        let mut amount_fields = BTreeMap::new();
        amount_fields.insert("amount".to_string(), "1999".to_string());
        amount_fields.insert("currency".to_string(), "usd".to_string());

        let request = ChargeRequest {
            description: "Payment for order 1 on Shop".to_string(),
            source: Some(PaymentSource::Customer("cus_1".to_string())),
            amount_fields,
        };

        assert_eq!(
            request.to_form(),
            vec![
                ("description".to_string(), "Payment for order 1 on Shop".to_string()),
                ("customer".to_string(), "cus_1".to_string()),
                ("amount".to_string(), "1999".to_string()),
                ("currency".to_string(), "usd".to_string()),
            ]
        );
    }
}
