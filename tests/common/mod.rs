#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Mutex;
use stripe_charger::payments::types::{FormRequest, TransportResponse};
use stripe_charger::{AppResult, ChargeTransport, InMemoryOrder, Money};

/// Transport double that answers with a canned body and keeps every request
pub struct RecordingTransport {
    response: Value,
    requests: Mutex<Vec<FormRequest>>,
}

impl RecordingTransport {
    pub fn answering(response: Value) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<FormRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChargeTransport for RecordingTransport {
    async fn send(&self, request: FormRequest) -> AppResult<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        Ok(TransportResponse::Raw {
            status: 200,
            body: self.response.to_string(),
        })
    }
}

pub fn usd(value: Decimal) -> Money {
    Money::new(value, "USD")
}

pub fn order_with(total: Money, stripe: Value) -> InMemoryOrder {
    InMemoryOrder::new("1042", "Demo Shop", total, "ord-123").with_payment_data("stripe", stripe)
}
