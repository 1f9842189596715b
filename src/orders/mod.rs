//! Order collaborator
//!
//! Orders are owned by the surrounding shop. A charge only reads them and, on
//! success, asks them to record a payment.

pub mod memory;

use crate::error::{AppError, AppResult};
use crate::money::Money;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub use memory::InMemoryOrder;

/// Processor-specific data attached to an order at checkout, keyed by
/// processor identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentData(HashMap<String, serde_json::Value>);

impl PaymentData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, processor: impl Into<String>, data: serde_json::Value) {
        self.0.insert(processor.into(), data);
    }

    pub fn get(&self, processor: &str) -> Option<&serde_json::Value> {
        self.0.get(processor)
    }

    /// Typed view of one processor's entry
    pub fn get_as<T: DeserializeOwned>(&self, processor: &str) -> AppResult<Option<T>> {
        match self.0.get(processor) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| {
                    AppError::configuration(format!(
                        "Malformed payment data for '{}': {}",
                        processor, e
                    ))
                }),
        }
    }
}

/// Stripe's entry in [`PaymentData`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripePaymentData {
    /// One-time source token from Stripe Checkout
    #[serde(default)]
    pub token: Option<String>,
    /// Saved customer reference
    #[serde(default)]
    pub customer: Option<String>,
}

/// Payment to be recorded against an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub amount: Money,
    pub payment_identifier: String,
    pub description: String,
}

/// Payment record as persisted by the order subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_identifier: String,
    pub amount: Money,
    pub payment_identifier: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// The parts of an order a charge needs
#[async_trait]
pub trait Order: Send + Sync {
    /// Human-readable order identifier
    fn identifier(&self) -> &str;

    /// Name of the shop the order was placed in
    fn shop(&self) -> &str;

    /// Tax-inclusive total
    fn taxful_total_price(&self) -> &Money;

    /// Unique order key, used as the idempotency key
    fn key(&self) -> &str;

    fn payment_data(&self) -> &PaymentData;

    /// Persist a payment against this order
    async fn create_payment(&self, payment: NewPayment) -> AppResult<Payment>;
}
