use crate::error::AppResult;
use crate::money::Money;
use crate::orders::{NewPayment, Order, Payment, PaymentData};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Order kept in process memory
///
/// Payments created against it are held in a list for inspection.
#[derive(Debug)]
pub struct InMemoryOrder {
    identifier: String,
    shop: String,
    taxful_total_price: Money,
    key: String,
    payment_data: PaymentData,
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryOrder {
    pub fn new(
        identifier: impl Into<String>,
        shop: impl Into<String>,
        taxful_total_price: Money,
        key: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            shop: shop.into(),
            taxful_total_price,
            key: key.into(),
            payment_data: PaymentData::new(),
            payments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_payment_data(mut self, processor: &str, data: serde_json::Value) -> Self {
        self.payment_data.insert(processor, data);
        self
    }

    /// Payments recorded so far
    pub async fn payments(&self) -> Vec<Payment> {
        self.payments.lock().await.clone()
    }
}

#[async_trait]
impl Order for InMemoryOrder {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn shop(&self) -> &str {
        &self.shop
    }

    fn taxful_total_price(&self) -> &Money {
        &self.taxful_total_price
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn payment_data(&self) -> &PaymentData {
        &self.payment_data
    }

    async fn create_payment(&self, payment: NewPayment) -> AppResult<Payment> {
        let record = Payment {
            id: Uuid::new_v4(),
            order_identifier: self.identifier.clone(),
            amount: payment.amount,
            payment_identifier: payment.payment_identifier,
            description: payment.description,
            created_at: Utc::now(),
        };

        debug!(
            "Recorded payment {} for order {}",
            record.payment_identifier, record.order_identifier
        );

        self.payments.lock().await.push(record.clone());
        Ok(record)
    }
}
