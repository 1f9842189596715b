//! Payment seams
//!
//! The charge requester depends on a transport it is handed rather than one it
//! builds, so tests and hosts can substitute their own.

use crate::error::AppResult;
use crate::orders::Payment;
use crate::payments::types::{FormRequest, TransportResponse};
use async_trait::async_trait;

/// Performs an outbound HTTP call, including whatever retry policy it has
#[async_trait]
pub trait ChargeTransport: Send + Sync {
    /// Send a form-encoded request
    ///
    /// # Returns
    /// * `TransportResponse` - the body of the final attempt, raw or decoded
    async fn send(&self, request: FormRequest) -> AppResult<TransportResponse>;
}

/// Captures a payment for a single order
#[async_trait]
pub trait ChargeRequester: Send + Sync {
    /// Charge the order and record the payment on success
    ///
    /// Returns a user-facing problem when the processor does not report the
    /// charge as paid. No payment is recorded in that case.
    async fn create_charge(&self) -> AppResult<Payment>;
}

/// Identifier and display name a checkout uses to list a processor
pub trait ProcessorIdentity {
    const IDENTIFIER: &'static str;
    const NAME: &'static str;
}
