//! Stripe charge provider
//!
//! Captures the payment for one order through Stripe's charges API and
//! records it on the order when Stripe says the charge is paid.

use crate::config::{StripeConfig, DEFAULT_API_BASE, DEFAULT_API_VERSION};
use crate::error::{AppError, AppResult};
use crate::money::{AmountFormatter, StripeAmountFormatter};
use crate::orders::{NewPayment, Order, Payment, StripePaymentData};
use crate::payments::traits::{ChargeRequester, ChargeTransport, ProcessorIdentity};
use crate::payments::types::{ChargeOutcome, ChargeRequest, FormRequest, PaymentSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Charges a single order through Stripe
pub struct StripeCharger<'a> {
    secret_key: String,
    order: &'a dyn Order,
    transport: Arc<dyn ChargeTransport>,
    formatter: Arc<dyn AmountFormatter>,
    api_base: String,
    api_version: String,
}

impl ProcessorIdentity for StripeCharger<'_> {
    const IDENTIFIER: &'static str = "stripe";
    const NAME: &'static str = "Stripe Checkout";
}

impl<'a> StripeCharger<'a> {
    pub fn new(
        secret_key: impl Into<String>,
        order: &'a dyn Order,
        transport: Arc<dyn ChargeTransport>,
    ) -> Self {
        Self {
            secret_key: secret_key.into(),
            order,
            transport,
            formatter: Arc::new(StripeAmountFormatter),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn from_config(
        config: &StripeConfig,
        order: &'a dyn Order,
        transport: Arc<dyn ChargeTransport>,
    ) -> Self {
        Self::new(config.secret_key.clone(), order, transport)
            .with_api_base(config.api_base.clone())
            .with_api_version(config.api_version.clone())
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn AmountFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn charges_url(&self) -> String {
        format!("{}/v1/charges", self.api_base.trim_end_matches('/'))
    }

    /// Build the charge body from the order
    ///
    /// The token wins over the customer when both are present. When neither
    /// is, the request goes out without a source and Stripe rejects it.
    pub fn charge_request(&self) -> AppResult<ChargeRequest> {
        let stripe_data: StripePaymentData = self
            .order
            .payment_data()
            .get_as(Self::IDENTIFIER)?
            .unwrap_or_default();

        let token = stripe_data.token.filter(|t| !t.is_empty());
        let customer = stripe_data.customer.filter(|c| !c.is_empty());

        let source = match (token, customer) {
            (Some(token), _) => Some(PaymentSource::Token(token)),
            (None, Some(customer)) => Some(PaymentSource::Customer(customer)),
            (None, None) => {
                warn!(
                    "Order {} has neither a Stripe token nor a customer",
                    self.order.identifier()
                );
                None
            }
        };

        Ok(ChargeRequest {
            description: format!(
                "Payment for order {} on {}",
                self.order.identifier(),
                self.order.shop()
            ),
            source,
            amount_fields: self
                .formatter
                .amount_fields(self.order.taxful_total_price())?,
        })
    }

    /// Wrap the charge body in an authenticated, idempotent POST
    pub fn build_request(&self) -> AppResult<FormRequest> {
        let charge = self.charge_request()?;

        Ok(FormRequest {
            method: reqwest::Method::POST,
            url: self.charges_url(),
            form: charge.to_form(),
            basic_auth: Some((self.secret_key.clone(), String::new())),
            headers: vec![
                ("Idempotency-Key".to_string(), self.order.key().to_string()),
                ("Stripe-Version".to_string(), self.api_version.clone()),
            ],
        })
    }
}

#[async_trait]
impl<'a> ChargeRequester for StripeCharger<'a> {
    async fn create_charge(&self) -> AppResult<Payment> {
        let request = self.build_request()?;

        info!(
            "Creating Stripe charge: order={}, amount={}",
            self.order.identifier(),
            self.order.taxful_total_price()
        );

        let charge_data = self.transport.send(request).await?.into_json()?;

        let charge_id = match ChargeOutcome::from_response(&charge_data)? {
            ChargeOutcome::Succeeded { charge_id } => charge_id,
            outcome => {
                error!(
                    "Stripe charge rejected for order {}: {:?}",
                    self.order.identifier(),
                    outcome
                );
                return Err(outcome
                    .problem()
                    .unwrap_or_else(|| AppError::problem("Stripe charge failed.")));
            }
        };

        let payment = self
            .order
            .create_payment(NewPayment {
                amount: self.order.taxful_total_price().clone(),
                payment_identifier: format!("{}-{}", Self::IDENTIFIER, charge_id),
                description: "Stripe Charge".to_string(),
            })
            .await?;

        info!(
            "Stripe charge succeeded: order={}, payment_identifier={}",
            self.order.identifier(),
            payment.payment_identifier
        );

        Ok(payment)
    }
}
