//! Stripe charge capture for shop orders
//!
//! [`StripeCharger`] turns an order's checkout data into a single idempotent
//! charge request and records a payment on the order when Stripe reports the
//! charge as paid.

pub mod config;
pub mod error;
pub mod money;
pub mod orders;
pub mod payments;

pub use config::StripeConfig;
pub use error::{AppError, AppErrorKind, AppResult};
pub use money::Money;
pub use orders::{InMemoryOrder, Order, Payment};
pub use payments::providers::StripeCharger;
pub use payments::traits::{ChargeRequester, ChargeTransport, ProcessorIdentity};
pub use payments::transport::HttpRetryTransport;
