//! Payment provider implementations
//!
//! Concrete implementations of the ChargeRequester trait for different providers.

pub mod stripe;

pub use stripe::StripeCharger;
