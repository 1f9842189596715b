//! Payment processor integration
//!
//! Request construction, transport and response interpretation for charging
//! an order through a card processor.

pub mod providers;
pub mod traits;
pub mod transport;
pub mod types;
