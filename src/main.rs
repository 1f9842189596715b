use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use stripe_charger::{
    ChargeRequester, HttpRetryTransport, InMemoryOrder, Money, ProcessorIdentity, StripeCharger,
    StripeConfig,
};
use tracing_subscriber::EnvFilter;

/// Charge one order through Stripe and print the recorded payment
#[derive(Debug, Parser)]
#[command(name = "stripe-charge", version)]
struct Args {
    /// Order identifier shown in the charge description
    #[arg(long)]
    order_id: String,

    /// Shop name shown in the charge description
    #[arg(long)]
    shop: String,

    /// Tax-inclusive total, e.g. 19.99
    #[arg(long)]
    amount: Decimal,

    /// ISO 4217 currency code
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Unique order key, sent as the idempotency key
    #[arg(long)]
    key: String,

    /// One-time Stripe source token
    #[arg(long)]
    token: Option<String>,

    /// Saved Stripe customer id, used when no token is given
    #[arg(long)]
    customer: Option<String>,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = StripeConfig::from_env()?;
    tracing::info!("Stripe API: {}", config.api_base);
    if config.is_test_mode() {
        tracing::info!("Using a Stripe test-mode key");
    }

    let order = InMemoryOrder::new(
        args.order_id,
        args.shop,
        Money::new(args.amount, args.currency),
        args.key,
    )
    .with_payment_data(
        StripeCharger::IDENTIFIER,
        json!({ "token": args.token, "customer": args.customer }),
    );

    let transport = Arc::new(HttpRetryTransport::from_config(&config)?);
    let charger = StripeCharger::from_config(&config, &order, transport);

    let payment = charger
        .create_charge()
        .await
        .context("charge was not captured")?;

    println!("{}", serde_json::to_string_pretty(&payment)?);
    Ok(())
}
