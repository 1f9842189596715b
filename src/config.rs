use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
/// Pins the response shape the charge interpretation relies on
pub const DEFAULT_API_VERSION: &str = "2015-04-07";

/// Stripe connection settings
#[derive(Clone, Deserialize)]
pub struct StripeConfig {
    /// Stripe API secret key, sent as the basic-auth username
    pub secret_key: String,
    /// API base URL (defaults to https://api.stripe.com)
    pub api_base: String,
    /// Value of the `Stripe-Version` header
    pub api_version: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum number of transport-level retries
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries
    pub retry_backoff_ms: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 1000,
        }
    }
}

// Keeps the secret key out of logs.
impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl StripeConfig {
    /// Load settings from `STRIPE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_source(
            config::Environment::with_prefix("STRIPE").try_parsing(true),
        )
    }

    /// Load settings from any `config` source layered over the defaults
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("secret_key", defaults.secret_key)?
            .set_default("api_base", defaults.api_base)?
            .set_default("api_version", defaults.api_version)?
            .set_default("timeout_secs", defaults.timeout_secs as i64)?
            .set_default("max_retries", i64::from(defaults.max_retries))?
            .set_default("retry_backoff_ms", defaults.retry_backoff_ms as i64)?
            .add_source(source)
            .build()
            .context("failed to read Stripe settings")?;

        let config: StripeConfig = settings
            .try_deserialize()
            .context("invalid Stripe settings")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.secret_key.trim().is_empty() {
            return Err(anyhow!("STRIPE_SECRET_KEY cannot be empty"));
        }

        if self.api_base.trim().is_empty() {
            return Err(anyhow!("STRIPE_API_BASE cannot be empty"));
        }

        if self.api_version.trim().is_empty() {
            return Err(anyhow!("STRIPE_API_VERSION cannot be empty"));
        }

        if self.timeout_secs == 0 {
            return Err(anyhow!("STRIPE_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(())
    }

    /// Whether the key belongs to Stripe's test mode
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_") || self.secret_key.starts_with("rk_test_")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
