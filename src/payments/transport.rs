//! HTTP transport with retry
//!
//! Retries connection failures, rate limits and server errors with exponential
//! backoff. Every attempt carries the same headers, so a charge keeps its
//! idempotency key across retries.

use crate::config::StripeConfig;
use crate::error::{AppError, AppResult, ExternalError};
use crate::payments::traits::ChargeTransport;
use crate::payments::types::{FormRequest, TransportResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, warn};

pub struct HttpRetryTransport {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpRetryTransport {
    pub fn new(timeout: Duration, max_retries: u32, retry_backoff: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stripe-charger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries,
            retry_backoff,
        })
    }

    pub fn from_config(config: &StripeConfig) -> AppResult<Self> {
        Self::new(config.timeout(), config.max_retries, config.retry_backoff())
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2_u32.saturating_pow(attempt))
    }

    fn build(&self, request: &FormRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .form(&request.form);

        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
    }
}

#[async_trait]
impl ChargeTransport for HttpRetryTransport {
    async fn send(&self, request: FormRequest) -> AppResult<TransportResponse> {
        let mut last_error: Option<reqwest::Error> = None;

        for attempt in 0..=self.max_retries {
            let retries_left = attempt < self.max_retries;

            debug!(
                "Sending {} {} (attempt {})",
                request.method,
                request.url,
                attempt + 1
            );

            let response = match self.build(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    if retries_left {
                        let backoff = self.backoff(attempt);
                        warn!(
                            "Request error, retrying after {:?} (attempt {}): {}",
                            backoff,
                            attempt + 1,
                            e
                        );
                        last_error = Some(e);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    last_error = Some(e);
                    break;
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if retries_left {
                    let backoff = self.backoff(attempt);
                    warn!(
                        "Rate limited, retrying after {:?} (attempt {})",
                        backoff,
                        attempt + 1
                    );
                    tokio::time::sleep(backoff).await;
                    continue;
                }

                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok());
                error!("Rate limit persisted after {} retries", self.max_retries);
                return Err(ExternalError::RateLimit {
                    service: "Stripe".to_string(),
                    retry_after,
                }
                .into());
            }

            if status.is_server_error() && retries_left {
                let backoff = self.backoff(attempt);
                warn!(
                    "Server error {}, retrying after {:?} (attempt {})",
                    status,
                    backoff,
                    attempt + 1
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            let body = response.text().await.map_err(|e| {
                AppError::from(ExternalError::PaymentProvider {
                    provider: "Stripe".to_string(),
                    message: format!("Failed to read response body: {}", e),
                    is_retryable: false,
                })
            })?;

            if !status.is_success() {
                warn!("Stripe answered HTTP {}", status);
            }

            return Ok(TransportResponse::Raw {
                status: status.as_u16(),
                body,
            });
        }

        Err(ExternalError::PaymentProvider {
            provider: "Stripe".to_string(),
            message: format!(
                "Request failed after {} retries: {}",
                self.max_retries,
                last_error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "Unknown error".to_string())
            ),
            is_retryable: true,
        }
        .into())
    }
}
