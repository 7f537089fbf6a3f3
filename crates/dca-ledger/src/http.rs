//! # Staking Gateway Client
//!
//! `HttpLedgerClient` talks to a staking gateway that holds key custody for
//! the configured wallet. One client implements both [`WalletHandle`] and
//! [`LedgerClient`]; the binary shares it behind an `Arc`.
//!
//! ## Endpoints
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | unlock | `POST /v1/wallets/{name}/unlock` `{network, password?}` | `{coldkey_address}` |
//! | balance | `GET /v1/accounts/{address}/balance?network=` | `{free_rao}` |
//! | stake | `POST /v1/stake` | `{accepted, extrinsic_hash?}` |
//!
//! ## Error Mapping
//!
//! 5xx and transport failures are [`LedgerError::Unavailable`], timeouts are
//! [`LedgerError::Timeout`], and 4xx on a stake submission is
//! [`LedgerError::Rejected`] with the response body as the reason.
//!
//! Balance reads retry transport failures through [`Backoff`]. Unlock and
//! stake submissions are sent exactly once.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

use dca_core::{Balance, LedgerSettings, Network, WalletSpec};

use crate::error::{LedgerError, WalletError};
use crate::retry::Backoff;
use crate::traits::{LedgerClient, StakeRequest, WalletHandle};

/// Connection settings for [`HttpLedgerClient`].
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway base URL. Path segments are appended to it.
    pub endpoint: Url,
    /// Network every request is made against.
    pub network: Network,
    /// Wallet the gateway unlocks and stakes from.
    pub wallet: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Bearer token for the gateway, if it requires one.
    pub api_token: Option<Zeroizing<String>>,
    /// Wallet password forwarded on unlock.
    pub password: Option<Zeroizing<String>>,
    /// Retry schedule for balance reads.
    pub backoff: Backoff,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("endpoint", &self.endpoint.as_str())
            .field("network", &self.network)
            .field("wallet", &self.wallet)
            .field("timeout", &self.timeout)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl GatewayConfig {
    pub fn new(endpoint: Url, network: Network, wallet: impl Into<String>) -> Self {
        Self {
            endpoint,
            network,
            wallet: wallet.into(),
            timeout: Duration::from_secs(LedgerSettings::DEFAULT_TIMEOUT_SECS),
            api_token: None,
            password: None,
            backoff: Backoff::default(),
        }
    }

    /// Build from the validated `ledger` section. The bearer token is read
    /// from the environment variable the section names; naming a variable
    /// that is unset is a configuration error.
    pub fn from_settings(
        settings: &LedgerSettings,
        network: Network,
        wallet: &WalletSpec,
    ) -> Result<Self, LedgerError> {
        let mut config = Self::new(settings.endpoint.clone(), network, wallet.name.clone());
        config.timeout = Duration::from_secs(settings.timeout_secs);
        if let Some(var) = &settings.api_token_env {
            let token = std::env::var(var).map_err(|_| LedgerError::NotConfigured {
                reason: format!("environment variable {var} is not set"),
            })?;
            config.api_token = Some(Zeroizing::new(token));
        }
        Ok(config)
    }

    pub fn with_password(mut self, password: Zeroizing<String>) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(Zeroizing::new(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

// -- Wire types -------------------------------------------------------------

#[derive(Serialize)]
struct UnlockBody<'a> {
    network: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Deserialize)]
struct UnlockResponse {
    coldkey_address: String,
}

#[derive(Deserialize)]
struct BalanceResponse {
    free_rao: u64,
}

#[derive(Serialize)]
struct StakeBody<'a> {
    network: &'static str,
    wallet: &'a str,
    hotkey: &'a str,
    netuid: u16,
    amount_rao: u64,
    wait_for_inclusion: bool,
    wait_for_finalization: bool,
}

#[derive(Deserialize)]
struct StakeResponse {
    accepted: bool,
    #[serde(default)]
    extrinsic_hash: Option<String>,
}

// -- Client -----------------------------------------------------------------

/// HTTP client for the staking gateway.
pub struct HttpLedgerClient {
    client: reqwest::Client,
    endpoint: Url,
    network: Network,
    wallet: String,
    password: Option<Zeroizing<String>>,
    address: RwLock<Option<String>>,
    timeout: Duration,
    backoff: Backoff,
}

impl fmt::Debug for HttpLedgerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLedgerClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("network", &self.network)
            .field("wallet", &self.wallet)
            .field("address", &*self.address.read())
            .finish_non_exhaustive()
    }
}

impl HttpLedgerClient {
    pub fn new(config: GatewayConfig) -> Result<Self, LedgerError> {
        if config.endpoint.cannot_be_a_base() {
            return Err(LedgerError::NotConfigured {
                reason: format!("endpoint {} cannot carry a path", config.endpoint),
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                .map_err(|_| LedgerError::NotConfigured {
                    reason: "invalid API token characters".into(),
                })?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LedgerError::NotConfigured {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            network: config.network,
            wallet: config.wallet,
            password: config.password,
            address: RwLock::new(None),
            timeout: config.timeout,
            backoff: config.backoff,
        })
    }

    /// `endpoint` with `segments` appended as escaped path segments.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // `new` rejected cannot-be-a-base endpoints.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn transport_error(&self, operation: &str, e: reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Timeout {
                elapsed_ms: self.timeout_ms(),
            }
        } else {
            LedgerError::Unavailable {
                reason: format!("{operation}: {e}"),
            }
        }
    }
}

/// The status line plus response body, for error messages.
async fn describe_failure(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[async_trait]
impl WalletHandle for HttpLedgerClient {
    async fn unlock(&self) -> Result<(), WalletError> {
        let unlock_failed = |reason: String| WalletError::UnlockFailed {
            wallet: self.wallet.clone(),
            reason,
        };

        let body = UnlockBody {
            network: self.network.as_str(),
            password: self.password.as_deref().map(String::as_str),
        };
        let resp = self
            .client
            .post(self.url(&["v1", "wallets", &self.wallet, "unlock"]))
            .json(&body)
            .send()
            .await
            .map_err(|e| unlock_failed(self.transport_error("unlock", e).to_string()))?;

        if !resp.status().is_success() {
            return Err(unlock_failed(describe_failure(resp).await));
        }

        let unlocked: UnlockResponse = resp
            .json()
            .await
            .map_err(|e| unlock_failed(format!("response deserialization failed: {e}")))?;

        tracing::info!(wallet = %self.wallet, address = %unlocked.coldkey_address, "wallet unlocked");
        *self.address.write() = Some(unlocked.coldkey_address);
        Ok(())
    }

    fn address(&self) -> Option<String> {
        self.address.read().clone()
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        let unavailable = |reason: String| WalletError::BalanceUnavailable {
            address: address.to_string(),
            reason,
        };

        let url = self.url(&["v1", "accounts", address, "balance"]);
        let network = self.network.as_str();
        let resp = self
            .backoff
            .send("get_balance", || {
                self.client
                    .get(url.clone())
                    .query(&[("network", network)])
                    .send()
            })
            .await
            .map_err(|e| unavailable(self.transport_error("get_balance", e).to_string()))?;

        if !resp.status().is_success() {
            return Err(unavailable(describe_failure(resp).await));
        }

        let balance: BalanceResponse = resp
            .json()
            .await
            .map_err(|e| unavailable(format!("response deserialization failed: {e}")))?;
        Ok(Balance::from_rao(balance.free_rao))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_stake(&self, request: &StakeRequest) -> Result<bool, LedgerError> {
        let body = StakeBody {
            network: self.network.as_str(),
            wallet: &self.wallet,
            hotkey: request.delegate.as_str(),
            netuid: request.target.get(),
            amount_rao: request.balance().as_rao(),
            wait_for_inclusion: request.wait_for_inclusion,
            wait_for_finalization: request.wait_for_finalization,
        };

        let resp = self
            .client
            .post(self.url(&["v1", "stake"]))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("submit_stake", e))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(LedgerError::Unavailable {
                reason: format!("submit_stake: {}", describe_failure(resp).await),
            });
        }
        if !status.is_success() {
            return Err(LedgerError::Rejected {
                target: request.target,
                reason: describe_failure(resp).await,
            });
        }

        let result: StakeResponse = resp.json().await.map_err(|e| LedgerError::Deserialization {
            reason: e.to_string(),
        })?;

        tracing::debug!(
            target_subnet = %request.target,
            accepted = result.accepted,
            extrinsic = result.extrinsic_hash.as_deref().unwrap_or("-"),
            "stake submitted"
        );
        Ok(result.accepted)
    }

    fn name(&self) -> &str {
        "http-gateway"
    }
}
