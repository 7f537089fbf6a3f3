//! # Staking Gateway Client Tests
//!
//! Exercises `HttpLedgerClient` against a wiremock server: request shape,
//! bearer authentication, status mapping, and the retry split between
//! balance reads (retried) and stake submissions (sent once).

use std::time::Duration;

use dca_core::{Balance, DelegateKey, Network, SubnetId};
use dca_ledger::{
    Backoff, GatewayConfig, HttpLedgerClient, LedgerClient, LedgerError, StakeRequest,
    WalletError, WalletHandle,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

fn gateway(server: &MockServer) -> GatewayConfig {
    GatewayConfig::new(Url::parse(&server.uri()).unwrap(), Network::Local, "dca")
        .with_api_token("test-token")
        .with_backoff(Backoff {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        })
}

fn client(server: &MockServer) -> HttpLedgerClient {
    HttpLedgerClient::new(gateway(server)).expect("client build")
}

async fn unlocked(server: &MockServer) -> HttpLedgerClient {
    Mock::given(method("POST"))
        .and(path("/v1/wallets/dca/unlock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coldkey_address": "5Ccold"
        })))
        .mount(server)
        .await;
    let client = client(server);
    client.unlock().await.expect("unlock");
    client
}

// -- unlock -----------------------------------------------------------------

#[tokio::test]
async fn unlock_sends_password_and_records_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/wallets/dca/unlock"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({ "network": "local", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coldkey_address": "5Ccold"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(gateway(&server).with_password(Zeroizing::new("pw".into())))
        .expect("client build");
    assert!(client.address().is_none());
    client.unlock().await.expect("unlock");
    assert_eq!(client.address().as_deref(), Some("5Ccold"));
}

#[tokio::test]
async fn unlock_omits_absent_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/wallets/dca/unlock"))
        .and(body_json(json!({ "network": "local" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "coldkey_address": "5Ccold"
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).unlock().await.expect("unlock");
}

#[tokio::test]
async fn unlock_rejection_is_unlock_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/wallets/dca/unlock"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad password"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    match client.unlock().await {
        Err(WalletError::UnlockFailed { wallet, reason }) => {
            assert_eq!(wallet, "dca");
            assert!(reason.contains("401"), "got: {reason}");
            assert!(reason.contains("bad password"), "got: {reason}");
        }
        other => panic!("expected UnlockFailed, got {other:?}"),
    }
    assert!(client.address().is_none());
}

// -- balance ----------------------------------------------------------------

#[tokio::test]
async fn balance_reads_free_rao() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/5Ccold/balance"))
        .and(query_param("network", "local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "free_rao": 2_500_000_000u64 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = unlocked(&server).await;
    let balance = client.available_balance().await.expect("balance");
    assert_eq!(balance, Balance::from_rao(2_500_000_000));
}

#[tokio::test]
async fn balance_before_unlock_is_locked() {
    let server = MockServer::start().await;
    let result = client(&server).available_balance().await;
    assert!(matches!(result, Err(WalletError::Locked)));
}

#[tokio::test]
async fn balance_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/5Ccold/balance"))
        .respond_with(ResponseTemplate::new(503).set_body_string("node syncing"))
        .mount(&server)
        .await;

    let client = unlocked(&server).await;
    match client.available_balance().await {
        Err(WalletError::BalanceUnavailable { address, reason }) => {
            assert_eq!(address, "5Ccold");
            assert!(reason.contains("node syncing"));
        }
        other => panic!("expected BalanceUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn balance_read_retries_transport_failures() {
    // Nothing listens on port 1; every attempt fails at connect.
    let config = GatewayConfig::new(Url::parse("http://127.0.0.1:1").unwrap(), Network::Local, "dca")
        .with_timeout(Duration::from_millis(100))
        .with_backoff(Backoff {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
        });
    let client = HttpLedgerClient::new(config).unwrap();
    let result = client.get_balance("5Ccold").await;
    assert!(matches!(result, Err(WalletError::BalanceUnavailable { .. })));
}

// -- stake ------------------------------------------------------------------

fn stake(target: u16, amount: f64) -> StakeRequest {
    StakeRequest::fire_and_forget(DelegateKey::new("5Fdelegate"), SubnetId::new(target), amount)
}

#[tokio::test]
async fn stake_posts_expected_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_json(json!({
            "network": "local",
            "wallet": "dca",
            "hotkey": "5Fdelegate",
            "netuid": 18,
            "amount_rao": 350_000_000u64,
            "wait_for_inclusion": false,
            "wait_for_finalization": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accepted": true,
            "extrinsic_hash": "0xabc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client(&server).submit_stake(&stake(18, 0.35)).await.expect("stake"));
}

#[tokio::test]
async fn stake_declined_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accepted": false })))
        .mount(&server)
        .await;

    assert!(!client(&server).submit_stake(&stake(1, 0.1)).await.expect("stake"));
}

#[tokio::test]
async fn stake_client_error_is_rejected_with_target() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .respond_with(ResponseTemplate::new(422).set_body_string("hotkey not registered"))
        .expect(1)
        .mount(&server)
        .await;

    match client(&server).submit_stake(&stake(7, 0.1)).await {
        Err(LedgerError::Rejected { target, reason }) => {
            assert_eq!(target, SubnetId::new(7));
            assert!(reason.contains("hotkey not registered"));
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn stake_server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server).submit_stake(&stake(1, 0.1)).await;
    assert!(matches!(result, Err(LedgerError::Unavailable { .. })));
}

#[tokio::test]
async fn stake_malformed_body_is_deserialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client(&server).submit_stake(&stake(1, 0.1)).await;
    assert!(matches!(result, Err(LedgerError::Deserialization { .. })));
}

#[tokio::test]
async fn stake_timeout_is_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stake"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accepted": true }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpLedgerClient::new(gateway(&server).with_timeout(Duration::from_millis(50))).unwrap();
    let result = client.submit_stake(&stake(1, 0.1)).await;
    assert!(matches!(result, Err(LedgerError::Timeout { elapsed_ms: 50 })));
}
