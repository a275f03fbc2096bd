//! Tests for the Blizzard API strategy and its token lifecycle

use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn credentials() -> Credentials {
    Credentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    }
}

fn provider(server: &MockServer) -> BlizzardProvider {
    BlizzardProvider::with_urls(
        reqwest::Client::new(),
        credentials(),
        server.uri(),
        format!("{}/token", server.uri()),
    )
}

fn profile_json(level: u32) -> serde_json::Value {
    serde_json::json!({
        "level": level,
        "race": {"name": "Orc"},
        "character_class": {"name": "Shaman"},
        "gender": {"name": "Male"},
        "equipped_item_level": 33,
        "achievement_points": 120
    })
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("client_credentials"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": token, "token_type": "bearer"})),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_exchanges_token_and_reads_profile() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/profile/wow/character/dreamscythe/thrall"))
        .and(header("authorization", "Bearer tok-1"))
        .and(query_param("namespace", "profile-classic1x-us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(28)))
        .mount(&server)
        .await;

    let snapshot = provider(&server).fetch("Dreamscythe", "Thrall").await.unwrap();

    assert_eq!(snapshot.level, 28);
    assert_eq!(snapshot.attributes.race.as_deref(), Some("Orc"));
    assert_eq!(snapshot.attributes.character_class.as_deref(), Some("Shaman"));
    assert_eq!(snapshot.attributes.gender.as_deref(), Some("Male"));
    assert_eq!(snapshot.attributes.item_level, Some(33));
}

#[tokio::test]
async fn token_is_cached_across_fetches() {
    let server = MockServer::start().await;
    // A second exchange would violate expect(1).
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(28)))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    provider.fetch("dreamscythe", "thrall").await.unwrap();
    provider.fetch("dreamscythe", "jaina").await.unwrap();
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_fetch_retried_once() {
    let server = MockServer::start().await;
    // Initial exchange plus one refresh after the 401.
    mount_token(&server, "tok", 2).await;

    // First profile call rejects the token, the retry succeeds.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(30)))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = provider(&server).fetch("dreamscythe", "thrall").await.unwrap();
    assert_eq!(snapshot.level, 30);
}

#[tokio::test]
async fn persistent_rejection_is_terminal_after_one_retry() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 2).await;

    // Exactly two profile calls: the original and the single retry.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let err = provider(&server).fetch("dreamscythe", "thrall").await.unwrap_err();
    assert!(matches!(err, TrackerError::AuthExpired));
}

#[tokio::test]
async fn failed_token_exchange_skips_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // The profile endpoint must never be called without a token.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(28)))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider(&server).fetch("dreamscythe", "thrall").await.unwrap_err();
    assert!(matches!(err, TrackerError::AuthExpired));
}

#[tokio::test]
async fn missing_character_maps_to_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = provider(&server).fetch("dreamscythe", "nosuchtoon").await.unwrap_err();
    assert!(matches!(err, TrackerError::NotFound { .. }));
}

#[tokio::test]
async fn malformed_profile_is_parse_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 1).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"level\": \"not a number\"}"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch("dreamscythe", "thrall").await.unwrap_err();
    assert!(matches!(err, TrackerError::Parse(_)));
}
