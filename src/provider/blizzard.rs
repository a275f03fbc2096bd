//! Authenticated-API strategy: Blizzard profile API with OAuth2
//! client-credentials.
//!
//! The access token is process-wide cached state: empty at startup, populated
//! by a token exchange, invalidated when the data endpoint rejects it. A
//! rejected fetch gets at most one refresh and one retry; a second rejection
//! is terminal for that poll. Refresh failures surface as `AuthExpired`
//! without retrying the fetch.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{route_for, DataProvider, RealmRoute, USER_AGENT};
use crate::error::{Result, TrackerError};
use crate::model::{CharacterAttributes, Snapshot};

const TOKEN_URL: &str = "https://oauth.battle.net/token";

/// OAuth2 client credentials for the Blizzard API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Process-wide cached access token.
///
/// The mutex is held across the token exchange, so two callers racing on an
/// expired token perform exactly one refresh between them.
struct TokenManager {
    token: Mutex<Option<String>>,
}

impl TokenManager {
    fn new() -> Self {
        Self {
            token: Mutex::new(None),
        }
    }

    /// Returns the cached token, performing a client-credentials exchange if
    /// none is cached. Any exchange failure surfaces as `AuthExpired`.
    async fn current_or_refresh(
        &self,
        client: &reqwest::Client,
        credentials: &Credentials,
        token_url: &str,
    ) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        log::info!("Requesting new Blizzard API access token");
        match exchange(client, credentials, token_url).await {
            Ok(token) => {
                *slot = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                log::warn!("Token exchange failed: {e}");
                Err(TrackerError::AuthExpired)
            }
        }
    }

    /// Drops the cached token, but only if it is still the one that was just
    /// rejected; a fresher token installed in the meantime survives.
    async fn invalidate(&self, stale: &str) {
        let mut slot = self.token.lock().await;
        if slot.as_deref() == Some(stale) {
            *slot = None;
        }
    }
}

/// Performs the client-credentials exchange.
async fn exchange(
    client: &reqwest::Client,
    credentials: &Credentials,
    token_url: &str,
) -> Result<String> {
    let response = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TrackerError::HttpStatus(status));
    }

    let body = response.text().await?;
    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|e| TrackerError::Parse(e.to_string()))?;
    Ok(token.access_token)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Character profile as returned by the API. Unknown fields are ignored so
/// API growth cannot break polling.
#[derive(Deserialize)]
struct CharacterProfile {
    level: u32,
    #[serde(default)]
    race: Option<NamedField>,
    #[serde(default)]
    character_class: Option<NamedField>,
    #[serde(default)]
    gender: Option<NamedField>,
    #[serde(default)]
    equipped_item_level: Option<u32>,
}

#[derive(Deserialize)]
struct NamedField {
    name: String,
}

impl CharacterProfile {
    fn into_snapshot(self) -> Snapshot {
        Snapshot {
            level: self.level,
            attributes: CharacterAttributes {
                race: self.race.map(|f| f.name),
                character_class: self.character_class.map(|f| f.name),
                item_level: self.equipped_item_level,
                gender: self.gender.map(|f| f.name),
            },
        }
    }
}

/// Fetches character snapshots from the Blizzard profile API.
pub struct BlizzardProvider {
    client: reqwest::Client,
    credentials: Credentials,
    tokens: TokenManager,
    /// Overrides the per-region API host (for testing with mock servers).
    api_base: Option<String>,
    token_url: String,
}

impl BlizzardProvider {
    pub fn new(client: reqwest::Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
            tokens: TokenManager::new(),
            api_base: None,
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Routes both the API and the token exchange to fixed URLs (for testing
    /// with mock servers).
    pub(crate) fn with_urls(
        client: reqwest::Client,
        credentials: Credentials,
        api_base: String,
        token_url: String,
    ) -> Self {
        Self {
            client,
            credentials,
            tokens: TokenManager::new(),
            api_base: Some(api_base),
            token_url,
        }
    }

    fn endpoint(&self, route: RealmRoute, server: &str, name: &str) -> String {
        let host = match &self.api_base {
            Some(base) => base.clone(),
            None => format!("https://{}.api.blizzard.com", route.region),
        };
        format!(
            "{}/profile/wow/character/{}/{}",
            host,
            server.to_lowercase(),
            name.to_lowercase()
        )
    }

    /// One bearer-authenticated GET against the profile endpoint.
    async fn try_fetch(
        &self,
        url: &str,
        route: RealmRoute,
        token: &str,
        server: &str,
        name: &str,
    ) -> Result<Snapshot> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(token)
            .query(&[("namespace", route.namespace), ("locale", "en_US")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TrackerError::AuthExpired);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound {
                server: server.to_lowercase(),
                name: name.to_lowercase(),
            });
        }
        if !status.is_success() {
            return Err(TrackerError::HttpStatus(status));
        }

        let body = response.text().await?;
        let profile: CharacterProfile =
            serde_json::from_str(&body).map_err(|e| TrackerError::Parse(e.to_string()))?;
        Ok(profile.into_snapshot())
    }
}

#[async_trait]
impl DataProvider for BlizzardProvider {
    async fn fetch(&self, server: &str, name: &str) -> Result<Snapshot> {
        let route = route_for(server);
        let url = self.endpoint(route, server, name);

        let token = self
            .tokens
            .current_or_refresh(&self.client, &self.credentials, &self.token_url)
            .await?;

        match self.try_fetch(&url, route, &token, server, name).await {
            Err(TrackerError::AuthExpired) => {
                log::info!("Access token rejected, refreshing and retrying once");
                self.tokens.invalidate(&token).await;
                let token = self
                    .tokens
                    .current_or_refresh(&self.client, &self.credentials, &self.token_url)
                    .await?;
                self.try_fetch(&url, route, &token, server, name).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "blizzard_tests.rs"]
mod tests;
