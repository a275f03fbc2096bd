//! Scraping strategy: reads the public armory character page.
//!
//! The page carries the level in a `span class="bold"` marker ("Level 28",
//! sometimes followed by gender, race and class). Missing markers or
//! non-numeric level text are a [`TrackerError::Parse`], never a bogus value.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::StatusCode;

use super::{route_for, DataProvider, USER_AGENT};
use crate::error::{Result, TrackerError};
use crate::model::{CharacterAttributes, Snapshot};

const ARMORY_BASE_URL: &str = "https://classicwowarmory.com";

const CLASSES: [&str; 9] = [
    "Warrior", "Paladin", "Hunter", "Rogue", "Priest", "Shaman", "Mage", "Warlock", "Druid",
];

lazy_static! {
    static ref LEVEL_SPAN: Regex =
        Regex::new(r#"<span class="bold">([^<]*Level[^<]*)</span>"#).unwrap();
    static ref LEVEL_VALUE: Regex = Regex::new(r"Level\s+(\d+)").unwrap();
}

/// Fetches character snapshots by scraping the public armory page.
pub struct ArmoryProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ArmoryProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, ARMORY_BASE_URL.to_string())
    }

    /// Points the provider at a different host (for testing with mock servers).
    pub(crate) fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl DataProvider for ArmoryProvider {
    async fn fetch(&self, server: &str, name: &str) -> Result<Snapshot> {
        let route = route_for(server);
        let url = format!(
            "{}/character/{}/{}/{}",
            self.base_url,
            route.region,
            server.to_lowercase(),
            name.to_lowercase()
        );

        log::debug!("Fetching armory page: {url}");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        let status = response.status();
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
        parse_character_page(&body)
    }
}

/// Extracts a snapshot from the character page HTML.
fn parse_character_page(html: &str) -> Result<Snapshot> {
    let marker = LEVEL_SPAN
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| TrackerError::Parse("no level marker found on page".to_string()))?;

    let level_match = LEVEL_VALUE
        .captures(marker)
        .and_then(|c| c.get(1))
        .ok_or_else(|| TrackerError::Parse(format!("level text is not numeric: {marker:?}")))?;

    let level: u32 = level_match
        .as_str()
        .parse()
        .map_err(|_| TrackerError::Parse(format!("level text is not numeric: {marker:?}")))?;

    let summary = LEVEL_VALUE.replace(marker, "");
    let mut attributes = CharacterAttributes::default();
    parse_summary(summary.trim(), &mut attributes);

    Ok(Snapshot { level, attributes })
}

/// Fills in gender/race/class from the marker's trailing text, e.g.
/// "Female Tauren Druid". Fields the page does not carry stay `None`.
fn parse_summary(summary: &str, attributes: &mut CharacterAttributes) {
    let mut tokens: Vec<&str> = summary.split_whitespace().collect();
    if tokens.is_empty() {
        return;
    }

    if tokens[0] == "Male" || tokens[0] == "Female" {
        attributes.gender = Some(tokens.remove(0).to_string());
    }

    if tokens.last().is_some_and(|last| CLASSES.contains(last)) {
        attributes.character_class = tokens.pop().map(str::to_string);
    }

    if !tokens.is_empty() {
        // Races can be two words ("Night Elf").
        attributes.race = Some(tokens.join(" "));
    }
}

#[cfg(test)]
#[path = "armory_tests.rs"]
mod tests;
