//! Data providers: strategies for fetching a fresh character snapshot.
//!
//! Two interchangeable strategies exist: scraping the public armory page
//! ([`ArmoryProvider`]) and the authenticated Blizzard API
//! ([`BlizzardProvider`]). The sweep engine treats either as a black box.

pub mod armory;
pub mod blizzard;

use std::collections::HashMap;

use async_trait::async_trait;
use lazy_static::lazy_static;

use crate::error::Result;
use crate::model::Snapshot;

// Re-exports for public API convenience
pub use armory::ArmoryProvider;
pub use blizzard::{BlizzardProvider, Credentials};

/// User-Agent sent with every outbound request.
pub(crate) const USER_AGENT: &str = "armory-watch/0.1";

/// Fetches the current state of one character from an external source.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch(&self, server: &str, name: &str) -> Result<Snapshot>;
}

/// Region and API namespace for one realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmRoute {
    pub region: &'static str,
    pub namespace: &'static str,
}

const DEFAULT_ROUTE: RealmRoute = RealmRoute {
    region: "us",
    namespace: "profile-classic1x-us",
};

const EU_ROUTE: RealmRoute = RealmRoute {
    region: "eu",
    namespace: "profile-classic1x-eu",
};

lazy_static! {
    static ref REALM_ROUTES: HashMap<&'static str, RealmRoute> = {
        let mut m = HashMap::new();
        // US anniversary realms
        m.insert("dreamscythe", DEFAULT_ROUTE);
        m.insert("nightslayer", DEFAULT_ROUTE);
        m.insert("doomhowl", DEFAULT_ROUTE);
        // EU anniversary realms
        m.insert("thunderstrike", EU_ROUTE);
        m.insert("spineshatter", EU_ROUTE);
        m.insert("soulseeker", EU_ROUTE);
        m
    };
}

/// Static realm-to-source routing with an explicit default (US). Unknown
/// realms are not an error; they take the default route.
pub fn route_for(server: &str) -> RealmRoute {
    REALM_ROUTES
        .get(server.to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_ROUTE)
}
