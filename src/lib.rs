//! Armory Watch - WoW Classic character level tracker
//!
//! Tracks characters by server+name, polls an external data source (armory
//! page scraping or the Blizzard API) on a schedule, and posts a webhook
//! notification whenever a tracked character's level strictly increases.

pub mod detect;
pub mod error;
pub mod model;
pub mod notify;
pub mod provider;
pub mod scheduler;
pub mod store;
pub mod sweep;
pub mod tracker;

pub use error::{Result, TrackerError};
pub use model::{entity_key, CharacterAttributes, Snapshot, TrackedEntity};
pub use notify::{LevelUpNotification, NotificationSink, WebhookSink};
pub use provider::{ArmoryProvider, BlizzardProvider, Credentials, DataProvider};
pub use scheduler::{Scheduler, SweepHandle};
pub use store::EntityStore;
pub use sweep::{SweepEngine, SweepOutcome};
pub use tracker::Tracker;
