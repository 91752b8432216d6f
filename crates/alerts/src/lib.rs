//! Notification side of the apartment poller.
//!
//! This crate provides:
//! - SQLite-backed set of already-notified listings
//! - Discord webhook notifier with listing, status and error messages

pub mod config;
pub mod db;
pub mod discord;
pub mod embed;
pub mod notifier;

pub use config::{NotifierConfig, Webhook};
pub use db::{Database, DbError, SeenRecord, SeenStore};
pub use discord::DiscordNotifier;
pub use embed::Embed;
pub use notifier::{Notifier, NotifierError, NotifierResult};
