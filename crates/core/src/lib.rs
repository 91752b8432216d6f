//! Core data types for the apartment notifier.

pub mod listing;

pub use listing::*;
