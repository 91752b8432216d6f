//! Discord embed payloads for the three message shapes.

use apartment_core::Listing;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const LISTING_COLOR: u32 = 5814783; // light blue
pub const ERROR_COLOR: u32 = 15158332; // red
pub const STATUS_COLOR: u32 = 3066993; // green

/// Sample lines shown in a status message.
pub const MAX_SAMPLE_LISTINGS: usize = 3;
pub const EMPTY_SAMPLE_TEXT: &str = "No listings in response";

/// Discord rejects descriptions over 4096 characters.
const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn new(name: &str, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// One rich message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

/// Webhook request body.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub embeds: &'a [Embed],
}

impl Embed {
    /// Per-listing notification. The neighborhood is the title since it is
    /// what decides whether a listing is worth opening.
    pub fn listing(listing: &Listing) -> Self {
        let mut fields = vec![
            EmbedField::new("Price", listing.price_display(), true),
            EmbedField::new("Type", listing.bedroom_display(), true),
            EmbedField::new("Bath", listing.bathroom_display(), true),
        ];

        if let Some(broker) = &listing.source_group_label {
            fields.push(EmbedField::new("Broker", broker.as_str(), false));
        }

        Self {
            title: listing.area_name.clone(),
            description: Some(listing.address()),
            url: Some(listing.detail_url()),
            color: LISTING_COLOR,
            fields,
            thumbnail: listing.photo_url().map(|url| EmbedThumbnail { url }),
            timestamp: None,
            footer: None,
        }
    }

    /// End-of-cycle summary.
    pub fn status(
        total: usize,
        new: usize,
        sample: &[Listing],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            title: "Poll Complete".to_string(),
            description: None,
            url: None,
            color: STATUS_COLOR,
            fields: vec![
                EmbedField::new("Total Listings", total.to_string(), true),
                EmbedField::new("New Listings", new.to_string(), true),
                EmbedField::new("Sample from Response", sample_text(sample), false),
            ],
            thumbnail: None,
            timestamp: Some(now.to_rfc3339()),
            footer: None,
        }
    }

    /// Free-text error notice.
    pub fn error(message: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: "Error".to_string(),
            description: Some(truncate(message, MAX_DESCRIPTION_CHARS)),
            url: None,
            color: ERROR_COLOR,
            fields: Vec::new(),
            thumbnail: None,
            timestamp: Some(now.to_rfc3339()),
            footer: None,
        }
    }

    pub fn with_footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }
}

/// Up to [`MAX_SAMPLE_LISTINGS`] summary lines, or the placeholder.
pub fn sample_text(sample: &[Listing]) -> String {
    if sample.is_empty() {
        return EMPTY_SAMPLE_TEXT.to_string();
    }

    sample
        .iter()
        .take(MAX_SAMPLE_LISTINGS)
        .map(Listing::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
