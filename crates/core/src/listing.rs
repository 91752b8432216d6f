//! Normalized apartment listing and its display helpers.

use serde::{Deserialize, Serialize};

/// Base URL for listing detail pages. `url_path` values are relative to it.
pub const LISTING_BASE_URL: &str = "https://streeteasy.com";

/// Photo CDN template pieces. The photo key goes between prefix and suffix.
const PHOTO_URL_PREFIX: &str = "https://photos.zillowstatic.com/fp/";
const PHOTO_URL_SUFFIX: &str = "-se_extra_large_1500_800.webp";

/// One rental unit observed in a poll.
///
/// Built fresh from the search API response on every fetch and never mutated
/// afterwards. Only the id and a few display fields are ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Opaque identifier, stable across polls for the same unit.
    pub id: String,
    /// Neighborhood name, e.g. "East Village".
    pub area_name: String,
    pub street: String,
    /// Unit label; empty when the listing has none.
    pub unit: String,
    /// Monthly rent in whole dollars.
    pub price: i64,
    /// 0 means studio.
    pub bedroom_count: u32,
    pub full_bathroom_count: u32,
    pub half_bathroom_count: u32,
    /// Broker / source group label.
    pub source_group_label: Option<String>,
    /// Key of the lead photo on the photo CDN.
    pub photo_key: Option<String>,
    /// Detail page path, relative to [`LISTING_BASE_URL`].
    pub url_path: String,
}

impl Listing {
    /// Create a listing with the required fields; optional fields start empty.
    pub fn new(
        id: impl Into<String>,
        area_name: impl Into<String>,
        street: impl Into<String>,
        price: i64,
    ) -> Self {
        Self {
            id: id.into(),
            area_name: area_name.into(),
            street: street.into(),
            unit: String::new(),
            price,
            bedroom_count: 0,
            full_bathroom_count: 0,
            half_bathroom_count: 0,
            source_group_label: None,
            photo_key: None,
            url_path: String::new(),
        }
    }

    /// Postal address line, including the unit when present.
    pub fn address(&self) -> String {
        if self.unit.is_empty() {
            self.street.clone()
        } else {
            format!("{}, Unit {}", self.street, self.unit)
        }
    }

    /// Absolute URL of the listing's detail page.
    pub fn detail_url(&self) -> String {
        format!("{}{}", LISTING_BASE_URL, self.url_path)
    }

    /// Thumbnail URL, only when the listing carries a photo.
    pub fn photo_url(&self) -> Option<String> {
        self.photo_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| format!("{}{}{}", PHOTO_URL_PREFIX, key, PHOTO_URL_SUFFIX))
    }

    /// Rent formatted as "$N/mo".
    pub fn price_display(&self) -> String {
        format!("${}/mo", self.price)
    }

    /// "Studio", "1 Bed" or "N Beds".
    pub fn bedroom_display(&self) -> String {
        match self.bedroom_count {
            0 => "Studio".to_string(),
            1 => "1 Bed".to_string(),
            n => format!("{} Beds", n),
        }
    }

    /// Total bathrooms counting each half bath as 0.5.
    ///
    /// Whole totals render without decimals ("2 Baths"), fractional ones with
    /// one decimal ("1.5 Baths"). Only a total of exactly one is singular.
    pub fn bathroom_display(&self) -> String {
        // Work in half-bath units to keep the arithmetic exact.
        let halves = self.full_bathroom_count * 2 + self.half_bathroom_count;
        match halves {
            2 => "1 Bath".to_string(),
            h if h % 2 == 0 => format!("{} Baths", h / 2),
            h => format!("{}.5 Baths", h / 2),
        }
    }

    /// One-line summary used in poll status messages.
    pub fn summary_line(&self) -> String {
        format!("• {} - {}, ${}/mo", self.area_name, self.street, self.price)
    }
}
