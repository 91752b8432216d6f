//! StreetEasy GraphQL rental search client.
//!
//! Issues a single `searchRentals` query for a fixed filter and maps the
//! organic rental edges to [`Listing`] values.

use crate::{FetchError, FetchResult, ListingSource};
use apartment_core::Listing;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
const APOLLO_CLIENT_NAME: &str = "srp-frontend-service";
const APOLLO_CLIENT_VERSION: &str = "version 28acce3818ba1c642a4e7f28710199fdbc967f37";

const SEARCH_RENTALS_QUERY: &str = r#"
  query GetListingRental($input: SearchRentalsInput!) {
    searchRentals(input: $input) {
      search {
        criteria
      }
      totalCount
      edges {
        ... on OrganicRentalEdge {
          node {
            id
            areaName
            bedroomCount
            buildingType
            fullBathroomCount
            geoPoint {
              latitude
              longitude
            }
            halfBathroomCount
            leadMedia {
              photo {
                  key
              }
            }
            price
            relloExpress {
              ctaEnabled
              link
              rentalId
            }
            sourceGroupLabel
            status
            street
            unit
            urlPath
            tier
          }
        }
      }
    }
  }
"#;

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Rectangular search area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top_left: GeoPoint,
    pub bottom_right: GeoPoint,
}

/// Search criteria sent with every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    /// StreetEasy area ids.
    pub areas: Vec<u32>,
    /// Price band in whole dollars, inclusive.
    pub min_price: i64,
    pub max_price: i64,
    pub bounding_box: BoundingBox,
    /// Page size. Results at or above this count may be truncated.
    pub per_page: usize,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            areas: vec![
                101, 103, 104, 105, 106, 107, 108, 109, 110, 112, 113, 115, 116, 117, 120, 122,
                130, 131, 132, 133, 136, 141, 146, 152, 157, 158, 162, 478,
            ],
            min_price: 2000,
            max_price: 2750,
            bounding_box: BoundingBox {
                top_left: GeoPoint {
                    latitude: 40.774,
                    longitude: -74.036,
                },
                bottom_right: GeoPoint {
                    latitude: 40.698,
                    longitude: -73.926,
                },
            },
            per_page: 500,
        }
    }
}

impl SearchFilter {
    /// GraphQL request body for this filter.
    ///
    /// `search_token` is the per-request correlation token expected by the API.
    pub fn request_body(&self, search_token: &str) -> serde_json::Value {
        json!({
            "query": SEARCH_RENTALS_QUERY,
            "variables": {
                "input": {
                    "filters": {
                        "rentalStatus": "ACTIVE",
                        "areas": self.areas,
                        "price": {
                            "lowerBound": self.min_price,
                            "upperBound": self.max_price,
                        },
                        "boundingBox": {
                            "topLeft": {
                                "latitude": self.bounding_box.top_left.latitude,
                                "longitude": self.bounding_box.top_left.longitude,
                            },
                            "bottomRight": {
                                "latitude": self.bounding_box.bottom_right.latitude,
                                "longitude": self.bounding_box.bottom_right.longitude,
                            },
                        },
                    },
                    "page": 1,
                    "perPage": self.per_page,
                    "sorting": {
                        "attribute": "RECOMMENDED",
                        "direction": "DESCENDING",
                    },
                    "userSearchToken": search_token,
                    "adStrategy": "NONE",
                }
            }
        })
    }
}

// Response envelope
//  data
//   └── searchRentals
//        ├── totalCount
//        └── edges[]
//             └── node (absent on sponsored edges)
//                  └── leadMedia.photo.key

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    search_rentals: SearchRentals,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRentals {
    total_count: Option<u64>,
    edges: Option<Vec<Edge>>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: Option<ListingNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingNode {
    id: String,
    area_name: Option<String>,
    bedroom_count: Option<u32>,
    full_bathroom_count: Option<u32>,
    half_bathroom_count: Option<u32>,
    lead_media: Option<LeadMedia>,
    price: Option<i64>,
    source_group_label: Option<String>,
    street: Option<String>,
    unit: Option<String>,
    url_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeadMedia {
    photo: Option<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    key: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<ListingNode> for Listing {
    fn from(node: ListingNode) -> Self {
        let photo_key = node
            .lead_media
            .and_then(|m| m.photo)
            .and_then(|p| non_empty(p.key));

        Listing {
            id: node.id,
            area_name: node.area_name.unwrap_or_default(),
            street: node.street.unwrap_or_default(),
            unit: node.unit.unwrap_or_default(),
            price: node.price.unwrap_or(0),
            bedroom_count: node.bedroom_count.unwrap_or(0),
            full_bathroom_count: node.full_bathroom_count.unwrap_or(0),
            half_bathroom_count: node.half_bathroom_count.unwrap_or(0),
            source_group_label: non_empty(node.source_group_label),
            photo_key,
            url_path: node.url_path.unwrap_or_default(),
        }
    }
}

/// Turn a raw search response into listings.
///
/// `per_page` is only used to warn about possible truncation.
pub fn parse_search_response(
    status: u16,
    body: &str,
    per_page: usize,
) -> FetchResult<Vec<Listing>> {
    if status != 200 {
        return Err(FetchError::Status {
            status,
            body: body.to_string(),
        });
    }

    let response: GraphQlResponse = serde_json::from_str(body)?;

    if let Some(first) = response.errors.as_ref().and_then(|errors| errors.first()) {
        return Err(FetchError::GraphQl(first.message.clone()));
    }

    let data = response.data.ok_or(FetchError::MissingData)?;
    let edges = data.search_rentals.edges.unwrap_or_default();
    let edge_count = edges.len();

    let listings: Vec<Listing> = edges
        .into_iter()
        .filter_map(|edge| edge.node)
        .map(Listing::from)
        .collect();

    if edge_count >= per_page {
        warn!(
            edges = edge_count,
            per_page = per_page,
            total_count = data.search_rentals.total_count,
            "Search returned a full page, results may be truncated"
        );
    }

    debug!(
        edges = edge_count,
        listings = listings.len(),
        total_count = data.search_rentals.total_count,
        "Parsed search response"
    );

    Ok(listings)
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(ORIGIN, HeaderValue::from_static("https://streeteasy.com"));
    headers.insert(REFERER, HeaderValue::from_static("https://streeteasy.com/"));

    let extra = [
        ("apollographql-client-name", APOLLO_CLIENT_NAME),
        ("apollographql-client-version", APOLLO_CLIENT_VERSION),
        ("app-version", "1.0.0"),
        ("os", "web"),
        (
            "sec-ch-ua",
            r#""Chromium";v="142", "Google Chrome";v="142", "Not_A Brand";v="99""#,
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""macOS""#),
        ("sec-fetch-site", "same-site"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-dest", "empty"),
    ];
    for (name, value) in extra {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    headers
}

/// Client for the StreetEasy rental search API.
pub struct StreetEasyClient {
    client: reqwest::Client,
    endpoint: String,
    filter: SearchFilter,
}

impl StreetEasyClient {
    pub const API_URL: &'static str = "https://api-v6.streeteasy.com/";
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for the production endpoint with the default filter.
    pub fn new() -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::TIMEOUT)
            .default_headers(default_headers())
            .build()?;

        Ok(Self {
            client,
            endpoint: Self::API_URL.to_string(),
            filter: SearchFilter::default(),
        })
    }

    /// Point the client at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    /// Fetch all listings for the configured filter.
    pub async fn fetch_listings(&self) -> FetchResult<Vec<Listing>> {
        let search_token = uuid::Uuid::new_v4().to_string();
        let body = self.filter.request_body(&search_token);

        debug!(endpoint = %self.endpoint, search_token = %search_token, "Fetching listings");

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        parse_search_response(status, &text, self.filter.per_page)
    }
}

#[async_trait]
impl ListingSource for StreetEasyClient {
    async fn fetch(&self) -> FetchResult<Vec<Listing>> {
        self.fetch_listings().await
    }
}
