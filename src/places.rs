use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::data_models::{BudgetTier, Candidate, LatLng, PhotoAttribution, SearchQuery};
use crate::error::RecommendationError;
use crate::geo;
use crate::intent::IntentSignals;
use crate::labels::pretty_type;

pub const MAX_TEXT_QUERY_CHARS: usize = 128;
pub const DEFAULT_TEXT_QUERY: &str = "restaurants";
pub const MIN_RADIUS_M: u32 = 1;
pub const MAX_RADIUS_M: u32 = 50_000;
/// Upper bound on places returned by a single text search.
pub const MAX_RESULT_COUNT: u32 = 20;
pub const PHOTO_MAX_WIDTH_PX: u32 = 800;

const FIELD_MASK: &str = "places.id,places.displayName,places.location,places.rating,\
places.userRatingCount,places.priceLevel,places.types,places.shortFormattedAddress,\
places.currentOpeningHours,places.websiteUri,places.photos";

/// The single outbound search built for a request.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlacesSearchRequest {
    pub lat: f64,
    pub lng: f64,
    pub text_query: String,
    pub radius_m: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level_max: Option<BudgetTier>,
    /// Free-form category label. Only sources that understand it use it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included_type: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct DisplayName {
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawPhoto {
    pub name: String,
    #[serde(default)]
    pub author_attributions: Vec<PhotoAttribution>,
}

/// A place record as the source returns it. Every field but `id` may be missing.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    pub id: String,
    pub display_name: Option<DisplayName>,
    pub location: Option<RawLocation>,
    pub rating: Option<f64>,
    pub user_rating_count: Option<u64>,
    pub price_level: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub current_opening_hours: Option<OpeningHours>,
    pub website_uri: Option<String>,
    pub short_formatted_address: Option<String>,
    #[serde(default)]
    pub photos: Vec<RawPhoto>,
}

#[derive(Deserialize, Debug, Default)]
struct TextSearchResponse {
    #[serde(default)]
    places: Vec<RawPlace>,
}

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("places request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("places source returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("places response could not be decoded: {0}")]
    Decode(String),
}

impl From<PlacesError> for RecommendationError {
    fn from(err: PlacesError) -> Self {
        match err {
            PlacesError::Status { status, detail } => RecommendationError::Upstream {
                status: Some(status),
                detail,
            },
            PlacesError::Transport(e) => RecommendationError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                detail: e.to_string(),
            },
            PlacesError::Decode(detail) => RecommendationError::Upstream {
                status: None,
                detail,
            },
        }
    }
}

/// External places collaborator. One call per request, no retries.
#[async_trait]
pub trait PlacesSource: Send + Sync {
    async fn search_text(&self, request: &PlacesSearchRequest) -> Result<Vec<RawPlace>, PlacesError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTextSearchBody<'a> {
    text_query: &'a str,
    max_result_count: u32,
    location_bias: GoogleLocationBias,
    #[serde(skip_serializing_if = "Option::is_none")]
    open_now: Option<bool>,
}

#[derive(Serialize)]
struct GoogleLocationBias {
    circle: GoogleCircle,
}

#[derive(Serialize)]
struct GoogleCircle {
    center: GoogleLatLng,
    radius: f64,
}

#[derive(Serialize)]
struct GoogleLatLng {
    latitude: f64,
    longitude: f64,
}

/// Google Places (New) text search.
///
/// The price ceiling is not forwarded: the API would drop unpriced venues,
/// which the gateway keeps.
pub struct GooglePlacesClient {
    client: reqwest::Client,
    api_key: String,
    search_url: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, search_url: String, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            search_url,
        })
    }
}

#[async_trait]
impl PlacesSource for GooglePlacesClient {
    #[instrument(skip(self, request), fields(text_query = %request.text_query, radius_m = request.radius_m))]
    async fn search_text(&self, request: &PlacesSearchRequest) -> Result<Vec<RawPlace>, PlacesError> {
        let text_query = match request.text_query.trim() {
            "" => DEFAULT_TEXT_QUERY,
            trimmed => trimmed,
        };
        let body = GoogleTextSearchBody {
            text_query,
            max_result_count: MAX_RESULT_COUNT,
            location_bias: GoogleLocationBias {
                circle: GoogleCircle {
                    center: GoogleLatLng {
                        latitude: request.lat,
                        longitude: request.lng,
                    },
                    radius: f64::from(request.radius_m),
                },
            },
            open_now: request.open_now,
        };

        let res = self
            .client
            .post(&self.search_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", FIELD_MASK)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %detail, "places search failed");
            return Err(PlacesError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let text = res.text().await?;
        let parsed: TextSearchResponse =
            serde_json::from_str(&text).map_err(|e| PlacesError::Decode(e.to_string()))?;
        debug!(count = parsed.places.len(), "places search returned");
        Ok(parsed.places)
    }
}

/// Builds the outbound search and turns raw records into [`Candidate`]s.
pub struct PlacesGateway {
    source: Arc<dyn PlacesSource>,
    photo_proxy_path: String,
}

impl PlacesGateway {
    pub fn new(source: Arc<dyn PlacesSource>, photo_proxy_path: impl Into<String>) -> Self {
        Self {
            source,
            photo_proxy_path: photo_proxy_path.into(),
        }
    }

    pub fn build_request(query: &SearchQuery, intent: &IntentSignals) -> PlacesSearchRequest {
        PlacesSearchRequest {
            lat: query.location.lat,
            lng: query.location.lng,
            text_query: compose_text_query(query, intent),
            radius_m: radius_m(query.radius_km),
            open_now: (query.has_chip("open now") || intent.open_now).then_some(true),
            price_level_max: Some(query.budget_max),
            included_type: query.category.clone(),
        }
    }

    /// Searches the source and returns normalized candidates in source order,
    /// minus everything priced above the budget.
    pub async fn search(
        &self,
        query: &SearchQuery,
        intent: &IntentSignals,
    ) -> Result<Vec<Candidate>, RecommendationError> {
        let request = Self::build_request(query, intent);
        let places = self.source.search_text(&request).await?;
        let fetched = places.len();

        let candidates: Vec<Candidate> = places
            .into_iter()
            .map(|p| self.normalize(p, query.location))
            .filter(|c| {
                c.price_level
                    .is_none_or(|price| !price.exceeds(query.budget_max))
            })
            .collect();

        debug!(
            fetched,
            kept = candidates.len(),
            budget_max = %query.budget_max,
            "normalized places"
        );
        Ok(candidates)
    }

    pub fn normalize(&self, place: RawPlace, origin: LatLng) -> Candidate {
        let (latitude, longitude) = place
            .location
            .map(|l| (l.latitude, l.longitude))
            .unwrap_or((0.0, 0.0));
        let category = place.types.into_iter().next();
        let category_label = category.as_deref().and_then(pretty_type);
        let first_photo = place.photos.into_iter().next();
        let photo_url = first_photo
            .as_ref()
            .and_then(|p| photo_proxy_ref(&self.photo_proxy_path, &p.name));
        let photo_attributions = first_photo
            .map(|p| p.author_attributions)
            .unwrap_or_default();

        Candidate {
            id: place.id.clone(),
            place_id: place.id,
            name: place
                .display_name
                .and_then(|d| d.text)
                .unwrap_or_else(|| "Unknown".to_string()),
            latitude,
            longitude,
            category,
            category_label,
            price_level: place
                .price_level
                .as_deref()
                .and_then(BudgetTier::from_places_level),
            rating: place.rating,
            review_count: place.user_rating_count,
            distance_km: geo::distance_km(origin, LatLng::new(latitude, longitude)),
            address: place.short_formatted_address,
            website: place.website_uri,
            open_now: place.current_opening_hours.and_then(|h| h.open_now),
            photo_url,
            photo_attributions,
        }
    }
}

/// Category, intent terms, then dietary words; falls back to the raw query and
/// finally to "restaurants". Bounded to [`MAX_TEXT_QUERY_CHARS`].
pub fn compose_text_query(query: &SearchQuery, intent: &IntentSignals) -> String {
    let mut terms: Vec<&str> = Vec::new();
    if let Some(category) = query.category.as_deref() {
        terms.push(category);
    }
    terms.extend(intent.terms.iter().map(String::as_str));
    if (query.has_chip("vegan") || intent.vegan) && !terms.contains(&"vegan") {
        terms.push("vegan");
    }
    if (query.has_chip("vegetarian") || intent.vegetarian) && !terms.contains(&"vegetarian") {
        terms.push("vegetarian");
    }

    let joined = terms.join(" ");
    let composed = match joined.trim() {
        "" => query.query.as_deref().unwrap_or(DEFAULT_TEXT_QUERY),
        trimmed => trimmed,
    };
    composed.chars().take(MAX_TEXT_QUERY_CHARS).collect()
}

pub fn radius_m(radius_km: f64) -> u32 {
    if !radius_km.is_finite() {
        return 1_000;
    }
    (radius_km * 1000.0)
        .round()
        .clamp(f64::from(MIN_RADIUS_M), f64::from(MAX_RADIUS_M)) as u32
}

/// Indirection to the image proxy so the source credential never reaches the caller.
pub fn photo_proxy_ref(proxy_path: &str, photo_name: &str) -> Option<String> {
    let mut url = Url::parse("http://proxy.invalid").ok()?.join(proxy_path).ok()?;
    url.query_pairs_mut()
        .append_pair("name", photo_name)
        .append_pair("w", &PHOTO_MAX_WIDTH_PX.to_string());
    Some(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
}
