#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use whatspot::data_models::{BudgetTier, Candidate, LatLng, SearchQuery, SearchRequest};
use whatspot::justification::{EnrichmentError, JustificationGenerator, JustificationPrompt};
use whatspot::places::{
    DisplayName, OpeningHours, PlacesError, PlacesSearchRequest, PlacesSource, RawLocation,
    RawPlace,
};

/// Degrees of latitude per kilometer on the haversine sphere.
pub const DEG_PER_KM: f64 = 0.008993216059187306;

pub fn search_request() -> SearchRequest {
    SearchRequest {
        location: Some(LatLng::new(0.0, 0.0)),
        radius_km: Some(5.0),
        budget_max: Some(BudgetTier::Moderate),
        chips: vec![],
        category: None,
        query: None,
    }
}

pub fn search_query() -> SearchQuery {
    SearchQuery::from_request(search_request()).unwrap()
}

pub fn candidate(id: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        place_id: id.to_string(),
        name: format!("Venue {id}"),
        latitude: 0.0,
        longitude: 0.0,
        category: None,
        category_label: None,
        price_level: None,
        rating: None,
        review_count: None,
        distance_km: 0.0,
        address: None,
        website: None,
        open_now: None,
        photo_url: None,
        photo_attributions: vec![],
    }
}

/// A raw place `km_north` kilometers north of (0, 0).
pub fn raw_place(id: &str, km_north: f64) -> RawPlace {
    RawPlace {
        id: id.to_string(),
        display_name: Some(DisplayName {
            text: Some(format!("Venue {id}")),
        }),
        location: Some(RawLocation {
            latitude: km_north * DEG_PER_KM,
            longitude: 0.0,
        }),
        ..RawPlace::default()
    }
}

pub fn rated(mut place: RawPlace, rating: f64, reviews: u64) -> RawPlace {
    place.rating = Some(rating);
    place.user_rating_count = Some(reviews);
    place
}

pub fn priced(mut place: RawPlace, level: &str) -> RawPlace {
    place.price_level = Some(level.to_string());
    place
}

pub fn open(mut place: RawPlace, open_now: bool) -> RawPlace {
    place.current_opening_hours = Some(OpeningHours {
        open_now: Some(open_now),
    });
    place
}

pub fn typed(mut place: RawPlace, tag: &str) -> RawPlace {
    place.types = vec![tag.to_string(), "restaurant".to_string()];
    place
}

/// Returns a fixed set of places and records every request it receives.
#[derive(Default)]
pub struct StaticPlacesSource {
    places: Vec<RawPlace>,
    calls: AtomicUsize,
    last_request: Mutex<Option<PlacesSearchRequest>>,
}

impl StaticPlacesSource {
    pub fn new(places: Vec<RawPlace>) -> Arc<Self> {
        Arc::new(Self {
            places,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<PlacesSearchRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesSource for StaticPlacesSource {
    async fn search_text(&self, request: &PlacesSearchRequest) -> Result<Vec<RawPlace>, PlacesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(self.places.clone())
    }
}

pub struct FailingPlacesSource {
    pub status: u16,
    pub detail: String,
}

#[async_trait]
impl PlacesSource for FailingPlacesSource {
    async fn search_text(&self, _request: &PlacesSearchRequest) -> Result<Vec<RawPlace>, PlacesError> {
        Err(PlacesError::Status {
            status: self.status,
            detail: self.detail.clone(),
        })
    }
}

pub struct PanickingPlacesSource;

#[async_trait]
impl PlacesSource for PanickingPlacesSource {
    async fn search_text(&self, _request: &PlacesSearchRequest) -> Result<Vec<RawPlace>, PlacesError> {
        panic!("places source exploded")
    }
}

/// Generator that answers with a fixed map and keeps the last prompt.
#[derive(Default)]
pub struct StaticGenerator {
    lines: HashMap<String, String>,
    last_prompt: Mutex<Option<JustificationPrompt>>,
}

impl StaticGenerator {
    pub fn new(lines: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            lines: lines
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn last_prompt(&self) -> Option<JustificationPrompt> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl JustificationGenerator for StaticGenerator {
    async fn generate(&self, prompt: &JustificationPrompt) -> Result<HashMap<String, String>, EnrichmentError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());
        Ok(self.lines.clone())
    }
}

pub struct FailingGenerator;

#[async_trait]
impl JustificationGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &JustificationPrompt) -> Result<HashMap<String, String>, EnrichmentError> {
        Err(EnrichmentError::Malformed("expected value at line 1 column 1".into()))
    }
}

pub struct SlowGenerator(pub Duration);

#[async_trait]
impl JustificationGenerator for SlowGenerator {
    async fn generate(&self, _prompt: &JustificationPrompt) -> Result<HashMap<String, String>, EnrichmentError> {
        tokio::time::sleep(self.0).await;
        Ok(HashMap::from([("a".to_string(), "too late".to_string())]))
    }
}

/// Serves `router` on an ephemeral local port for the life of the test.
pub async fn spawn_mock_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
