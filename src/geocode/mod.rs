//! Address geocoding
//!
//! Best effort: any failure leaves a listing's coordinates empty. Lookups go
//! to a Nominatim-compatible `/search` endpoint and are paced with governor,
//! as the public service allows one request per second.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{header::USER_AGENT, Client};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GeocodingConfig;
use crate::utils::error::GeocodeError;

/// A geocoding hit; coordinates in decimal degrees
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: Option<String>,
}

/// Turns free-text addresses into coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up `query`; `Ok(None)` when the service knows no match
    async fn geocode(&self, query: &str) -> Result<Option<Location>, GeocodeError>;
}

/// Look up `query`, logging and swallowing failures
pub async fn lookup(geocoder: &dyn Geocoder, query: &str) -> Option<Location> {
    match geocoder.geocode(query).await {
        Ok(found) => found,
        Err(e) => {
            warn!(query, error = %e, "Geocoding failed");
            None
        }
    }
}

/// One search hit; Nominatim reports coordinates as strings
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl Place {
    fn location(&self) -> Result<Location, GeocodeError> {
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| GeocodeError::InvalidCoordinate(s.to_string()))
        };
        Ok(Location {
            latitude: parse(&self.lat)?,
            longitude: parse(&self.lon)?,
            display_name: self.display_name.clone(),
        })
    }
}

/// Client for a Nominatim-compatible search endpoint
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    country_codes: String,
    user_agent: String,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl NominatimGeocoder {
    /// Create a geocoder from its settings
    ///
    /// # Errors
    ///
    /// Returns `GeocodeError::Http` if the HTTP client cannot be created
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            country_codes: config.country_codes.clone(),
            user_agent: config.user_agent.clone(),
            rate_limiter: Quota::with_period(Duration::from_millis(config.delay_ms))
                .map(RateLimiter::direct),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Location>, GeocodeError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        debug!(query, endpoint = %self.endpoint, "Geocoding");

        let mut params = vec![("q", query), ("format", "json"), ("limit", "1")];
        if !self.country_codes.is_empty() {
            params.push(("countrycodes", self.country_codes.as_str()));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<Place> = response.json().await?;
        places.first().map(Place::location).transpose()
    }
}
