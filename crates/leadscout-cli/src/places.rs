use std::time::Duration;

use anyhow::{bail, Result};
use serde::Deserialize;

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

const DETAILS_FIELDS: &str = "name,formatted_address,formatted_phone_number,website,opening_hours";

/// Politeness delay after every API call.
const API_DELAY: Duration = Duration::from_millis(500);
/// A `next_page_token` only becomes valid after a short delay.
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

/// Thin typed client for the Google Maps web services used by the pipeline.
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<PlaceSummary>,
    next_page_token: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, api_key })
    }

    /// Resolves an address or city name to coordinates. A geocoding API
    /// error is fatal for the run; an address with no result is not.
    pub async fn geocode(&self, address: &str) -> Result<Option<Location>> {
        log::info!("Geocoding address '{address}'");
        let resp: GeocodeResponse = self
            .http
            .get(GEOCODE_URL)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?
            .json()
            .await?;
        tokio::time::sleep(API_DELAY).await;

        if let Some(msg) = resp.error_message {
            bail!("Geocoding API: {msg}");
        }
        Ok(resp.results.into_iter().next().map(|r| r.geometry.location))
    }

    /// All result pages of one nearby search, following `next_page_token`
    /// until exhausted. An API error mid-pagination ends the results early
    /// rather than failing the batch.
    pub async fn nearby_search(
        &self,
        location: Location,
        radius_m: u32,
        business_type: &str,
    ) -> Result<Vec<PlaceSummary>> {
        let mut places = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.http.get(NEARBY_SEARCH_URL).query(&[
                ("location", format!("{},{}", location.lat, location.lng)),
                ("radius", radius_m.to_string()),
                ("type", business_type.to_string()),
                ("key", self.api_key.clone()),
            ]);
            if let Some(token) = &page_token {
                req = req.query(&[("pagetoken", token)]);
            }
            let resp: NearbySearchResponse = req.send().await?.json().await?;
            tokio::time::sleep(API_DELAY).await;

            if let Some(msg) = resp.error_message {
                log::warn!("Nearby Search API: {msg}");
                break;
            }
            places.extend(resp.results);

            match resp.next_page_token {
                Some(token) => {
                    log::debug!("Waiting for next page token");
                    tokio::time::sleep(PAGE_TOKEN_DELAY).await;
                    page_token = Some(token);
                }
                None => break,
            }
        }

        Ok(places)
    }

    /// Details for one place; `None` when the API has no result for the id.
    pub async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>> {
        let resp: DetailsResponse = self
            .http
            .get(DETAILS_URL)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;
        tokio::time::sleep(API_DELAY).await;

        if let Some(msg) = resp.error_message {
            log::warn!("Place Details API: {msg}");
        }
        Ok(resp.result)
    }
}
