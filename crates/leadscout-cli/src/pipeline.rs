use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Result};
use leadscout_crawler::CrawlerConfig;
use leadscout_extract::harvest_emails;

use crate::cache::Cache;
use crate::chains;
use crate::export;
use crate::geo;
use crate::places::{Location, PlaceSummary, PlacesClient};
use crate::record::PlaceRecord;

/// Search sweep parameters.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Address or city name the sweep starts from.
    pub center: String,
    /// Radius of each batch search, in km.
    pub radius_km: f64,
    /// How far the center moves between batches, in km.
    pub step_km: f64,
    /// Bearing of center moves, degrees from north.
    pub bearing_deg: f64,
    pub target_count: usize,
    pub business_type: String,
}

/// A sweep gives up after this many center shifts, so a sparse area can't
/// loop forever.
const MAX_BATCHES: usize = 25;

/// Search radius in meters for the API; a negative radius is clamped to 0,
/// which the API rejects loudly instead of searching somewhere unintended.
fn radius_m(radius_km: f64) -> u32 {
    (radius_km.max(0.0) * 1000.0) as u32
}

/// Sweeps the area for businesses: batch searches shifted along the bearing
/// until the target count is reached, filtering chains and duplicate
/// place ids.
pub async fn collect_places(
    client: &PlacesClient,
    params: &SearchParams,
) -> Result<Vec<PlaceSummary>> {
    let mut location = match client.geocode(&params.center).await? {
        Some(location) => location,
        None => bail!("Unable to geocode location: {}", params.center),
    };
    log::info!("Search center: {}, {}", location.lat, location.lng);

    let radius_m = radius_m(params.radius_km);
    let mut collected: Vec<PlaceSummary> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for batch in 0..MAX_BATCHES {
        log::info!(
            "Batch {} at {}, {}",
            batch + 1,
            location.lat,
            location.lng
        );
        let found = client
            .nearby_search(location, radius_m, &params.business_type)
            .await?;

        let mut fresh = 0;
        for place in found {
            if chains::is_chain(&place.name) {
                continue;
            }
            if !seen_ids.insert(place.place_id.clone()) {
                continue;
            }
            collected.push(place);
            fresh += 1;
        }
        log::info!("{fresh} new businesses, {} total", collected.len());

        if collected.len() >= params.target_count {
            break;
        }
        let (lat, lng) = geo::move_center(
            location.lat,
            location.lng,
            params.step_km,
            params.bearing_deg,
        );
        location = Location { lat, lng };
    }

    if collected.len() < params.target_count {
        log::warn!(
            "Sweep exhausted after {MAX_BATCHES} batches with {} businesses",
            collected.len()
        );
    }
    collected.truncate(params.target_count);
    Ok(collected)
}

/// Resolves one business to its full record: cache hit short-circuits
/// everything, a miss fetches details and crawls the website for contact
/// addresses. A failed or email-less crawl degrades to an empty email list
/// rather than failing the run.
pub async fn resolve_place(
    client: &PlacesClient,
    cache: &mut Cache,
    crawler_conf: &CrawlerConfig,
    place: &PlaceSummary,
) -> Result<PlaceRecord> {
    if let Some(record) = cache.get(&place.place_id) {
        log::info!("Using cached details for {} ({})", place.place_id, place.name);
        return Ok(record.clone());
    }

    let details = match client.place_details(&place.place_id).await? {
        Some(details) => details,
        None => {
            log::warn!("No details for {} ({})", place.place_id, place.name);
            return Ok(PlaceRecord::default());
        }
    };

    let emails = match &details.website {
        Some(website) => match harvest_emails(website, crawler_conf).await {
            Ok(emails) => {
                if !emails.is_empty() {
                    log::info!("Found for {}: {}", place.name, emails.join(";"));
                }
                emails
            }
            Err(e) => {
                log::warn!("Crawl of {website} failed: {e}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let record = PlaceRecord {
        name: details.name,
        address: details.formatted_address,
        phone: details.formatted_phone_number,
        website: details.website,
        hours: details
            .opening_hours
            .map(|h| h.weekday_text.join("; "))
            .filter(|s| !s.is_empty()),
        emails,
    };

    cache.put(place.place_id.clone(), record.clone());
    // Checkpoint so an interrupted run keeps what it finished.
    cache.save()?;
    Ok(record)
}

/// The full pipeline: sweep, resolve every business (crawling on cache
/// misses), persist the cache, export the CSV.
pub async fn run(
    client: &PlacesClient,
    params: &SearchParams,
    crawler_conf: &CrawlerConfig,
    cache_path: &Path,
    output: &Path,
) -> Result<()> {
    let mut cache = Cache::load(cache_path)?;
    log::info!("Loaded {} cached records", cache.len());

    let places = collect_places(client, params).await?;
    let total = places.len();

    let mut records = Vec::with_capacity(total);
    for (index, place) in places.iter().enumerate() {
        log::info!("[{}/{total}] {}", index + 1, place.name);
        records.push(resolve_place(client, &mut cache, crawler_conf, place).await?);
    }

    cache.save()?;
    export::export_csv(output, records.iter())?;
    log::info!("Wrote {total} businesses to {}", output.display());
    Ok(())
}
