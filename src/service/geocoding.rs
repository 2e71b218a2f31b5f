//! Reverse geocoding (coordinate to street name) through Nominatim.
//!
//! Lookups are best effort: a slow or failing geocoder never blocks a
//! report, it only leaves the street name as [`STREET_PLACEHOLDER`].
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::reportmodel::GeoPoint;

/// Stored when no street name could be resolved. Clients do not render it.
pub const STREET_PLACEHOLDER: &str = "N/A";

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder rate limit exceeded")]
    RateLimited,

    #[error("Parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn street_name(&self, point: GeoPoint) -> Result<Option<String>, GeocodeError>;
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(NominatimGeocoder {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn street_name(&self, point: GeoPoint) -> Result<Option<String>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lng.to_string()),
                ("format", "jsonv2".to_string()),
                ("zoom", "17".to_string()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_reverse(&body)
    }
}

/// Picks the road name out of a jsonv2 reverse response, falling back to the
/// full display name.
fn parse_reverse(body: &serde_json::Value) -> Result<Option<String>, GeocodeError> {
    let obj = body
        .as_object()
        .ok_or_else(|| GeocodeError::Parse("Nominatim response is not an object".to_string()))?;

    // "Unable to geocode" comes back as 200 with an error field.
    if obj.contains_key("error") {
        return Ok(None);
    }

    let name = body["address"]["road"]
        .as_str()
        .or_else(|| body["display_name"].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Ok(name)
}

/// Street name for `point`, or the placeholder when the lookup fails or
/// does not finish within `deadline`.
pub async fn resolve_street_name(
    geocoder: &dyn ReverseGeocoder,
    point: GeoPoint,
    deadline: Duration,
) -> String {
    match tokio::time::timeout(deadline, geocoder.street_name(point)).await {
        Ok(Ok(Some(name))) => name,
        Ok(Ok(None)) => STREET_PLACEHOLDER.to_string(),
        Ok(Err(e)) => {
            tracing::warn!("Reverse geocoding failed for {},{}: {}", point.lat, point.lng, e);
            STREET_PLACEHOLDER.to_string()
        }
        Err(_) => {
            tracing::warn!(
                "Reverse geocoding timed out after {:?} for {},{}",
                deadline,
                point.lat,
                point.lng
            );
            STREET_PLACEHOLDER.to_string()
        }
    }
}
