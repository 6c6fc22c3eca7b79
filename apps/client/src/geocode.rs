//! Reverse geocoding against a Nominatim-compatible service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use trail_core::Coordinates;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder error: {0}")]
    Service(String),
}

/// Human-readable description of a location.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub display_name: String,
}

#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn reverse(&self, coordinates: Coordinates) -> Result<Place, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    /// Nominatim's usage policy rejects requests without an identifying User-Agent.
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(user_agent)
                .timeout(timeout)
                .build()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PlaceLookup for Geocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<Place, GeocodeError> {
        let url = format!("{}/reverse", self.base_url.trim_end_matches('/'));
        let response: ReverseResponse = self
            .client
            .get(url)
            .query(&[
                ("lat", coordinates.latitude.to_string()),
                ("lon", coordinates.longitude.to_string()),
                ("zoom", "18".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        place_from_response(response)
    }
}

fn place_from_response(response: ReverseResponse) -> Result<Place, GeocodeError> {
    match (response.display_name, response.error) {
        (Some(display_name), _) => Ok(Place { display_name }),
        (None, Some(error)) => Err(GeocodeError::Service(error)),
        (None, None) => Err(GeocodeError::Service(
            "response has no display_name".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Place, GeocodeError> {
        place_from_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_display_name_extracted() {
        let place = parse(
            r#"{"place_id":1,"display_name":"Lighthouse Rd, Montauk, NY","address":{"road":"Lighthouse Rd"}}"#,
        )
        .unwrap();
        assert_eq!(place.display_name, "Lighthouse Rd, Montauk, NY");
    }

    #[test]
    fn test_service_error_surfaces() {
        let err = parse(r#"{"error":"Unable to geocode"}"#).unwrap_err();
        assert!(matches!(err, GeocodeError::Service(msg) if msg == "Unable to geocode"));
    }

    #[test]
    fn test_empty_response_is_error() {
        assert!(parse("{}").is_err());
    }
}
