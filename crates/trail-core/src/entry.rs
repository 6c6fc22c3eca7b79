use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::params::{param, parse_decimal, parse_id, ParamError, Params};
use crate::status::QueryStatus;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ParamError> {
        if !latitude.is_finite() {
            return Err(ParamError::InvalidNumber { field: "latitude" });
        }
        if !longitude.is_finite() {
            return Err(ParamError::InvalidNumber { field: "longitude" });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ParamError::OutOfRange { field: "latitude" });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ParamError::OutOfRange { field: "longitude" });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Great-circle distance in metres (haversine).
    pub fn distance_m(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

/// One persisted query: a location-tagged question and its lifecycle status.
///
/// Serialized flat, field for field, which is the `read` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEntry {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub user_question: String,
    pub context_tag: String,
    pub status: QueryStatus,
    pub llm_response: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for `action=create`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuery {
    pub coordinates: Coordinates,
    pub user_question: String,
    pub context_tag: String,
}

impl NewQuery {
    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        let (Some(lat), Some(lon), Some(question), Some(tag)) = (
            param(params, "latitude"),
            param(params, "longitude"),
            param(params, "user_question"),
            param(params, "context_tag"),
        ) else {
            return Err(ParamError::MissingFields);
        };

        let coordinates = Coordinates::new(
            parse_decimal(lat, "latitude")?,
            parse_decimal(lon, "longitude")?,
        )?;

        Ok(Self {
            coordinates,
            user_question: question.to_string(),
            context_tag: tag.to_string(),
        })
    }
}

/// Validated input for `action=update`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryUpdate {
    pub id: i64,
    pub llm_response: String,
    pub status: QueryStatus,
}

impl QueryUpdate {
    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        let (Some(id), Some(llm_response), Some(status)) = (
            param(params, "id"),
            param(params, "llm_response"),
            param(params, "status"),
        ) else {
            return Err(ParamError::MissingFields);
        };

        let status = status
            .parse::<QueryStatus>()
            .map_err(|_| ParamError::InvalidStatus)?;

        Ok(Self {
            id: parse_id(id)?,
            llm_response: llm_response.to_string(),
            status,
        })
    }
}
