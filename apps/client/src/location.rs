//! Location fixes and the update policy applied to them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use trail_core::{Coordinates, ParamError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn now(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseFixError {
    #[error("expected \"lat,lon\", got {0:?}")]
    Format(String),

    #[error("{0}")]
    Invalid(#[from] ParamError),
}

/// Parses `"lat,lon"` or `"lat lon"`.
pub fn parse_fix(input: &str) -> Result<Coordinates, ParseFixError> {
    let parts: Vec<&str> = input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    let [lat, lon] = parts.as_slice() else {
        return Err(ParseFixError::Format(input.to_string()));
    };

    let lat = lat
        .parse::<f64>()
        .map_err(|_| ParamError::InvalidNumber { field: "latitude" })?;
    let lon = lon
        .parse::<f64>()
        .map_err(|_| ParamError::InvalidNumber { field: "longitude" })?;

    Ok(Coordinates::new(lat, lon)?)
}

/// Passes a fix through once `min_interval` has elapsed since the last accepted
/// fix, or once the device has moved at least `min_distance_m`.
#[derive(Debug, Clone)]
pub struct FixThrottle {
    min_interval: Duration,
    min_distance_m: f64,
    last: Option<LocationFix>,
}

impl FixThrottle {
    pub fn new(min_interval: Duration, min_distance_m: f64) -> Self {
        Self {
            min_interval,
            min_distance_m,
            last: None,
        }
    }

    pub fn accept(&mut self, fix: LocationFix) -> bool {
        let accepted = match &self.last {
            None => true,
            Some(last) => {
                let elapsed = (fix.timestamp - last.timestamp).to_std().unwrap_or_default();
                elapsed >= self.min_interval
                    || fix.coordinates.distance_m(&last.coordinates) >= self.min_distance_m
            }
        };
        if accepted {
            self.last = Some(fix);
        }
        accepted
    }
}

/// Forwards fixes read line by line from `input` until it ends or the
/// receiver is dropped. Unparseable lines are logged and skipped.
pub async fn forward_lines<R>(input: R, mut throttle: FixThrottle, fixes: mpsc::Sender<LocationFix>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read location input: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let coordinates = match parse_fix(&line) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping location line: {e}");
                continue;
            }
        };

        let fix = LocationFix::now(coordinates);
        if !throttle.accept(fix) {
            debug!("Dropping fix {coordinates:?}: too soon and too close");
            continue;
        }
        if fixes.send(fix).await.is_err() {
            break;
        }
    }
}
