//! Seismic event feed.
//!
//! The feed is a GeoJSON document in the format published by the USGS
//! earthquake summary endpoints. [`UsgsFeed`] fetches it over HTTP; anything
//! implementing [`FeedSource`] can stand in for it.

use std::time::Duration;

use serde::Deserialize;

use super::geo::Coordinate;
use crate::error::{QuakeError, Result};

const UNKNOWN_PLACE: &str = "Unknown location";

/// A single event as reported by the feed
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub place: String,
    /// Origin time, milliseconds since the Unix epoch
    pub time_ms: i64,
    pub coordinate: Coordinate,
}

/// Anything that can produce the current list of events
pub trait FeedSource {
    fn fetch(&self) -> Result<Vec<EventRecord>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    /// [longitude, latitude, depth, ...]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    mag: Option<f64>,
    place: Option<String>,
    time: i64,
}

impl Feature {
    fn into_record(self) -> Result<Option<EventRecord>> {
        let (lon, lat, depth) = match self.geometry.coordinates.as_slice() {
            [lon, lat, depth, ..] => (*lon, *lat, *depth),
            other => {
                return Err(QuakeError::fetch(format!(
                    "event {} has {} coordinates, expected at least 3",
                    self.id,
                    other.len()
                )))
            }
        };

        let Some(magnitude) = self.properties.mag else {
            log::debug!("Skipping event {} without magnitude", self.id);
            return Ok(None);
        };

        Ok(Some(EventRecord {
            id: self.id,
            magnitude,
            depth_km: depth,
            place: self
                .properties
                .place
                .unwrap_or_else(|| UNKNOWN_PLACE.to_string()),
            time_ms: self.properties.time,
            coordinate: Coordinate::new(lat, lon),
        }))
    }
}

/// Parse a GeoJSON feed body into event records, preserving feed order
pub fn parse_feed(body: &str) -> Result<Vec<EventRecord>> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|e| QuakeError::fetch(format!("malformed feed: {}", e)))?;

    let mut records = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        if let Some(record) = feature.into_record()? {
            records.push(record);
        }
    }
    Ok(records)
}

/// HTTP feed client
pub struct UsgsFeed {
    client: reqwest::blocking::Client,
    url: String,
}

impl UsgsFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("quakewatch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl FeedSource for UsgsFeed {
    fn fetch(&self) -> Result<Vec<EventRecord>> {
        let response = self.client.get(&self.url).send()?;

        if !response.status().is_success() {
            return Err(QuakeError::fetch(format!(
                "{} returned status {}",
                self.url,
                response.status()
            )));
        }

        let body = response.text()?;
        parse_feed(&body)
    }
}
