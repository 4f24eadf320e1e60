//! Device location domain model and the form used to bind a device to a place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::floorplan::ImageUpload;
use super::location::{GeoPoint, LocationType};

/// Binding of one device to a location, optionally a floorplan and an
/// indoor position on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeviceLocation {
    pub id: Uuid,
    pub device_id: Uuid,
    pub location_id: Option<Uuid>,
    pub floorplan_id: Option<Uuid>,
    /// Indoor position as `"<x>,<y>"`.
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl DeviceLocation {
    pub fn new(device_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            device_id,
            location_id: None,
            floorplan_id: None,
            indoor: None,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Parsed indoor position on a floorplan image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndoorPosition {
    pub x: f64,
    pub y: f64,
}

impl IndoorPosition {
    /// Parses `"<x>,<y>"`. Anything other than exactly two float
    /// components yields `None`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',');
        let x = parts.next()?.trim().parse::<f64>().ok()?;
        let y = parts.next()?.trim().parse::<f64>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { x, y })
    }
}

/// Whether the form picks an already stored record or describes a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSelection {
    Existing,
    New,
}

/// Same as [`LocationSelection`], for the floorplan part of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloorPlanSelection {
    Existing,
    New,
}

/// Submitted data for creating or updating a device's location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeviceLocationForm {
    pub location_selection: Option<LocationSelection>,
    /// Existing location to reuse.
    pub location: Option<Uuid>,
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    #[serde(default)]
    pub is_mobile: bool,
    pub name: Option<String>,
    pub address: Option<String>,
    pub geolocation: Option<GeoPoint>,

    pub floorplan_selection: Option<FloorPlanSelection>,
    /// Existing floorplan to reuse.
    pub floorplan: Option<Uuid>,
    pub floor: Option<i16>,
    pub image: Option<ImageUpload>,
    pub indoor: Option<String>,
}
