//! Location domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Kind of place a location describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// Outdoor environment (eg: street, square, garden, land).
    Outdoor,
    /// Indoor environment (eg: building, roofs, subway, large vehicles).
    /// Only indoor locations can have floorplans.
    Indoor,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Outdoor => "outdoor",
            LocationType::Indoor => "indoor",
        }
    }

    /// Capitalized label used in listings.
    pub fn label(&self) -> &'static str {
        match self {
            LocationType::Outdoor => "Outdoor",
            LocationType::Indoor => "Indoor",
        }
    }
}

impl FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "outdoor" => Ok(LocationType::Outdoor),
            "indoor" => Ok(LocationType::Indoor),
            _ => Err(format!("Unknown location type: {}", s)),
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair, exchanged as the string `"<lat>,<lng>"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for GeoPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid geolocation: {}", s);
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat = lat.trim().parse::<f64>().map_err(|_| invalid())?;
        let lng = lng.trim().parse::<f64>().map_err(|_| invalid())?;
        Ok(Self { lat, lng })
    }
}

impl Serialize for GeoPoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A place record: a fixed outdoor/indoor site or a mobile asset placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Location {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    pub address: Option<String>,
    pub geolocation: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Location {
    /// Builds an unsaved location with a fresh id.
    pub fn new(organization_id: Uuid, location_type: LocationType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: String::new(),
            location_type,
            is_mobile: false,
            address: None,
            geolocation: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn is_indoor(&self) -> bool {
        self.location_type == LocationType::Indoor
    }

    pub fn short_type(&self) -> &'static str {
        self.location_type.label()
    }

    /// Applies a partial update. Absent fields keep their current value.
    pub fn apply_update(&mut self, update: &UpdateLocationRequest) {
        if let Some(ref name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(location_type) = update.location_type {
            self.location_type = location_type;
        }
        if let Some(is_mobile) = update.is_mobile {
            self.is_mobile = is_mobile;
        }
        if let Some(ref address) = update.address {
            self.address = non_empty(address);
        }
        if let Some(geolocation) = update.geolocation {
            self.geolocation = Some(geolocation);
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Request payload for creating a location.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateLocationRequest {
    pub organization_id: Uuid,

    #[serde(default)]
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub location_type: LocationType,

    #[serde(default)]
    pub is_mobile: bool,

    #[serde(default)]
    #[validate(length(max = 100, message = "Address must be at most 100 characters"))]
    pub address: Option<String>,

    #[serde(default)]
    pub geolocation: Option<GeoPoint>,
}

impl CreateLocationRequest {
    pub fn into_location(self) -> Location {
        let mut location = Location::new(self.organization_id, self.location_type);
        location.name = self
            .name
            .as_deref()
            .map(|n| n.trim().to_string())
            .unwrap_or_default();
        location.is_mobile = self.is_mobile;
        location.address = self.address.as_deref().and_then(non_empty);
        location.geolocation = self.geolocation;
        location
    }
}

/// Request payload for a partial location update.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateLocationRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,

    pub is_mobile: Option<bool>,

    #[validate(length(max = 100, message = "Address must be at most 100 characters"))]
    pub address: Option<String>,

    pub geolocation: Option<GeoPoint>,
}

/// Query parameters for listing locations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListLocationsQuery {
    pub organization: Option<Uuid>,
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    pub is_mobile: Option<bool>,
    /// Case-insensitive substring match on name or address.
    pub search: Option<String>,
}

/// Compact representation returned by `GET /locations/:id/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationJson {
    pub name: String,
    #[serde(rename = "type")]
    pub location_type: LocationType,
    pub is_mobile: bool,
    pub address: Option<String>,
    pub geolocation: Option<String>,
}

impl From<&Location> for LocationJson {
    fn from(location: &Location) -> Self {
        Self {
            name: location.name.clone(),
            location_type: location.location_type,
            is_mobile: location.is_mobile,
            address: location.address.clone(),
            geolocation: location.geolocation.map(|g| g.to_string()),
        }
    }
}
