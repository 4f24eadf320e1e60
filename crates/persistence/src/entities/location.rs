//! Location entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GeoPoint, LocationType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for location_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "location_type", rename_all = "lowercase")]
pub enum LocationTypeDb {
    Outdoor,
    Indoor,
}

impl From<LocationTypeDb> for LocationType {
    fn from(db: LocationTypeDb) -> Self {
        match db {
            LocationTypeDb::Outdoor => Self::Outdoor,
            LocationTypeDb::Indoor => Self::Indoor,
        }
    }
}

impl From<LocationType> for LocationTypeDb {
    fn from(domain: LocationType) -> Self {
        match domain {
            LocationType::Outdoor => Self::Outdoor,
            LocationType::Indoor => Self::Indoor,
        }
    }
}

/// Column list shared by every location query.
pub const LOCATION_COLUMNS: &str = "id, organization_id, name, location_type, is_mobile, \
    address, latitude, longitude, created_at, modified_at";

/// Database row mapping for the locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub location_type: LocationTypeDb,
    pub is_mobile: bool,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<LocationEntity> for domain::models::Location {
    fn from(entity: LocationEntity) -> Self {
        let geolocation = match (entity.latitude, entity.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };
        Self {
            id: entity.id,
            organization_id: entity.organization_id,
            name: entity.name,
            location_type: entity.location_type.into(),
            is_mobile: entity.is_mobile,
            address: entity.address,
            geolocation,
            created_at: entity.created_at,
            modified_at: entity.modified_at,
        }
    }
}
