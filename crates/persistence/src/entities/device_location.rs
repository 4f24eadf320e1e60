//! Device location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the device_locations table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceLocationEntity {
    pub id: Uuid,
    pub device_id: Uuid,
    pub location_id: Option<Uuid>,
    pub floorplan_id: Option<Uuid>,
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<DeviceLocationEntity> for domain::models::DeviceLocation {
    fn from(entity: DeviceLocationEntity) -> Self {
        Self {
            id: entity.id,
            device_id: entity.device_id,
            location_id: entity.location_id,
            floorplan_id: entity.floorplan_id,
            indoor: entity.indoor,
            created_at: entity.created_at,
            modified_at: entity.modified_at,
        }
    }
}
