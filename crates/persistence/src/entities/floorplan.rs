//! Floorplan entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Column list shared by every floorplan query.
pub const FLOORPLAN_COLUMNS: &str = "id, organization_id, location_id, floor, image, \
    image_width, image_height, created_at, modified_at";

/// Database row mapping for the floorplans table.
#[derive(Debug, Clone, FromRow)]
pub struct FloorPlanEntity {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub location_id: Uuid,
    pub floor: i16,
    pub image: String,
    pub image_width: i32,
    pub image_height: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<FloorPlanEntity> for domain::models::FloorPlan {
    fn from(entity: FloorPlanEntity) -> Self {
        Self {
            id: entity.id,
            organization_id: entity.organization_id,
            location_id: entity.location_id,
            floor: entity.floor,
            image: entity.image,
            image_width: entity.image_width,
            image_height: entity.image_height,
            created_at: entity.created_at,
            modified_at: entity.modified_at,
        }
    }
}
