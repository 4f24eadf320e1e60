//! Floorplan domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Directory (relative to the media root) holding floorplan images.
pub const FLOORPLAN_IMAGE_DIR: &str = "floorplans";

/// One floor of an indoor location: an image plus its floor index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FloorPlan {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub location_id: Uuid,
    pub floor: i16,
    /// Storage path of the image, relative to the media root.
    pub image: String,
    pub image_width: i32,
    pub image_height: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Decoded facts about an uploaded image, enough to name and describe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMeta {
    pub extension: &'static str,
    pub width: i32,
    pub height: i32,
}

impl FloorPlan {
    /// Builds an unsaved floorplan for `location_id` with a fresh id and no image.
    pub fn new(organization_id: Uuid, location_id: Uuid, floor: i16) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            location_id,
            floor,
            image: String::new(),
            image_width: 0,
            image_height: 0,
            created_at: now,
            modified_at: now,
        }
    }

    /// Storage path for an image of this floorplan.
    ///
    /// The path only depends on the floorplan id, so a new upload replaces
    /// the previous file.
    pub fn image_path_for(id: Uuid, extension: &str) -> String {
        format!("{}/{}.{}", FLOORPLAN_IMAGE_DIR, id, extension)
    }

    /// Points the floorplan at a freshly uploaded image.
    pub fn set_image(&mut self, meta: ImageMeta) {
        self.image = Self::image_path_for(self.id, meta.extension);
        self.image_width = meta.width;
        self.image_height = meta.height;
    }

    pub fn has_image(&self) -> bool {
        !self.image.is_empty()
    }

    /// Human readable label, e.g. `"HQ 1st floor"` or `"HQ ground floor"`.
    pub fn label(&self, location_name: &str) -> String {
        let floor = if self.floor == 0 {
            "ground".to_string()
        } else {
            ordinal(self.floor)
        };
        format!("{} {} floor", location_name, floor)
    }
}

/// English ordinal for a floor number (`1st`, `12th`, `-2nd`).
pub fn ordinal(value: i16) -> String {
    let n = i32::from(value).abs();
    let suffix = if (11..=13).contains(&(n % 100)) {
        "th"
    } else {
        match n % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        }
    };
    format!("{}{}", value, suffix)
}

/// Base64 encoded image submitted through the JSON API.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    /// Original file name. The stored extension follows the decoded format.
    pub filename: String,
    /// Standard base64 of the file content.
    pub data: String,
}

/// Request payload for creating a floorplan.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFloorPlanRequest {
    pub location_id: Uuid,
    pub floor: i16,
    pub image: ImageUpload,
}

/// Request payload for a partial floorplan update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFloorPlanRequest {
    pub location_id: Option<Uuid>,
    pub floor: Option<i16>,
    pub image: Option<ImageUpload>,
}

/// Query parameters for listing floorplans.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFloorPlansQuery {
    pub organization: Option<Uuid>,
    pub location: Option<Uuid>,
}

/// One entry of `GET /locations/:id/floorplans/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanChoice {
    pub id: Uuid,
    pub str: String,
    pub floor: i16,
    /// Public URL of the image.
    pub image: String,
    pub image_width: i32,
    pub image_height: i32,
}

impl FloorPlanChoice {
    pub fn new(floorplan: &FloorPlan, location_name: &str, image_url: String) -> Self {
        Self {
            id: floorplan.id,
            str: floorplan.label(location_name),
            floor: floorplan.floor,
            image: image_url,
            image_width: floorplan.image_width,
            image_height: floorplan.image_height,
        }
    }
}

/// Response body of `GET /locations/:id/floorplans/json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanChoices {
    pub choices: Vec<FloorPlanChoice>,
}
