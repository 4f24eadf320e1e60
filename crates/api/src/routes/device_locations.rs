//! Device location endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::{DeviceLocation, DeviceLocationForm, Location};
use persistence::repositories::{
    DeviceLocationRepository, DeviceRepository, FloorPlanRepository, LocationRepository,
    SavedBinding,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::floorplans::FloorPlanResponse;
use crate::services::device_location;
use crate::services::storage::ImageStorage;

/// A device's binding with its location and floorplan expanded.
#[derive(Debug, Serialize)]
pub struct DeviceLocationResponse {
    pub id: Uuid,
    pub device_id: Uuid,
    pub location: Option<Location>,
    pub floorplan: Option<FloorPlanResponse>,
    pub indoor: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl DeviceLocationResponse {
    fn new(
        device_location: DeviceLocation,
        location: Option<Location>,
        floorplan: Option<domain::models::FloorPlan>,
        storage: &dyn ImageStorage,
    ) -> Self {
        let floorplan = floorplan.map(|f| FloorPlanResponse::new(f, location.as_ref(), storage));
        Self {
            id: device_location.id,
            device_id: device_location.device_id,
            location,
            floorplan,
            indoor: device_location.indoor,
            created_at: device_location.created_at,
            modified_at: device_location.modified_at,
        }
    }
}

async fn ensure_device(state: &AppState, device_id: Uuid) -> Result<(), ApiError> {
    DeviceRepository::new(state.pool.clone())
        .find_by_id(device_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))
}

/// Get the current location of a device.
///
/// GET /api/v1/devices/:device_id/location
pub async fn get_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> Result<Json<DeviceLocationResponse>, ApiError> {
    ensure_device(&state, device_id).await?;

    let device_location = DeviceLocationRepository::new(state.pool.clone())
        .find_by_device(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device location not found".to_string()))?;

    let location = match device_location.location_id {
        Some(id) => LocationRepository::new(state.pool.clone()).find_by_id(id).await?,
        None => None,
    };
    let floorplan = match device_location.floorplan_id {
        Some(id) => FloorPlanRepository::new(state.pool.clone()).find_by_id(id).await?,
        None => None,
    };

    Ok(Json(DeviceLocationResponse::new(
        device_location,
        location,
        floorplan,
        state.storage.as_ref(),
    )))
}

/// Create or replace the location of a device.
///
/// PUT /api/v1/devices/:device_id/location
pub async fn save_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Json(form): Json<DeviceLocationForm>,
) -> Result<Json<DeviceLocationResponse>, ApiError> {
    let SavedBinding {
        location,
        floorplan,
        device_location,
    } = device_location::save_device_location(&state, device_id, form).await?;

    Ok(Json(DeviceLocationResponse::new(
        device_location,
        Some(location),
        floorplan,
        state.storage.as_ref(),
    )))
}

/// Remove the location of a device. The location itself is kept.
///
/// DELETE /api/v1/devices/:device_id/location
pub async fn delete_device_location(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_device(&state, device_id).await?;

    let deleted = DeviceLocationRepository::new(state.pool.clone())
        .delete_by_device(device_id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("Device location not found".to_string()));
    }

    info!(device_id = %device_id, "Device location removed");

    Ok(StatusCode::NO_CONTENT)
}
