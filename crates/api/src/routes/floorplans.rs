//! Floorplan endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::floorplan::{
    CreateFloorPlanRequest, ListFloorPlansQuery, UpdateFloorPlanRequest,
};
use domain::models::{FloorPlan, FloorPlanChoice, FloorPlanChoices, ImageUpload, Location};
use domain::services::{check_floorplan_relocation, prepare_floorplan};
use persistence::db::is_foreign_key_violation;
use persistence::repositories::{FloorPlanRepository, LocationRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_image_stored, record_validation_failure};
use crate::routes::locations::load_location;
use crate::services::image::{decode_upload, DecodedImage};
use crate::services::storage::ImageStorage;

/// Floorplan as returned by the API, with its image URL and label.
#[derive(Debug, Serialize)]
pub struct FloorPlanResponse {
    #[serde(flatten)]
    pub floorplan: FloorPlan,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub str: Option<String>,
}

impl FloorPlanResponse {
    pub fn new(floorplan: FloorPlan, location: Option<&Location>, storage: &dyn ImageStorage) -> Self {
        let image_url = storage.url(&floorplan.image);
        let str = location.map(|l| floorplan.label(&l.name));
        Self {
            floorplan,
            image_url,
            str,
        }
    }
}

/// Decodes an uploaded image within the configured size limit.
pub(crate) fn decode_image(state: &AppState, upload: &ImageUpload) -> Result<DecodedImage, ApiError> {
    decode_upload(upload, state.config.storage.max_image_bytes).map_err(|e| {
        record_validation_failure("floorplan");
        e.into()
    })
}

/// Removes an image that is no longer referenced. Failures are logged only.
pub(crate) async fn discard_image(storage: &dyn ImageStorage, path: &str) {
    if path.is_empty() {
        return;
    }
    if let Err(e) = storage.delete(path).await {
        warn!(path, error = %e, "Failed to delete floorplan image");
    }
}

/// Writes an upload next to the floorplan's image path.
///
/// The stored image is left untouched until [`commit_image`] moves the
/// staged file over it, once the row is saved.
pub(crate) async fn stage_image(
    storage: &dyn ImageStorage,
    floorplan: &FloorPlan,
    image: &DecodedImage,
) -> Result<String, ApiError> {
    let staged = format!("{}.{}.upload", floorplan.image, Uuid::new_v4().simple());
    storage.save(&staged, &image.bytes).await?;
    Ok(staged)
}

/// Moves a staged upload onto the floorplan's image path.
pub(crate) async fn commit_image(
    storage: &dyn ImageStorage,
    staged: &str,
    floorplan: &FloorPlan,
    image: &DecodedImage,
) -> Result<(), ApiError> {
    storage.rename(staged, &floorplan.image).await?;
    record_image_stored(image.meta.extension);
    Ok(())
}

/// Create a floorplan for an indoor location.
///
/// The floorplan's organization is taken from its location.
///
/// POST /api/v1/floorplans
pub async fn create_floorplan(
    State(state): State<AppState>,
    Json(request): Json<CreateFloorPlanRequest>,
) -> Result<(StatusCode, Json<FloorPlanResponse>), ApiError> {
    let image = decode_image(&state, &request.image)?;

    let location_repo = LocationRepository::new(state.pool.clone());
    let location = location_repo.find_by_id(request.location_id).await?;

    let organization_id = location.as_ref().map(|l| l.organization_id).unwrap_or_default();
    let mut floorplan = FloorPlan::new(organization_id, request.location_id, request.floor);
    floorplan.set_image(image.meta);
    prepare_floorplan(&mut floorplan, location.as_ref())
        .inspect_err(|_| record_validation_failure("floorplan"))?;

    let staged = stage_image(state.storage.as_ref(), &floorplan, &image).await?;

    let repo = FloorPlanRepository::new(state.pool.clone());
    let floorplan = match repo.create(&floorplan).await {
        Ok(saved) => saved,
        Err(e) => {
            discard_image(state.storage.as_ref(), &staged).await;
            return Err(e.into());
        }
    };
    commit_image(state.storage.as_ref(), &staged, &floorplan, &image).await?;

    info!(
        floorplan_id = %floorplan.id,
        location_id = %floorplan.location_id,
        floor = floorplan.floor,
        "Floorplan created"
    );

    let response = FloorPlanResponse::new(floorplan, location.as_ref(), state.storage.as_ref());
    Ok((StatusCode::CREATED, Json(response)))
}

/// List floorplans.
///
/// GET /api/v1/floorplans?organization=<uuid>&location=<uuid>
pub async fn list_floorplans(
    State(state): State<AppState>,
    Query(query): Query<ListFloorPlansQuery>,
) -> Result<Json<Vec<FloorPlanResponse>>, ApiError> {
    let repo = FloorPlanRepository::new(state.pool.clone());
    let floorplans = repo.list(&query).await?;

    let response = floorplans
        .into_iter()
        .map(|f| FloorPlanResponse::new(f, None, state.storage.as_ref()))
        .collect();
    Ok(Json(response))
}

/// Get a single floorplan.
///
/// GET /api/v1/floorplans/:floorplan_id
pub async fn get_floorplan(
    State(state): State<AppState>,
    Path(floorplan_id): Path<Uuid>,
) -> Result<Json<FloorPlanResponse>, ApiError> {
    let repo = FloorPlanRepository::new(state.pool.clone());
    let floorplan = load_floorplan(&repo, floorplan_id).await?;

    let location_repo = LocationRepository::new(state.pool.clone());
    let location = location_repo.find_by_id(floorplan.location_id).await?;

    Ok(Json(FloorPlanResponse::new(
        floorplan,
        location.as_ref(),
        state.storage.as_ref(),
    )))
}

/// Partially update a floorplan.
///
/// A new image replaces the stored one. A floorplan used by device
/// locations cannot move to another location.
///
/// PUT /api/v1/floorplans/:floorplan_id
pub async fn update_floorplan(
    State(state): State<AppState>,
    Path(floorplan_id): Path<Uuid>,
    Json(request): Json<UpdateFloorPlanRequest>,
) -> Result<Json<FloorPlanResponse>, ApiError> {
    let repo = FloorPlanRepository::new(state.pool.clone());
    let mut floorplan = load_floorplan(&repo, floorplan_id).await?;
    let previous_image = floorplan.image.clone();
    let stored_location_id = floorplan.location_id;

    let image = request
        .image
        .as_ref()
        .map(|upload| decode_image(&state, upload))
        .transpose()?;

    if let Some(location_id) = request.location_id {
        floorplan.location_id = location_id;
    }
    if let Some(floor) = request.floor {
        floorplan.floor = floor;
    }
    if let Some(ref image) = image {
        floorplan.set_image(image.meta);
    }

    let location_repo = LocationRepository::new(state.pool.clone());
    let location = location_repo.find_by_id(floorplan.location_id).await?;
    prepare_floorplan(&mut floorplan, location.as_ref())
        .inspect_err(|_| record_validation_failure("floorplan"))?;

    if floorplan.location_id != stored_location_id {
        let bindings = repo.count_device_locations(floorplan.id).await?;
        check_floorplan_relocation(&floorplan, stored_location_id, bindings)
            .inspect_err(|_| record_validation_failure("floorplan"))?;
    }

    let staged = match image {
        Some(ref image) => Some(stage_image(state.storage.as_ref(), &floorplan, image).await?),
        None => None,
    };

    let floorplan = match repo.update(&floorplan).await {
        Ok(Some(updated)) => updated,
        other => {
            if let Some(ref staged) = staged {
                discard_image(state.storage.as_ref(), staged).await;
            }
            return Err(match other {
                Err(e) => e.into(),
                _ => ApiError::NotFound("Floorplan not found".to_string()),
            });
        }
    };

    if let (Some(staged), Some(image)) = (staged.as_deref(), image.as_ref()) {
        commit_image(state.storage.as_ref(), staged, &floorplan, image).await?;
    }

    if floorplan.image != previous_image {
        discard_image(state.storage.as_ref(), &previous_image).await;
    }

    info!(floorplan_id = %floorplan.id, "Floorplan updated");

    Ok(Json(FloorPlanResponse::new(
        floorplan,
        location.as_ref(),
        state.storage.as_ref(),
    )))
}

/// Delete a floorplan and its image.
///
/// Floorplans still referenced by device locations answer 409.
///
/// DELETE /api/v1/floorplans/:floorplan_id
pub async fn delete_floorplan(
    State(state): State<AppState>,
    Path(floorplan_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = FloorPlanRepository::new(state.pool.clone());
    let floorplan = load_floorplan(&repo, floorplan_id).await?;

    repo.delete(floorplan_id).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            ApiError::Conflict(
                "Cannot delete floorplan: it is referenced by device locations".to_string(),
            )
        } else {
            e.into()
        }
    })?;

    discard_image(state.storage.as_ref(), &floorplan.image).await;

    info!(floorplan_id = %floorplan_id, "Floorplan deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Floorplans of a location as choices, ordered by floor.
///
/// GET /api/v1/locations/:location_id/floorplans/json
pub async fn location_floorplans_json(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<FloorPlanChoices>, ApiError> {
    let location_repo = LocationRepository::new(state.pool.clone());
    let location = load_location(&location_repo, location_id).await?;

    let repo = FloorPlanRepository::new(state.pool.clone());
    let choices = repo
        .list_by_location(location_id)
        .await?
        .iter()
        .map(|f| FloorPlanChoice::new(f, &location.name, state.storage.url(&f.image)))
        .collect();

    Ok(Json(FloorPlanChoices { choices }))
}

async fn load_floorplan(repo: &FloorPlanRepository, id: Uuid) -> Result<FloorPlan, ApiError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Floorplan not found".to_string()))
}
