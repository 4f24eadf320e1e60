//! Location endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::location::{CreateLocationRequest, ListLocationsQuery, UpdateLocationRequest};
use domain::models::{Location, LocationJson};
use domain::services::{validate_location, LocationCheck};
use persistence::db::is_foreign_key_violation;
use persistence::repositories::{LocationRepository, OrganizationRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_validation_failure;

pub(crate) const INVALID_CHOICE_MESSAGE: &str =
    "select a valid choice. That choice is not one of the available choices";

/// Loads a location or fails with 404.
pub(crate) async fn load_location(repo: &LocationRepository, id: Uuid) -> Result<Location, ApiError> {
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))
}

/// Create a new location.
///
/// POST /api/v1/locations
pub async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<Location>), ApiError> {
    request.validate()?;

    let org_repo = OrganizationRepository::new(state.pool.clone());
    if org_repo.find_by_id(request.organization_id).await?.is_none() {
        return Err(ApiError::invalid_field(
            "organization_id",
            "invalid_choice",
            INVALID_CHOICE_MESSAGE,
        ));
    }

    let location = request.into_location();
    validate_location(&LocationCheck {
        location: &location,
        previous_type: None,
        floorplan_count: 0,
    })
    .inspect_err(|_| record_validation_failure("location"))?;

    let repo = LocationRepository::new(state.pool.clone());
    let location = repo.create(&location).await?;

    info!(
        location_id = %location.id,
        organization_id = %location.organization_id,
        location_type = %location.location_type,
        "Location created"
    );

    Ok((StatusCode::CREATED, Json(location)))
}

/// List locations.
///
/// GET /api/v1/locations?organization=<uuid>&type=indoor&is_mobile=false&search=hq
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<Vec<Location>>, ApiError> {
    let repo = LocationRepository::new(state.pool.clone());
    let locations = repo.list(&query).await?;
    Ok(Json(locations))
}

/// Get a single location.
///
/// GET /api/v1/locations/:location_id
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<Location>, ApiError> {
    let repo = LocationRepository::new(state.pool.clone());
    Ok(Json(load_location(&repo, location_id).await?))
}

/// Partially update a location.
///
/// Changing the type of a location with floorplans away from indoor is
/// rejected.
///
/// PUT /api/v1/locations/:location_id
pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<Location>, ApiError> {
    request.validate()?;

    let repo = LocationRepository::new(state.pool.clone());
    let mut location = load_location(&repo, location_id).await?;
    let previous_type = location.location_type;

    location.apply_update(&request);

    let floorplan_count = repo.count_floorplans(location_id).await?;
    validate_location(&LocationCheck {
        location: &location,
        previous_type: Some(previous_type),
        floorplan_count,
    })
    .inspect_err(|_| record_validation_failure("location"))?;

    let location = repo
        .update(&location)
        .await?
        .ok_or_else(|| ApiError::NotFound("Location not found".to_string()))?;

    info!(location_id = %location.id, "Location updated");

    Ok(Json(location))
}

/// Delete a location.
///
/// Locations still referenced by floorplans or device locations are
/// protected and answer 409.
///
/// DELETE /api/v1/locations/:location_id
pub async fn delete_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = LocationRepository::new(state.pool.clone());
    let deleted = repo.delete(location_id).await.map_err(|e| {
        if is_foreign_key_violation(&e) {
            ApiError::Conflict(
                "Cannot delete location: it is referenced by floorplans or device locations"
                    .to_string(),
            )
        } else {
            e.into()
        }
    })?;

    if !deleted {
        return Err(ApiError::NotFound("Location not found".to_string()));
    }

    info!(location_id = %location_id, "Location deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Compact location representation.
///
/// GET /api/v1/locations/:location_id/json
pub async fn location_json(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<LocationJson>, ApiError> {
    let repo = LocationRepository::new(state.pool.clone());
    let location = load_location(&repo, location_id).await?;
    Ok(Json(LocationJson::from(&location)))
}
