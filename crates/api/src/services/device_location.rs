//! Saving a device's location from a submitted form.
//!
//! Referenced records are read first, the binding is resolved and
//! validated in memory, and only then are the rows written. An uploaded
//! image is staged beforehand and moved into place after the commit.

use domain::models::{
    DeviceLocationForm, FloorPlan, FloorPlanSelection, Location, LocationSelection,
};
use domain::services::{
    clean_form, foreign_floorplan_location, resolve_binding, validate_binding, BindingInputs,
};
use persistence::repositories::{
    DeviceLocationRepository, DeviceRepository, FloorPlanRepository, LocationRepository,
    SavedBinding,
};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_validation_failure;
use crate::routes::floorplans::{commit_image, decode_image, discard_image, stage_image};
use crate::routes::locations::INVALID_CHOICE_MESSAGE;

async fn selected_location(
    repo: &LocationRepository,
    id: Option<Uuid>,
) -> Result<Option<Location>, ApiError> {
    let Some(id) = id else {
        return Ok(None);
    };
    match repo.find_by_id(id).await? {
        Some(location) => Ok(Some(location)),
        None => Err(ApiError::invalid_field(
            "location",
            "invalid_choice",
            INVALID_CHOICE_MESSAGE,
        )),
    }
}

async fn selected_floorplan(
    repo: &FloorPlanRepository,
    id: Option<Uuid>,
) -> Result<Option<FloorPlan>, ApiError> {
    let Some(id) = id else {
        return Ok(None);
    };
    match repo.find_by_id(id).await? {
        Some(floorplan) => Ok(Some(floorplan)),
        None => Err(ApiError::invalid_field(
            "floorplan",
            "invalid_choice",
            INVALID_CHOICE_MESSAGE,
        )),
    }
}

/// Validates `form` and binds the device to the place it describes.
///
/// Creates or updates the location and floorplan as needed. All rows are
/// written in one transaction after validation succeeded.
pub async fn save_device_location(
    state: &AppState,
    device_id: Uuid,
    form: DeviceLocationForm,
) -> Result<SavedBinding, ApiError> {
    let device = DeviceRepository::new(state.pool.clone())
        .find_by_id(device_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not found".to_string()))?;

    let form = clean_form(form).inspect_err(|_| record_validation_failure("device_location"))?;

    let image = form
        .image
        .as_ref()
        .map(|upload| decode_image(state, upload))
        .transpose()?;

    let location_repo = LocationRepository::new(state.pool.clone());
    let floorplan_repo = FloorPlanRepository::new(state.pool.clone());
    let device_location_repo = DeviceLocationRepository::new(state.pool.clone());

    let current = device_location_repo.find_by_device(device.id).await?;
    let location_id = form
        .location
        .filter(|_| form.location_selection != Some(LocationSelection::New));
    let floorplan_id = form
        .floorplan
        .filter(|_| form.floorplan_selection != Some(FloorPlanSelection::New));
    let location = selected_location(&location_repo, location_id).await?;
    let floorplan = selected_floorplan(&floorplan_repo, floorplan_id).await?;

    let mut binding = resolve_binding(
        &form,
        BindingInputs {
            device: &device,
            current: current.as_ref(),
            selected_location: location.as_ref(),
            selected_floorplan: floorplan.as_ref(),
            image: image.as_ref().map(|i| i.meta),
        },
    );

    let floorplan_owner = match foreign_floorplan_location(&binding) {
        Some(id) => location_repo.find_by_id(id).await?,
        None => None,
    };
    let floorplan_count = if binding.previous_location_type.is_some() {
        location_repo.count_floorplans(binding.location.id).await?
    } else {
        0
    };

    validate_binding(&mut binding, &device, floorplan_owner.as_ref(), floorplan_count)
        .inspect_err(|_| record_validation_failure("device_location"))?;

    // Image to drop once the new one is stored under a different path.
    let replaced_image = floorplan
        .as_ref()
        .filter(|_| binding.image_replaced)
        .map(|f| f.image.clone());

    let staged = match (binding.floorplan.as_ref(), image.as_ref()) {
        (Some(floorplan), Some(image)) if binding.image_replaced => {
            Some(stage_image(state.storage.as_ref(), floorplan, image).await?)
        }
        _ => None,
    };

    let saved = match device_location_repo.save_binding(&binding).await {
        Ok(saved) => saved,
        Err(e) => {
            if let Some(ref staged) = staged {
                discard_image(state.storage.as_ref(), staged).await;
            }
            return Err(e.into());
        }
    };

    if let (Some(staged), Some(floorplan), Some(image)) =
        (staged.as_deref(), saved.floorplan.as_ref(), image.as_ref())
    {
        commit_image(state.storage.as_ref(), staged, floorplan, image).await?;
    }

    if let (Some(old), Some(new)) = (replaced_image, saved.floorplan.as_ref()) {
        if old != new.image {
            discard_image(state.storage.as_ref(), &old).await;
        }
    }

    info!(
        device_id = %device.id,
        location_id = %saved.location.id,
        location_created = binding.previous_location_type.is_none(),
        floorplan_created = binding.floorplan_is_new,
        "Device location saved"
    );

    Ok(saved)
}
