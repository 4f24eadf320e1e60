//! Device location form handling.
//!
//! Binding a device to a place happens in three steps:
//! 1. [`clean_form`] checks field presence for the submitted location type.
//! 2. [`resolve_binding`] turns the cleaned form plus the records it
//!    references into the Location, FloorPlan and DeviceLocation to save.
//! 3. [`validate_binding`] runs the record validators over the result.
//!
//! None of these steps touch storage; callers load the referenced records
//! beforehand and persist the resolved binding afterwards.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    Device, DeviceLocation, DeviceLocationForm, FloorPlan, FloorPlanSelection, ImageMeta,
    Location, LocationSelection, LocationType,
};
use crate::services::validation::{
    prepare_floorplan, validate_device_location, validate_location, DeviceLocationCheck,
    LocationCheck, ValidationErrors, Violation, ViolationKind,
};

fn required(field: &'static str, location_type: Option<LocationType>) -> Violation {
    let message = match location_type {
        Some(t) => format!("this field is required for locations of type {}", t),
        None => "this field is required".to_string(),
    };
    Violation::field(ViolationKind::Required, field, message)
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Checks which fields the submitted location type requires.
///
/// Fixed (non-mobile) locations need their selection, name, address and
/// coordinates; fixed indoor locations additionally need floorplan data.
/// A mobile location without a selected record starts out blank and is
/// always created anew.
pub fn clean_form(mut form: DeviceLocationForm) -> Result<DeviceLocationForm, ValidationErrors> {
    let location_type = form.location_type;
    let mut violations = Vec::new();

    if location_type.is_none() {
        violations.push(required("type", None));
    }

    if !form.is_mobile {
        if let Some(t) = location_type {
            if form.location_selection.is_none() {
                violations.push(required("location_selection", Some(t)));
            }
            if is_blank(&form.name) {
                violations.push(required("name", Some(t)));
            }
            if is_blank(&form.address) {
                violations.push(required("address", Some(t)));
            }
            if form.geolocation.is_none() {
                violations.push(required("geolocation", Some(t)));
            }
        }
        if location_type == Some(LocationType::Indoor) {
            match form.floorplan_selection {
                None => violations.push(required("floorplan_selection", location_type)),
                Some(FloorPlanSelection::Existing) if form.floorplan.is_none() => {
                    violations.push(required("floorplan", location_type))
                }
                Some(FloorPlanSelection::New) if form.image.is_none() => {
                    violations.push(required("image", location_type))
                }
                _ => {}
            }
            if form.floor.is_none() {
                violations.push(required("floor", location_type));
            }
            if is_blank(&form.indoor) {
                violations.push(required("indoor", location_type));
            }
        }
    } else if form.location.is_none() {
        form.name = None;
        form.address = None;
        form.geolocation = None;
        form.location_selection = Some(LocationSelection::New);
    }

    if form.location_selection == Some(LocationSelection::Existing) && form.location.is_none() {
        violations.push(required("location", location_type));
    }

    if violations.is_empty() {
        Ok(form)
    } else {
        Err(ValidationErrors(violations))
    }
}

/// Records referenced by a cleaned form, loaded by the caller.
#[derive(Debug, Clone, Copy)]
pub struct BindingInputs<'a> {
    pub device: &'a Device,
    /// The device's current binding, if any.
    pub current: Option<&'a DeviceLocation>,
    /// The location named by `form.location`.
    pub selected_location: Option<&'a Location>,
    /// The floorplan named by `form.floorplan`.
    pub selected_floorplan: Option<&'a FloorPlan>,
    /// Decoded metadata of `form.image`, if one was submitted.
    pub image: Option<ImageMeta>,
}

/// The records a form resolves to, ready to be validated and saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBinding {
    pub location: Location,
    /// Stored type of the location; `None` for a new location.
    pub previous_location_type: Option<LocationType>,
    pub floorplan: Option<FloorPlan>,
    pub floorplan_is_new: bool,
    /// Whether `floorplan.image` points at the submitted upload.
    pub image_replaced: bool,
    pub device_location: DeviceLocation,
}

/// Builds the location, floorplan and binding described by a cleaned form.
///
/// Submitted values replace stored ones only when present and non-blank.
/// A new location takes the device's organization; an existing one keeps
/// its own, as does an existing floorplan its location, so a mismatch
/// surfaces in validation.
pub fn resolve_binding(form: &DeviceLocationForm, inputs: BindingInputs<'_>) -> ResolvedBinding {
    let device = inputs.device;

    let existing = match form.location_selection {
        Some(LocationSelection::New) => None,
        _ => inputs.selected_location,
    };
    let previous_location_type = existing.map(|l| l.location_type);
    let mut location = match existing {
        Some(location) => location.clone(),
        None => Location::new(
            device.organization_id,
            form.location_type.unwrap_or(LocationType::Outdoor),
        ),
    };

    if let Some(location_type) = form.location_type {
        location.location_type = location_type;
    }
    location.is_mobile = form.is_mobile;
    if !is_blank(&form.name) {
        location.name = form.name.as_deref().unwrap_or_default().trim().to_string();
    }
    if !is_blank(&form.address) {
        location.address = form.address.as_deref().map(|a| a.trim().to_string());
    }
    if form.geolocation.is_some() {
        location.geolocation = form.geolocation;
    }
    if location.is_mobile && location.name.trim().is_empty() {
        location.name = device.to_string();
    }
    location.modified_at = Utc::now();

    let mut floorplan_is_new = false;
    let mut image_replaced = false;
    let floorplan = if location.is_indoor() {
        let selected = match form.floorplan_selection {
            Some(FloorPlanSelection::New) => None,
            _ => inputs.selected_floorplan,
        };
        let mut floorplan = match selected {
            Some(floorplan) => floorplan.clone(),
            None => {
                floorplan_is_new = true;
                FloorPlan::new(location.organization_id, location.id, form.floor.unwrap_or(0))
            }
        };
        if let Some(floor) = form.floor {
            floorplan.floor = floor;
        }
        if let Some(meta) = inputs.image {
            floorplan.set_image(meta);
            image_replaced = true;
        }
        floorplan.modified_at = Utc::now();
        Some(floorplan)
    } else {
        None
    };

    let mut device_location = inputs
        .current
        .cloned()
        .unwrap_or_else(|| DeviceLocation::new(device.id));
    device_location.location_id = Some(location.id);
    device_location.floorplan_id = floorplan.as_ref().map(|f| f.id);
    device_location.indoor = form
        .indoor
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string);
    device_location.modified_at = Utc::now();

    ResolvedBinding {
        location,
        previous_location_type,
        floorplan,
        floorplan_is_new,
        image_replaced,
        device_location,
    }
}

/// Runs the location, floorplan and device location validators.
///
/// `floorplan_owner` is the location an existing floorplan belongs to when
/// that is not the resolved location. `floorplan_count` is the number of
/// floorplans stored for the resolved location.
pub fn validate_binding(
    binding: &mut ResolvedBinding,
    device: &Device,
    floorplan_owner: Option<&Location>,
    floorplan_count: i64,
) -> Result<(), ValidationErrors> {
    let location_result = validate_location(&LocationCheck {
        location: &binding.location,
        previous_type: binding.previous_location_type,
        floorplan_count,
    });

    let floorplan_result = match binding.floorplan.as_mut() {
        Some(floorplan) => {
            let owner = if floorplan.location_id == binding.location.id {
                Some(&binding.location)
            } else {
                floorplan_owner.filter(|l| l.id == floorplan.location_id)
            };
            prepare_floorplan(floorplan, owner)
        }
        None => Ok(()),
    };

    let device_location_result = validate_device_location(&DeviceLocationCheck {
        device,
        location: Some(&binding.location),
        floorplan: binding.floorplan.as_ref(),
        indoor: binding.device_location.indoor.as_deref(),
    });

    ValidationErrors::merge([location_result, floorplan_result, device_location_result])
}

/// Picks the id the caller must load as the floorplan's owner, if any.
pub fn foreign_floorplan_location(binding: &ResolvedBinding) -> Option<Uuid> {
    binding
        .floorplan
        .as_ref()
        .map(|f| f.location_id)
        .filter(|id| *id != binding.location.id)
}
