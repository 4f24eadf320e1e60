//! Record validators.
//!
//! Every record kind has a fixed, ordered list of independent validators.
//! A validator inspects a check context and returns at most one
//! [`Violation`]. All validators of a list run; their violations are
//! collected into [`ValidationErrors`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::{Device, FloorPlan, IndoorPosition, Location, LocationType};

/// Category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Required,
    InvalidValue,
    InvalidChoice,
    OrganizationMismatch,
    FloorplanLocationMismatch,
    FloorplansAttached,
    FloorplanInUse,
    LocationNotIndoor,
}

impl ViolationKind {
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::Required => "required",
            ViolationKind::InvalidValue => "invalid_value",
            ViolationKind::InvalidChoice => "invalid_choice",
            ViolationKind::OrganizationMismatch => "organization_mismatch",
            ViolationKind::FloorplanLocationMismatch => "floorplan_location_mismatch",
            ViolationKind::FloorplansAttached => "floorplans_attached",
            ViolationKind::FloorplanInUse => "floorplan_in_use",
            ViolationKind::LocationNotIndoor => "location_not_indoor",
        }
    }
}

/// A single validation failure. `field` is `None` for record-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub field: Option<&'static str>,
    pub message: String,
}

impl Violation {
    pub fn field(kind: ViolationKind, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn record(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{}: {}", field, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Non-empty collection of violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", summary(.0))]
pub struct ValidationErrors(pub Vec<Violation>);

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn single(violation: Violation) -> Self {
        Self(vec![violation])
    }

    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == Some(field))
    }

    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.0.iter().any(|v| v.kind == kind)
    }

    /// Folds several validation outcomes into one.
    pub fn merge(results: impl IntoIterator<Item = Result<(), ValidationErrors>>) -> Result<(), Self> {
        let violations: Vec<Violation> = results
            .into_iter()
            .filter_map(Result::err)
            .flat_map(|e| e.0)
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self(violations))
        }
    }
}

/// A validator over a check context.
pub type Validator<C> = fn(&C) -> Option<Violation>;

/// Runs `validators` in order and collects every violation.
pub fn run_validators<C>(context: &C, validators: &[Validator<C>]) -> Result<(), ValidationErrors> {
    let violations: Vec<Violation> = validators.iter().filter_map(|v| v(context)).collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(violations))
    }
}

// ============================================================================
// Location
// ============================================================================

/// Facts needed to validate a location about to be saved.
#[derive(Debug, Clone, Copy)]
pub struct LocationCheck<'a> {
    pub location: &'a Location,
    /// Stored type, `None` when the location is new.
    pub previous_type: Option<LocationType>,
    /// Number of floorplans currently referencing the location.
    pub floorplan_count: i64,
}

pub const FLOORPLANS_ATTACHED_MESSAGE: &str =
    "this location has floorplans associated to it, please delete them before changing its type";

/// An existing location cannot stop being indoor while floorplans point at it.
pub fn check_outdoor_floorplans(check: &LocationCheck<'_>) -> Option<Violation> {
    if check.location.is_indoor() || check.previous_type.is_none() {
        return None;
    }
    if check.floorplan_count > 0 {
        return Some(Violation::field(
            ViolationKind::FloorplansAttached,
            "type",
            FLOORPLANS_ATTACHED_MESSAGE,
        ));
    }
    None
}

/// Fixed locations need a name; mobile ones are named after their device.
pub fn check_location_name(check: &LocationCheck<'_>) -> Option<Violation> {
    if check.location.is_mobile || !check.location.name.trim().is_empty() {
        return None;
    }
    Some(Violation::field(
        ViolationKind::Required,
        "name",
        "this field is required",
    ))
}

pub fn check_location_length(check: &LocationCheck<'_>) -> Option<Violation> {
    use shared::validation::{MAX_ADDRESS_LENGTH, MAX_NAME_LENGTH};

    if check.location.name.chars().count() > MAX_NAME_LENGTH {
        return Some(Violation::field(
            ViolationKind::InvalidValue,
            "name",
            format!("Name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }
    match check.location.address {
        Some(ref address) if address.chars().count() > MAX_ADDRESS_LENGTH => {
            Some(Violation::field(
                ViolationKind::InvalidValue,
                "address",
                format!("Address must be at most {} characters", MAX_ADDRESS_LENGTH),
            ))
        }
        _ => None,
    }
}

pub fn check_geolocation_range(check: &LocationCheck<'_>) -> Option<Violation> {
    let point = check.location.geolocation?;
    shared::validation::validate_latitude(point.lat)
        .and_then(|_| shared::validation::validate_longitude(point.lng))
        .err()
        .map(|e| {
            Violation::field(
                ViolationKind::InvalidValue,
                "geolocation",
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string()),
            )
        })
}

/// Validates a location before it is saved.
pub fn validate_location(check: &LocationCheck<'_>) -> Result<(), ValidationErrors> {
    run_validators(
        check,
        &[
            check_outdoor_floorplans as Validator<_>,
            check_location_name as Validator<_>,
            check_location_length as Validator<_>,
            check_geolocation_range as Validator<_>,
        ],
    )
}

// ============================================================================
// FloorPlan
// ============================================================================

/// Facts needed to validate a floorplan about to be saved.
#[derive(Debug, Clone, Copy)]
pub struct FloorPlanCheck<'a> {
    pub floorplan: &'a FloorPlan,
    /// The location the floorplan belongs to, if it could be resolved.
    pub location: Option<&'a Location>,
}

pub const NOT_INDOOR_MESSAGE: &str =
    "floorplans can only be associated to locations of type \"indoor\"";

pub fn check_floorplan_location_present(check: &FloorPlanCheck<'_>) -> Option<Violation> {
    match check.location {
        Some(location) if location.id == check.floorplan.location_id => None,
        _ => Some(Violation::field(
            ViolationKind::Required,
            "location",
            "this field is required",
        )),
    }
}

pub fn check_floorplan_organization(check: &FloorPlanCheck<'_>) -> Option<Violation> {
    let location = check.location?;
    org_mismatch(
        check.floorplan.organization_id,
        location.organization_id,
        "floorplan",
        "location",
        "location",
    )
}

pub fn check_floorplan_location_indoor(check: &FloorPlanCheck<'_>) -> Option<Violation> {
    let location = check.location?;
    if location.is_indoor() {
        None
    } else {
        Some(Violation::field(
            ViolationKind::LocationNotIndoor,
            "location",
            NOT_INDOOR_MESSAGE,
        ))
    }
}

pub fn check_floorplan_image(check: &FloorPlanCheck<'_>) -> Option<Violation> {
    if check.floorplan.has_image() {
        None
    } else {
        Some(Violation::field(
            ViolationKind::Required,
            "image",
            "this field is required",
        ))
    }
}

/// Aligns the floorplan's organization with its location, then validates it.
///
/// The organization is overwritten rather than checked, so a floorplan
/// submitted with a stale organization is silently corrected.
pub fn prepare_floorplan(
    floorplan: &mut FloorPlan,
    location: Option<&Location>,
) -> Result<(), ValidationErrors> {
    if let Some(location) = location {
        if location.id == floorplan.location_id {
            floorplan.organization_id = location.organization_id;
        }
    }
    validate_floorplan(&FloorPlanCheck {
        floorplan,
        location,
    })
}

/// Validates a floorplan without correcting it.
pub fn validate_floorplan(check: &FloorPlanCheck<'_>) -> Result<(), ValidationErrors> {
    run_validators(
        check,
        &[
            check_floorplan_location_present as Validator<_>,
            check_floorplan_organization as Validator<_>,
            check_floorplan_location_indoor as Validator<_>,
            check_floorplan_image as Validator<_>,
        ],
    )
}

pub const FLOORPLAN_IN_USE_MESSAGE: &str =
    "this floorplan is used by device locations, it cannot be moved to another location";

/// A floorplan referenced by device locations must stay on its location.
///
/// `binding_count` is the number of device locations referencing it.
pub fn check_floorplan_relocation(
    floorplan: &FloorPlan,
    stored_location_id: uuid::Uuid,
    binding_count: i64,
) -> Result<(), ValidationErrors> {
    if floorplan.location_id == stored_location_id || binding_count == 0 {
        return Ok(());
    }
    Err(ValidationErrors::single(Violation::field(
        ViolationKind::FloorplanInUse,
        "location",
        FLOORPLAN_IN_USE_MESSAGE,
    )))
}

// ============================================================================
// DeviceLocation
// ============================================================================

/// Facts needed to validate a device location about to be saved.
#[derive(Debug, Clone, Copy)]
pub struct DeviceLocationCheck<'a> {
    pub device: &'a Device,
    pub location: Option<&'a Location>,
    pub floorplan: Option<&'a FloorPlan>,
    pub indoor: Option<&'a str>,
}

pub const FLOORPLAN_MISMATCH_MESSAGE: &str =
    "invalid floorplan: belongs to a different location";

pub const INVALID_VALUE_MESSAGE: &str = "invalid value";

pub fn check_location_organization(check: &DeviceLocationCheck<'_>) -> Option<Violation> {
    let location = check.location?;
    org_mismatch(
        check.device.organization_id,
        location.organization_id,
        "device location",
        "location",
        "location",
    )
}

pub fn check_floorplan_organization_match(check: &DeviceLocationCheck<'_>) -> Option<Violation> {
    let floorplan = check.floorplan?;
    org_mismatch(
        check.device.organization_id,
        floorplan.organization_id,
        "device location",
        "floorplan",
        "floorplan",
    )
}

/// The floorplan of an indoor binding must belong to the bound location.
pub fn check_indoor_location(check: &DeviceLocationCheck<'_>) -> Option<Violation> {
    let (location, floorplan) = match (check.location, check.floorplan) {
        (Some(location), Some(floorplan)) if location.is_indoor() => (location, floorplan),
        _ => return None,
    };
    if floorplan.location_id != location.id {
        return Some(Violation::record(
            ViolationKind::FloorplanLocationMismatch,
            FLOORPLAN_MISMATCH_MESSAGE,
        ));
    }
    None
}

/// Indoor positions are `"<x>,<y>"` on indoor locations and absent elsewhere.
pub fn check_indoor_position(check: &DeviceLocationCheck<'_>) -> Option<Violation> {
    let location = check.location?;
    let indoor = check.indoor.unwrap_or("");
    let invalid = || {
        Some(Violation::field(
            ViolationKind::InvalidValue,
            "indoor",
            INVALID_VALUE_MESSAGE,
        ))
    };

    if !location.is_indoor() {
        return if indoor.is_empty() { None } else { invalid() };
    }
    if indoor.is_empty() {
        return None;
    }
    if indoor.chars().count() > shared::validation::MAX_INDOOR_POSITION_LENGTH {
        return invalid();
    }
    match IndoorPosition::parse(indoor) {
        Some(_) => None,
        None => invalid(),
    }
}

/// Validates a device location before it is saved.
pub fn validate_device_location(check: &DeviceLocationCheck<'_>) -> Result<(), ValidationErrors> {
    run_validators(
        check,
        &[
            check_location_organization as Validator<_>,
            check_floorplan_organization_match as Validator<_>,
            check_indoor_location as Validator<_>,
            check_indoor_position as Validator<_>,
        ],
    )
}

fn org_mismatch(
    own: uuid::Uuid,
    related: uuid::Uuid,
    own_label: &str,
    related_label: &str,
    field: &'static str,
) -> Option<Violation> {
    if own == related {
        return None;
    }
    Some(Violation::field(
        ViolationKind::OrganizationMismatch,
        field,
        format!(
            "please ensure that the organization of this {} and the organization of the related {} match",
            own_label, related_label
        ),
    ))
}
