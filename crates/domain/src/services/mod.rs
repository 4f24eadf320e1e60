//! Domain services for the Geo Registry.
//!
//! Services contain business logic that operates on domain models.

pub mod binding;
pub mod validation;

pub use binding::{
    clean_form, foreign_floorplan_location, resolve_binding, validate_binding, BindingInputs,
    ResolvedBinding,
};
pub use validation::{
    check_floorplan_relocation, prepare_floorplan, validate_device_location, validate_floorplan,
    validate_location, DeviceLocationCheck, FloorPlanCheck, LocationCheck, ValidationErrors,
    Violation, ViolationKind,
};
