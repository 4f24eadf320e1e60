//! Domain models for the Geo Registry.

pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;

pub use device::Device;
pub use device_location::{
    DeviceLocation, DeviceLocationForm, FloorPlanSelection, IndoorPosition, LocationSelection,
};
pub use floorplan::{FloorPlan, FloorPlanChoice, FloorPlanChoices, ImageMeta, ImageUpload};
pub use location::{GeoPoint, Location, LocationJson, LocationType};
pub use organization::Organization;
