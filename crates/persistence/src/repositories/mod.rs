//! Repository implementations for database operations.

pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;

pub use device::DeviceRepository;
pub use device_location::{DeviceLocationRepository, SavedBinding};
pub use floorplan::FloorPlanRepository;
pub use location::LocationRepository;
pub use organization::OrganizationRepository;
