//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod device;
pub mod device_location;
pub mod floorplan;
pub mod location;
pub mod organization;
