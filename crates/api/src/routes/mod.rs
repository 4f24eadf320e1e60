//! HTTP route handlers.

pub mod device_locations;
pub mod floorplans;
pub mod health;
pub mod locations;
pub mod media;
