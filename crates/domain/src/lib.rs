//! Domain layer for the Geo Registry backend.
//!
//! This crate contains:
//! - Domain models (Location, FloorPlan, DeviceLocation and the
//!   platform-owned Organization and Device references)
//! - Ordered record validators
//! - Device location form cleaning and resolution

pub mod models;
pub mod services;
