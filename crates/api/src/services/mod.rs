//! Application services used by the route handlers.

pub mod device_location;
pub mod image;
pub mod storage;
