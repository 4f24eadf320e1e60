//! Common validation utilities.

use validator::ValidationError;

/// Maximum length of a location name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a location address.
pub const MAX_ADDRESS_LENGTH: usize = 100;

/// Maximum length of an indoor position string.
pub const MAX_INDOOR_POSITION_LENGTH: usize = 64;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}
