//! Organization domain model.
//!
//! Organizations are owned by the provisioning platform. The registry only
//! reads them to scope locations, floorplans and devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Multi-tenant scoping entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_serialization() {
        let org = Organization {
            id: Uuid::nil(),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&org).unwrap();
        assert_eq!(json["slug"], "acme");
        assert_eq!(json["is_active"], true);
    }
}
