//! Device location repository for database operations.

use domain::models::{DeviceLocation, FloorPlan, Location};
use domain::services::ResolvedBinding;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::device_location::DeviceLocationEntity;
use crate::metrics::QueryTimer;

const DEVICE_LOCATION_COLUMNS: &str =
    "id, device_id, location_id, floorplan_id, indoor, created_at, modified_at";

/// Rows written by [`DeviceLocationRepository::save_binding`].
#[derive(Debug, Clone)]
pub struct SavedBinding {
    pub location: Location,
    pub floorplan: Option<FloorPlan>,
    pub device_location: DeviceLocation,
}

/// Repository for device location database operations.
#[derive(Clone)]
pub struct DeviceLocationRepository {
    pool: PgPool,
}

impl DeviceLocationRepository {
    /// Creates a new DeviceLocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the binding of a device, if any.
    pub async fn find_by_device(
        &self,
        device_id: Uuid,
    ) -> Result<Option<DeviceLocation>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_location");
        let sql = format!(
            "SELECT {} FROM device_locations WHERE device_id = $1",
            DEVICE_LOCATION_COLUMNS
        );
        let result = sqlx::query_as::<_, DeviceLocationEntity>(&sql)
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Persist a resolved binding atomically.
    ///
    /// Writes the location first, then the floorplan, then the device
    /// location, so every row sees its references already stored.
    pub async fn save_binding(&self, binding: &ResolvedBinding) -> Result<SavedBinding, sqlx::Error> {
        let timer = QueryTimer::new("save_device_location");
        let mut tx = self.pool.begin().await?;

        let location = super::location::upsert(&mut *tx, &binding.location).await?;

        let floorplan = match &binding.floorplan {
            Some(floorplan) => Some(super::floorplan::upsert(&mut *tx, floorplan).await?),
            None => None,
        };

        let sql = format!(
            r#"
            INSERT INTO device_locations (id, device_id, location_id, floorplan_id, indoor,
                                          created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (device_id) DO UPDATE SET
                location_id = EXCLUDED.location_id,
                floorplan_id = EXCLUDED.floorplan_id,
                indoor = EXCLUDED.indoor,
                modified_at = NOW()
            RETURNING {}
            "#,
            DEVICE_LOCATION_COLUMNS
        );
        let device_location = &binding.device_location;
        let entity = sqlx::query_as::<_, DeviceLocationEntity>(&sql)
            .bind(device_location.id)
            .bind(device_location.device_id)
            .bind(location.id)
            .bind(floorplan.as_ref().map(|f| f.id))
            .bind(&device_location.indoor)
            .bind(device_location.created_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();

        tracing::debug!(
            device_id = %device_location.device_id,
            location_id = %location.id,
            floorplan_id = ?floorplan.as_ref().map(|f| f.id),
            "Saved device location"
        );

        Ok(SavedBinding {
            location,
            floorplan,
            device_location: entity.into(),
        })
    }

    /// Remove the binding of a device. Locations and floorplans are kept.
    pub async fn delete_by_device(&self, device_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_device_location");
        let result = sqlx::query("DELETE FROM device_locations WHERE device_id = $1")
            .bind(device_id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
