//! Device repository for database operations.

use domain::models::Device;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::device::DeviceEntity;
use crate::metrics::QueryTimer;

/// Repository for device lookups.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a device by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Device>, sqlx::Error> {
        let timer = QueryTimer::new("find_device_by_id");
        let result = sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT id, organization_id, name, created_at, updated_at
            FROM devices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}
