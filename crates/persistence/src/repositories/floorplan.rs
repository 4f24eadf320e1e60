//! Floorplan repository for database operations.

use domain::models::floorplan::ListFloorPlansQuery;
use domain::models::FloorPlan;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::entities::floorplan::{FloorPlanEntity, FLOORPLAN_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for floorplan-related database operations.
#[derive(Clone)]
pub struct FloorPlanRepository {
    pool: PgPool,
}

impl FloorPlanRepository {
    /// Creates a new FloorPlanRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new floorplan.
    pub async fn create(&self, floorplan: &FloorPlan) -> Result<FloorPlan, sqlx::Error> {
        let timer = QueryTimer::new("create_floorplan");
        let mut conn = self.pool.acquire().await?;
        let result = upsert(&mut conn, floorplan).await;
        timer.record();
        result
    }

    /// Overwrite the mutable fields of an existing floorplan.
    pub async fn update(&self, floorplan: &FloorPlan) -> Result<Option<FloorPlan>, sqlx::Error> {
        let timer = QueryTimer::new("update_floorplan");
        let sql = format!(
            r#"
            UPDATE floorplans
            SET organization_id = $2, location_id = $3, floor = $4, image = $5,
                image_width = $6, image_height = $7, modified_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FLOORPLAN_COLUMNS
        );
        let result = sqlx::query_as::<_, FloorPlanEntity>(&sql)
            .bind(floorplan.id)
            .bind(floorplan.organization_id)
            .bind(floorplan.location_id)
            .bind(floorplan.floor)
            .bind(&floorplan.image)
            .bind(floorplan.image_width)
            .bind(floorplan.image_height)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Find a floorplan by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<FloorPlan>, sqlx::Error> {
        let timer = QueryTimer::new("find_floorplan_by_id");
        let sql = format!("SELECT {} FROM floorplans WHERE id = $1", FLOORPLAN_COLUMNS);
        let result = sqlx::query_as::<_, FloorPlanEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// List floorplans narrowed by organization and location.
    pub async fn list(&self, query: &ListFloorPlansQuery) -> Result<Vec<FloorPlan>, sqlx::Error> {
        let timer = QueryTimer::new("list_floorplans");
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM floorplans WHERE TRUE",
            FLOORPLAN_COLUMNS
        ));
        if let Some(organization_id) = query.organization {
            builder.push(" AND organization_id = ").push_bind(organization_id);
        }
        if let Some(location_id) = query.location {
            builder.push(" AND location_id = ").push_bind(location_id);
        }
        builder.push(" ORDER BY created_at DESC, id");

        let result = builder
            .build_query_as::<FloorPlanEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// All floorplans of a location ordered by floor.
    pub async fn list_by_location(&self, location_id: Uuid) -> Result<Vec<FloorPlan>, sqlx::Error> {
        let timer = QueryTimer::new("list_floorplans_by_location");
        let sql = format!(
            "SELECT {} FROM floorplans WHERE location_id = $1 ORDER BY floor, created_at",
            FLOORPLAN_COLUMNS
        );
        let result = sqlx::query_as::<_, FloorPlanEntity>(&sql)
            .bind(location_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Number of device locations referencing a floorplan.
    pub async fn count_device_locations(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_floorplan_device_locations");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM device_locations WHERE floorplan_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a floorplan.
    ///
    /// Fails with a foreign key violation while device locations still
    /// reference it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_floorplan");
        let result = sqlx::query("DELETE FROM floorplans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

/// Insert or update a floorplan on the given connection.
pub(crate) async fn upsert(
    conn: &mut PgConnection,
    floorplan: &FloorPlan,
) -> Result<FloorPlan, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO floorplans (id, organization_id, location_id, floor, image,
                                image_width, image_height, created_at, modified_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT (id) DO UPDATE SET
            organization_id = EXCLUDED.organization_id,
            location_id = EXCLUDED.location_id,
            floor = EXCLUDED.floor,
            image = EXCLUDED.image,
            image_width = EXCLUDED.image_width,
            image_height = EXCLUDED.image_height,
            modified_at = NOW()
        RETURNING {}
        "#,
        FLOORPLAN_COLUMNS
    );
    let entity = sqlx::query_as::<_, FloorPlanEntity>(&sql)
        .bind(floorplan.id)
        .bind(floorplan.organization_id)
        .bind(floorplan.location_id)
        .bind(floorplan.floor)
        .bind(&floorplan.image)
        .bind(floorplan.image_width)
        .bind(floorplan.image_height)
        .bind(floorplan.created_at)
        .fetch_one(conn)
        .await?;
    Ok(entity.into())
}
