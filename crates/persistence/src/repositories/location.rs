//! Location repository for database operations.

use domain::models::location::ListLocationsQuery;
use domain::models::Location;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::entities::location::{LocationEntity, LocationTypeDb, LOCATION_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for location-related database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new location.
    pub async fn create(&self, location: &Location) -> Result<Location, sqlx::Error> {
        let timer = QueryTimer::new("create_location");
        let mut conn = self.pool.acquire().await?;
        let result = upsert(&mut conn, location).await;
        timer.record();
        result
    }

    /// Overwrite the mutable fields of an existing location.
    pub async fn update(&self, location: &Location) -> Result<Option<Location>, sqlx::Error> {
        let timer = QueryTimer::new("update_location");
        let sql = format!(
            r#"
            UPDATE locations
            SET organization_id = $2, name = $3, location_type = $4, is_mobile = $5,
                address = $6, latitude = $7, longitude = $8, modified_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            LOCATION_COLUMNS
        );
        let result = sqlx::query_as::<_, LocationEntity>(&sql)
            .bind(location.id)
            .bind(location.organization_id)
            .bind(&location.name)
            .bind(LocationTypeDb::from(location.location_type))
            .bind(location.is_mobile)
            .bind(&location.address)
            .bind(location.geolocation.map(|g| g.lat))
            .bind(location.geolocation.map(|g| g.lng))
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// Find a location by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, sqlx::Error> {
        let timer = QueryTimer::new("find_location_by_id");
        let sql = format!("SELECT {} FROM locations WHERE id = $1", LOCATION_COLUMNS);
        let result = sqlx::query_as::<_, LocationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    /// List locations, newest first, narrowed by the query's filters.
    pub async fn list(&self, query: &ListLocationsQuery) -> Result<Vec<Location>, sqlx::Error> {
        let timer = QueryTimer::new("list_locations");
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM locations WHERE TRUE", LOCATION_COLUMNS));

        if let Some(organization_id) = query.organization {
            builder.push(" AND organization_id = ").push_bind(organization_id);
        }
        if let Some(location_type) = query.location_type {
            builder
                .push(" AND location_type = ")
                .push_bind(LocationTypeDb::from(location_type));
        }
        if let Some(is_mobile) = query.is_mobile {
            builder.push(" AND is_mobile = ").push_bind(is_mobile);
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR address ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder.push(" ORDER BY created_at DESC, id");

        let result = builder
            .build_query_as::<LocationEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    /// Number of floorplans referencing a location.
    pub async fn count_floorplans(&self, id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_location_floorplans");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM floorplans WHERE location_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a location.
    ///
    /// Fails with a foreign key violation while floorplans or device
    /// locations still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_location");
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}

/// Insert or update a location on the given connection.
pub(crate) async fn upsert(
    conn: &mut PgConnection,
    location: &Location,
) -> Result<Location, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO locations (id, organization_id, name, location_type, is_mobile,
                               address, latitude, longitude, created_at, modified_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
        ON CONFLICT (id) DO UPDATE SET
            organization_id = EXCLUDED.organization_id,
            name = EXCLUDED.name,
            location_type = EXCLUDED.location_type,
            is_mobile = EXCLUDED.is_mobile,
            address = EXCLUDED.address,
            latitude = EXCLUDED.latitude,
            longitude = EXCLUDED.longitude,
            modified_at = NOW()
        RETURNING {}
        "#,
        LOCATION_COLUMNS
    );
    let entity = sqlx::query_as::<_, LocationEntity>(&sql)
        .bind(location.id)
        .bind(location.organization_id)
        .bind(&location.name)
        .bind(LocationTypeDb::from(location.location_type))
        .bind(location.is_mobile)
        .bind(&location.address)
        .bind(location.geolocation.map(|g| g.lat))
        .bind(location.geolocation.map(|g| g.lng))
        .bind(location.created_at)
        .fetch_one(conn)
        .await?;
    Ok(entity.into())
}

/// Escapes `%`, `_` and `\` for use inside an ILIKE pattern.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
