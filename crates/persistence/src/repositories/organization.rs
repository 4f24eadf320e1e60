//! Organization repository for database operations.

use domain::models::Organization;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::organization::OrganizationEntity;
use crate::metrics::QueryTimer;

/// Repository for organization lookups.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Creates a new OrganizationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an organization by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
        let timer = QueryTimer::new("find_organization_by_id");
        let result = sqlx::query_as::<_, OrganizationEntity>(
            r#"
            SELECT id, name, slug, is_active, created_at
            FROM organizations
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
