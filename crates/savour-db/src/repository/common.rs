//! # Common Component Repository
//!
//! Per-tenant reuse statistics: every time an admin saves a component, its
//! name is remembered with a running average cost so the next composition
//! can be filled from suggestions instead of typed from scratch.
//!
//! ## Running Average
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "Chips" saved at 300p, then 340p, then 320p                            │
//! │                                                                         │
//! │  1st save: avg = 300,             usage_count = 1                       │
//! │  2nd save: avg = (300·1+340)/2    usage_count = 2   → 320               │
//! │  3rd save: avg = (320·2+320)/3    usage_count = 3   → 320               │
//! │                                                                         │
//! │  Integer division - the average drifts by at most a penny per update,   │
//! │  which is fine for a suggestion default.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use savour_core::types::{CommonComponent, VatClass};

/// Repository for common component suggestions.
#[derive(Debug, Clone)]
pub struct CommonComponentRepository {
    pool: SqlitePool,
}

/// Row shape for common_components.
#[derive(sqlx::FromRow)]
struct CommonComponentRow {
    id: String,
    tenant_id: String,
    name: String,
    avg_cost_pence: i64,
    vat_rate_bps: Option<i64>,
    vat_class: VatClass,
    usage_count: i64,
    updated_at: chrono::DateTime<Utc>,
}

impl From<CommonComponentRow> for CommonComponent {
    fn from(row: CommonComponentRow) -> Self {
        CommonComponent {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            avg_cost_pence: row.avg_cost_pence,
            // A corrupt negative rate in storage is indistinguishable from
            // "unclassified" for suggestion purposes
            vat_rate_bps: row.vat_rate_bps.and_then(|b| u32::try_from(b).ok()),
            vat_class: row.vat_class,
            usage_count: row.usage_count,
            updated_at: row.updated_at,
        }
    }
}

impl CommonComponentRepository {
    /// Creates a new CommonComponentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CommonComponentRepository { pool }
    }

    /// Records one use of a component name, updating the running average.
    ///
    /// ## Upsert Semantics
    /// First use inserts with `usage_count = 1`; later uses fold the new cost
    /// into the average and take the latest rate and classification as the
    /// suggestion default.
    pub async fn record_usage(
        &self,
        tenant_id: &str,
        name: &str,
        cost_pence: i64,
        vat_rate_bps: Option<u32>,
        vat_class: VatClass,
    ) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        record_usage_on(&mut conn, tenant_id, name, cost_pence, vat_rate_bps, vat_class).await
    }

    /// Suggests components whose name starts with the given prefix.
    ///
    /// ## Usage
    /// Backs the admin composition editor's type-ahead. An empty prefix
    /// falls back to the most-used components.
    pub async fn suggest(
        &self,
        tenant_id: &str,
        prefix: &str,
        limit: u32,
    ) -> DbResult<Vec<CommonComponent>> {
        let prefix = prefix.trim();

        if prefix.is_empty() {
            return self.top(tenant_id, limit).await;
        }

        debug!(tenant_id = %tenant_id, prefix = %prefix, "Suggesting components");

        // LIKE with a trailing wildcard uses the (tenant_id, name) index
        let pattern = format!("{}%", prefix);

        let rows: Vec<CommonComponentRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, avg_cost_pence, vat_rate_bps,
                   vat_class, usage_count, updated_at
            FROM common_components
            WHERE tenant_id = ?1 AND name LIKE ?2
            ORDER BY usage_count DESC, name
            LIMIT ?3
            "#,
        )
        .bind(tenant_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommonComponent::from).collect())
    }

    /// Returns the tenant's most-used components.
    pub async fn top(&self, tenant_id: &str, limit: u32) -> DbResult<Vec<CommonComponent>> {
        let rows: Vec<CommonComponentRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, avg_cost_pence, vat_rate_bps,
                   vat_class, usage_count, updated_at
            FROM common_components
            WHERE tenant_id = ?1
            ORDER BY usage_count DESC, name
            LIMIT ?2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommonComponent::from).collect())
    }
}

/// Upsert on a specific connection, so composition writes can fold usage
/// recording into their own transaction.
pub(crate) async fn record_usage_on(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    name: &str,
    cost_pence: i64,
    vat_rate_bps: Option<u32>,
    vat_class: VatClass,
) -> DbResult<()> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO common_components (
            id, tenant_id, name, avg_cost_pence, vat_rate_bps,
            vat_class, usage_count, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
        ON CONFLICT (tenant_id, name) DO UPDATE SET
            avg_cost_pence = (avg_cost_pence * usage_count + excluded.avg_cost_pence)
                             / (usage_count + 1),
            usage_count = usage_count + 1,
            vat_rate_bps = excluded.vat_rate_bps,
            vat_class = excluded.vat_class,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(name)
    .bind(cost_pence)
    .bind(vat_rate_bps)
    .bind(vat_class)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_first_usage_inserts() {
        let db = test_db().await;
        let repo = db.common_components();

        repo.record_usage("t1", "Chips", 300, Some(2000), VatClass::HotFood)
            .await
            .unwrap();

        let top = repo.top("t1", 10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "Chips");
        assert_eq!(top[0].avg_cost_pence, 300);
        assert_eq!(top[0].usage_count, 1);
    }

    #[tokio::test]
    async fn test_repeat_usage_updates_running_average() {
        let db = test_db().await;
        let repo = db.common_components();

        repo.record_usage("t1", "Chips", 300, Some(2000), VatClass::HotFood)
            .await
            .unwrap();
        repo.record_usage("t1", "Chips", 340, Some(2000), VatClass::HotFood)
            .await
            .unwrap();

        let top = repo.top("t1", 10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].avg_cost_pence, 320);
        assert_eq!(top[0].usage_count, 2);
    }

    #[tokio::test]
    async fn test_suggest_by_prefix() {
        let db = test_db().await;
        let repo = db.common_components();

        repo.record_usage("t1", "Chips", 300, Some(2000), VatClass::HotFood)
            .await
            .unwrap();
        repo.record_usage("t1", "Chicken Breast", 700, Some(2000), VatClass::HotFood)
            .await
            .unwrap();
        repo.record_usage("t1", "Salad", 250, Some(0), VatClass::ColdFood)
            .await
            .unwrap();

        let suggestions = repo.suggest("t1", "Chi", 10).await.unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|c| c.name.starts_with("Chi")));
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = test_db().await;
        let repo = db.common_components();

        repo.record_usage("t1", "Chips", 300, Some(2000), VatClass::HotFood)
            .await
            .unwrap();

        assert!(repo.top("t2", 10).await.unwrap().is_empty());
    }
}
