//! # Menu Item Repository
//!
//! The menu catalog collaborator: the per-item flat VAT columns that apply
//! when an item has no component composition.
//!
//! ## Flat Columns vs. Composition
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A menu item carries its own price_pence / vat_rate_bps / is_vat_exempt │
//! │  columns. They are authoritative ONLY while the item has no active      │
//! │  components:                                                            │
//! │                                                                         │
//! │    active components?  ──no──►  Simple treatment (these columns)        │
//! │           │                                                             │
//! │          yes                                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │    Mixed treatment (per-component rates; flat columns ignored)          │
//! │                                                                         │
//! │  Order lines snapshot name + price from here at add time.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use savour_core::types::MenuItem;
use savour_core::validation::{validate_item_name, validate_item_price, validate_vat_rate_bps};
use savour_core::CoreError;

// =============================================================================
// Input Types
// =============================================================================

/// A menu item being created.
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub tenant_id: String,
    pub name: String,
    /// Listed selling price in pence (gross).
    pub price_pence: i64,
    /// None = unclassified (simple items zero-rate with a warning).
    pub vat_rate_bps: Option<u32>,
    pub is_vat_exempt: bool,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Row shape for menu_items.
#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: String,
    tenant_id: String,
    name: String,
    price_pence: i64,
    vat_rate_bps: Option<i64>,
    is_vat_exempt: bool,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            price_pence: row.price_pence,
            // Out-of-range stored values read back as unclassified rather
            // than failing the whole load
            vat_rate_bps: row.vat_rate_bps.and_then(|b| u32::try_from(b).ok()),
            is_vat_exempt: row.is_vat_exempt,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, name, price_pence, vat_rate_bps,
           is_vat_exempt, is_active, created_at, updated_at
    FROM menu_items
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for menu catalog operations.
#[derive(Debug, Clone)]
pub struct MenuItemRepository {
    pool: SqlitePool,
}

impl MenuItemRepository {
    /// Creates a new MenuItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuItemRepository { pool }
    }

    /// Creates a menu item.
    pub async fn create_item(&self, item: &NewMenuItem) -> DbResult<MenuItem> {
        validate_item_name(&item.name).map_err(CoreError::from)?;
        validate_item_price(item.price_pence).map_err(CoreError::from)?;
        if let Some(bps) = item.vat_rate_bps {
            validate_vat_rate_bps(bps).map_err(CoreError::from)?;
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, tenant_id = %item.tenant_id, name = %item.name, "Creating menu item");

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, tenant_id, name, price_pence, vat_rate_bps,
                is_vat_exempt, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(&item.tenant_id)
        .bind(&item.name)
        .bind(item.price_pence)
        .bind(item.vat_rate_bps)
        .bind(item.is_vat_exempt)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(MenuItem {
            id,
            tenant_id: item.tenant_id.clone(),
            name: item.name.clone(),
            price_pence: item.price_pence,
            vat_rate_bps: item.vat_rate_bps,
            is_vat_exempt: item.is_vat_exempt,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets a menu item by ID (active or not, for audit paths).
    pub async fn get_item(&self, id: &str) -> DbResult<MenuItem> {
        let query = format!("{SELECT_COLUMNS} WHERE id = ?1");

        let row: Option<MenuItemRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItem::from)
            .ok_or_else(|| DbError::not_found("MenuItem", id))
    }

    /// Lists a tenant's active menu items, by name.
    pub async fn list_items(&self, tenant_id: &str) -> DbResult<Vec<MenuItem>> {
        let query = format!("{SELECT_COLUMNS} WHERE tenant_id = ?1 AND is_active = 1 ORDER BY name");

        let rows: Vec<MenuItemRow> = sqlx::query_as(&query)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    /// Sets an item's flat VAT columns.
    ///
    /// ## Note
    /// Has no effect on VAT computation while the item has active components;
    /// the composition takes precedence.
    pub async fn set_vat(
        &self,
        id: &str,
        vat_rate_bps: Option<u32>,
        is_vat_exempt: bool,
    ) -> DbResult<()> {
        if let Some(bps) = vat_rate_bps {
            validate_vat_rate_bps(bps).map_err(CoreError::from)?;
        }

        debug!(id = %id, ?vat_rate_bps, is_vat_exempt, "Setting menu item VAT columns");

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                vat_rate_bps = ?2,
                is_vat_exempt = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(vat_rate_bps)
        .bind(is_vat_exempt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }

    /// Soft-deletes a menu item.
    ///
    /// Historical order lines keep their name/price snapshots; the item just
    /// stops being orderable.
    pub async fn deactivate_item(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating menu item");

        let result = sqlx::query("UPDATE menu_items SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MenuItem", id));
        }

        Ok(())
    }
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

    fn new_item(name: &str, price: i64, bps: Option<u32>) -> NewMenuItem {
        NewMenuItem {
            tenant_id: "t1".to_string(),
            name: name.to_string(),
            price_pence: price,
            vat_rate_bps: bps,
            is_vat_exempt: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_item() {
        let db = test_db().await;
        let repo = db.menu_items();

        let created = repo
            .create_item(&new_item("Fish & Chips", 1200, Some(2000)))
            .await
            .unwrap();

        let loaded = repo.get_item(&created.id).await.unwrap();
        assert_eq!(loaded.name, "Fish & Chips");
        assert_eq!(loaded.price_pence, 1200);
        assert_eq!(loaded.vat_rate_bps, Some(2000));
        assert!(loaded.is_active);
    }

    #[tokio::test]
    async fn test_create_item_rejects_invalid_input() {
        let db = test_db().await;
        let repo = db.menu_items();

        let result = repo.create_item(&new_item("", 1200, Some(2000))).await;
        assert!(matches!(result, Err(DbError::Core(_))));

        let result = repo.create_item(&new_item("Soup", -100, Some(2000))).await;
        assert!(matches!(result, Err(DbError::Core(_))));

        let result = repo.create_item(&new_item("Soup", 450, Some(20_000))).await;
        assert!(matches!(result, Err(DbError::Core(_))));
    }

    #[tokio::test]
    async fn test_list_items_active_for_tenant() {
        let db = test_db().await;
        let repo = db.menu_items();

        let soup = repo.create_item(&new_item("Soup", 450, Some(2000))).await.unwrap();
        repo.create_item(&new_item("Bread", 150, Some(0))).await.unwrap();

        let mut other = new_item("Other Tenant Dish", 900, Some(2000));
        other.tenant_id = "t2".to_string();
        repo.create_item(&other).await.unwrap();

        repo.deactivate_item(&soup.id).await.unwrap();

        let items = repo.list_items("t1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bread");
    }

    #[tokio::test]
    async fn test_set_vat_updates_flat_columns() {
        let db = test_db().await;
        let repo = db.menu_items();

        let item = repo.create_item(&new_item("Salad Box", 500, None)).await.unwrap();

        repo.set_vat(&item.id, Some(0), false).await.unwrap();

        let loaded = repo.get_item(&item.id).await.unwrap();
        assert_eq!(loaded.vat_rate_bps, Some(0));
        assert!(!loaded.is_vat_exempt);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let db = test_db().await;
        let repo = db.menu_items();

        assert!(matches!(
            repo.get_item("ghost").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.set_vat("ghost", Some(2000), false).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.deactivate_item("ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivated_item_still_readable() {
        let db = test_db().await;
        let repo = db.menu_items();

        let item = repo.create_item(&new_item("Retired Dish", 700, Some(2000))).await.unwrap();
        repo.deactivate_item(&item.id).await.unwrap();

        let loaded = repo.get_item(&item.id).await.unwrap();
        assert!(!loaded.is_active);
    }
}
