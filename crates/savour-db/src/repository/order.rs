//! # Order Repository
//!
//! Order loading, VAT computation, and persistence of the computed record.
//!
//! ## Compute-and-Store Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   compute_and_store(order_id)                           │
//! │                                                                         │
//! │  1. LOAD                                                               │
//! │     └── order row + line items + LIVE composition lookup per item      │
//! │         (components present → Mixed, else the item's flat columns)     │
//! │                                                                         │
//! │  2. COMPUTE (savour-core, pure)                                        │
//! │     └── enrich_order_with_vat() → per-line VAT + order summary         │
//! │                                                                         │
//! │  3. STORE (one transaction)                                            │
//! │     └── orders.vat_summary   ← JSON OrderVatSummary                    │
//! │     └── order_items.vat_info ← JSON LineItemVat per line               │
//! │                                                                         │
//! │  The stored blobs are the order-time record: recomputing later against │
//! │  an edited catalog may give different figures, the blobs never change  │
//! │  unless compute_and_store runs again.                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::component::ComponentRepository;
use savour_core::aggregator::{enrich_order_with_vat, LineItemVat, OrderVatSummary};
use savour_core::types::{MenuItemSnapshot, Order, OrderLineItem, TaxRate, VatTreatment};
use savour_core::validation::validate_quantity;
use savour_core::CoreError;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    tenant_id: String,
    vat_summary: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    menu_item_id: String,
    name_snapshot: String,
    price_pence_snapshot: i64,
    quantity: i64,
    add_on_total_pence: i64,
    vat_info: Option<String>,
}

#[derive(sqlx::FromRow)]
struct MenuItemVatRow {
    vat_rate_bps: Option<i64>,
    is_vat_exempt: bool,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order VAT operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an empty order for a tenant.
    pub async fn create_order(&self, tenant_id: &str) -> DbResult<Order> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(id = %id, tenant_id = %tenant_id, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, tenant_id, vat_summary, created_at, updated_at)
            VALUES (?1, ?2, NULL, ?3, ?3)
            "#,
        )
        .bind(&id)
        .bind(tenant_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Order {
            id,
            tenant_id: tenant_id.to_string(),
            line_items: Vec::new(),
            vat_summary: None,
        })
    }

    /// Adds a line to an order, snapshotting the menu item's name and price.
    ///
    /// ## Snapshot Pattern
    /// Name and price are copied onto the line so the order's record survives
    /// later menu edits. The tax TREATMENT is deliberately NOT snapshotted
    /// here - it is resolved live at compute time.
    pub async fn add_line(
        &self,
        order_id: &str,
        menu_item_id: &str,
        quantity: i64,
        add_on_total_pence: i64,
    ) -> DbResult<String> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        #[derive(sqlx::FromRow)]
        struct ItemSnapshotRow {
            name: String,
            price_pence: i64,
        }

        let item: Option<ItemSnapshotRow> =
            sqlx::query_as("SELECT name, price_pence FROM menu_items WHERE id = ?1 AND is_active = 1")
                .bind(menu_item_id)
                .fetch_optional(&self.pool)
                .await?;

        let item = item.ok_or_else(|| DbError::not_found("MenuItem", menu_item_id))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(order_id = %order_id, menu_item_id = %menu_item_id, quantity, "Adding order line");

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, menu_item_id, name_snapshot, price_pence_snapshot,
                quantity, add_on_total_pence, vat_info, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)
            "#,
        )
        .bind(&id)
        .bind(order_id)
        .bind(menu_item_id)
        .bind(&item.name)
        .bind(item.price_pence)
        .bind(quantity)
        .bind(add_on_total_pence)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Loads an order with each line's tax treatment resolved.
    ///
    /// ## Treatment Resolution
    /// For each line, the item's ACTIVE components are looked up once:
    /// - components present → `VatTreatment::Mixed`
    /// - none → `VatTreatment::Simple` from the menu item's flat columns
    /// - menu item deleted → `Simple { rate: None }` (the engine records an
    ///   unclassified-item warning and zero-rates it)
    ///
    /// Previously stored VAT blobs are decoded onto the order, so a loaded
    /// order reflects its last computation.
    pub async fn load_order(&self, order_id: &str) -> DbResult<Order> {
        let order_row: Option<OrderRow> =
            sqlx::query_as("SELECT id, tenant_id, vat_summary FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        let order_row = order_row.ok_or_else(|| DbError::not_found("Order", order_id))?;

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT id, menu_item_id, name_snapshot, price_pence_snapshot,
                   quantity, add_on_total_pence, vat_info
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let components_repo = ComponentRepository::new(self.pool.clone());
        let mut line_items = Vec::with_capacity(item_rows.len());

        for row in item_rows {
            let treatment = self
                .resolve_treatment(&components_repo, &row.menu_item_id)
                .await?;

            let vat: Option<LineItemVat> = match &row.vat_info {
                Some(json) => Some(serde_json::from_str(json)?),
                None => None,
            };

            line_items.push(OrderLineItem {
                id: row.id,
                quantity: row.quantity,
                add_on_total_pence: row.add_on_total_pence,
                item: MenuItemSnapshot {
                    item_id: row.menu_item_id,
                    name: row.name_snapshot,
                    price_pence: row.price_pence_snapshot,
                    treatment,
                },
                vat,
            });
        }

        let vat_summary: Option<OrderVatSummary> = match &order_row.vat_summary {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };

        Ok(Order {
            id: order_row.id,
            tenant_id: order_row.tenant_id,
            line_items,
            vat_summary,
        })
    }

    /// Computes the order's VAT and persists the record.
    ///
    /// ## Returns
    /// The computed order summary (also written to `orders.vat_summary`).
    pub async fn compute_and_store(&self, order_id: &str) -> DbResult<OrderVatSummary> {
        let order = self.load_order(order_id).await?;

        let enriched = enrich_order_with_vat(&order)?;
        let summary = enriched
            .vat_summary
            .as_ref()
            .ok_or_else(|| DbError::Internal("enrichment produced no summary".to_string()))?;

        let summary_json = serde_json::to_string(summary)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE orders SET vat_summary = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(&summary_json)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for line in &enriched.line_items {
            let vat = line
                .vat
                .as_ref()
                .ok_or_else(|| DbError::Internal("enrichment left a line without VAT".to_string()))?;
            let vat_json = serde_json::to_string(vat)?;

            sqlx::query("UPDATE order_items SET vat_info = ?2 WHERE id = ?1")
                .bind(&line.id)
                .bind(&vat_json)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order_id,
            total_vat = %summary.total_vat,
            compliant = summary.hmrc_compliant,
            "Order VAT computed and stored"
        );

        Ok(summary.clone())
    }

    /// Reads back an order's stored VAT summary, if one was computed.
    pub async fn get_vat_summary(&self, order_id: &str) -> DbResult<Option<OrderVatSummary>> {
        let json: Option<Option<String>> =
            sqlx::query_scalar("SELECT vat_summary FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        let json = json.ok_or_else(|| DbError::not_found("Order", order_id))?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Resolves one item's tax treatment from the live catalog.
    async fn resolve_treatment(
        &self,
        components_repo: &ComponentRepository,
        menu_item_id: &str,
    ) -> DbResult<VatTreatment> {
        let components = components_repo.get_components(menu_item_id).await?;

        if !components.is_empty() {
            return Ok(VatTreatment::Mixed { components });
        }

        let flat: Option<MenuItemVatRow> =
            sqlx::query_as("SELECT vat_rate_bps, is_vat_exempt FROM menu_items WHERE id = ?1")
                .bind(menu_item_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match flat {
            Some(row) => VatTreatment::Simple {
                rate: row
                    .vat_rate_bps
                    .and_then(|b| u32::try_from(b).ok())
                    .map(TaxRate::from_bps),
                exempt: row.is_vat_exempt,
            },
            // Item deleted since ordering: unclassified, engine warns
            None => VatTreatment::Simple {
                rate: None,
                exempt: false,
            },
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::component::NewItemComponent;
    use savour_core::types::VatClass;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_menu_item(
        db: &Database,
        id: &str,
        name: &str,
        price_pence: i64,
        vat_rate_bps: Option<u32>,
    ) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, tenant_id, name, price_pence, vat_rate_bps,
                is_vat_exempt, is_active, created_at, updated_at
            ) VALUES (?1, 't1', ?2, ?3, ?4, 0, 1, ?5, ?5)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(price_pence)
        .bind(vat_rate_bps)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    /// Simple £6.00 standard-rated item plus a £12.00 hot/cold combo.
    async fn seed_catalog(db: &Database) {
        seed_menu_item(db, "fish", "Fish & Chips", 600, Some(2000)).await;
        seed_menu_item(db, "combo", "Chicken Combo", 1200, None).await;

        db.components()
            .set_components(
                "combo",
                &[
                    NewItemComponent {
                        name: "Hot Main".to_string(),
                        cost_pence: 800,
                        vat_rate_bps: Some(2000),
                        vat_class: VatClass::HotFood,
                        display_order: 0,
                    },
                    NewItemComponent {
                        name: "Cold Side".to_string(),
                        cost_pence: 400,
                        vat_rate_bps: Some(0),
                        vat_class: VatClass::ColdFood,
                        display_order: 1,
                    },
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_order_resolves_treatments() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        repo.add_line(&order.id, "fish", 1, 0).await.unwrap();
        repo.add_line(&order.id, "combo", 1, 0).await.unwrap();

        let loaded = repo.load_order(&order.id).await.unwrap();
        assert_eq!(loaded.line_items.len(), 2);
        assert!(!loaded.line_items[0].item.is_mixed());
        assert!(loaded.line_items[1].item.is_mixed());
        assert_eq!(loaded.line_items[1].item.price_pence, 1200);
    }

    #[tokio::test]
    async fn test_compute_and_store_end_to_end() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        // 2 × £6.00 at 20% → £1.00 each → £2.00
        repo.add_line(&order.id, "fish", 2, 0).await.unwrap();
        // Combo: £1.33 hot VAT per unit
        repo.add_line(&order.id, "combo", 1, 0).await.unwrap();

        let summary = repo.compute_and_store(&order.id).await.unwrap();

        assert_eq!(summary.total_vat.pence(), 333);
        assert!(summary.has_hot_food_vat);
        assert!(summary.has_mixed_items);
        // Hot + cold mix computed component-based → flagged for review
        assert!(!summary.hmrc_compliant);

        // Stored blob reads back identical
        let stored = repo.get_vat_summary(&order.id).await.unwrap().unwrap();
        assert_eq!(stored, summary);

        // Per-line blobs landed too
        let loaded = repo.load_order(&order.id).await.unwrap();
        assert!(loaded.line_items.iter().all(|l| l.vat.is_some()));
        assert_eq!(loaded.vat_summary, Some(summary));
    }

    #[tokio::test]
    async fn test_compute_is_repeatable() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        repo.add_line(&order.id, "fish", 1, 0).await.unwrap();

        let first = repo.compute_and_store(&order.id).await.unwrap();
        let second = repo.compute_and_store(&order.id).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recompute_follows_catalog_edits() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        repo.add_line(&order.id, "combo", 1, 0).await.unwrap();

        let before = repo.compute_and_store(&order.id).await.unwrap();

        // Recompose: all hot, whole £12.00 standard-rated → £2.00
        db.components()
            .set_components(
                "combo",
                &[NewItemComponent {
                    name: "Hot Everything".to_string(),
                    cost_pence: 1200,
                    vat_rate_bps: Some(2000),
                    vat_class: VatClass::HotFood,
                    display_order: 0,
                }],
            )
            .await
            .unwrap();

        let after = repo.compute_and_store(&order.id).await.unwrap();
        assert_eq!(before.total_vat.pence(), 133);
        assert_eq!(after.total_vat.pence(), 200);
    }

    #[tokio::test]
    async fn test_add_line_validates_quantity() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        assert!(matches!(
            repo.add_line(&order.id, "fish", 0, 0).await,
            Err(DbError::Core(_))
        ));
        assert!(matches!(
            repo.add_line(&order.id, "fish", 1000, 0).await,
            Err(DbError::Core(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let db = test_db().await;
        let repo = db.orders();

        assert!(matches!(
            repo.load_order("ghost").await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.get_vat_summary("ghost").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_summary_none_before_compute() {
        let db = test_db().await;
        seed_catalog(&db).await;
        let repo = db.orders();

        let order = repo.create_order("t1").await.unwrap();
        assert!(repo.get_vat_summary(&order.id).await.unwrap().is_none());
    }
}
