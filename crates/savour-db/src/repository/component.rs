//! # Item Component Repository
//!
//! The per-item composition store: which components make up a mixed menu
//! item, at what cost, under which tax classification.
//!
//! ## Replace-Not-Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set_components() replaces an item's whole composition in one           │
//! │  transaction:                                                           │
//! │                                                                         │
//! │    BEGIN                                                                │
//! │    DELETE FROM item_components WHERE menu_item_id = ?                   │
//! │    INSERT ... (one row per component)                                   │
//! │    upsert common_components    (reuse statistics, same transaction)     │
//! │    COMMIT                                                               │
//! │                                                                         │
//! │  A concurrent order computation sees either the old composition or the  │
//! │  new one, never a half-written mix.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single-field edits go through [`ComponentRepository::update_component`],
//! which patches in place and preserves the row's identity.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::common::record_usage_on;
use savour_core::types::{ItemComponent, VatClass};
use savour_core::validation::{
    validate_component_cost, validate_component_name, validate_vat_rate_bps,
};
use savour_core::CoreError;

// =============================================================================
// Input Types
// =============================================================================

/// A component being written to an item's composition.
#[derive(Debug, Clone)]
pub struct NewItemComponent {
    pub name: String,
    /// Gross cost in pence.
    pub cost_pence: i64,
    /// None = unclassified (engine falls back to the class default).
    pub vat_rate_bps: Option<u32>,
    pub vat_class: VatClass,
    pub display_order: i64,
}

/// A partial update to one stored component. `None` fields are left as-is.
///
/// ## Note
/// `vat_rate_bps` is doubly optional: `None` means "don't touch",
/// `Some(None)` means "clear the rate back to unclassified".
#[derive(Debug, Clone, Default)]
pub struct ComponentPatch {
    pub name: Option<String>,
    pub cost_pence: Option<i64>,
    pub vat_rate_bps: Option<Option<u32>>,
    pub vat_class: Option<VatClass>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Row shape for item_components.
#[derive(sqlx::FromRow)]
struct ItemComponentRow {
    id: String,
    menu_item_id: String,
    name: String,
    cost_pence: i64,
    vat_rate_bps: Option<i64>,
    vat_class: VatClass,
    is_active: bool,
    display_order: i64,
}

impl From<ItemComponentRow> for ItemComponent {
    fn from(row: ItemComponentRow) -> Self {
        ItemComponent {
            id: row.id,
            menu_item_id: row.menu_item_id,
            name: row.name,
            cost_pence: row.cost_pence,
            // Out-of-range stored values read back as unclassified rather
            // than failing the whole load
            vat_rate_bps: row.vat_rate_bps.and_then(|b| u32::try_from(b).ok()),
            vat_class: row.vat_class,
            is_active: row.is_active,
            display_order: row.display_order,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for item composition operations.
#[derive(Debug, Clone)]
pub struct ComponentRepository {
    pool: SqlitePool,
}

impl ComponentRepository {
    /// Creates a new ComponentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ComponentRepository { pool }
    }

    /// Replaces an item's composition atomically.
    ///
    /// ## What This Does
    /// 1. Validates every incoming component (name, cost, rate)
    /// 2. Deletes the existing composition
    /// 3. Inserts the new components with fresh IDs
    /// 4. Records each name in the tenant's reuse statistics
    ///
    /// All in one transaction; any failure rolls the whole write back.
    ///
    /// ## Returns
    /// The stored components, in display order.
    pub async fn set_components(
        &self,
        menu_item_id: &str,
        components: &[NewItemComponent],
    ) -> DbResult<Vec<ItemComponent>> {
        for component in components {
            validate_component_name(&component.name).map_err(CoreError::from)?;
            validate_component_cost(component.cost_pence).map_err(CoreError::from)?;
            if let Some(bps) = component.vat_rate_bps {
                validate_vat_rate_bps(bps).map_err(CoreError::from)?;
            }
        }

        let tenant_id = self.item_tenant(menu_item_id).await?;

        debug!(
            menu_item_id = %menu_item_id,
            count = components.len(),
            "Replacing item composition"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM item_components WHERE menu_item_id = ?1")
            .bind(menu_item_id)
            .execute(&mut *tx)
            .await?;

        let mut stored = Vec::with_capacity(components.len());

        for component in components {
            let id = Uuid::new_v4().to_string();

            sqlx::query(
                r#"
                INSERT INTO item_components (
                    id, menu_item_id, name, cost_pence, vat_rate_bps,
                    vat_class, is_active, display_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
                "#,
            )
            .bind(&id)
            .bind(menu_item_id)
            .bind(&component.name)
            .bind(component.cost_pence)
            .bind(component.vat_rate_bps)
            .bind(component.vat_class)
            .bind(component.display_order)
            .execute(&mut *tx)
            .await?;

            record_usage_on(
                &mut *tx,
                &tenant_id,
                &component.name,
                component.cost_pence,
                component.vat_rate_bps,
                component.vat_class,
            )
            .await?;

            stored.push(ItemComponent {
                id,
                menu_item_id: menu_item_id.to_string(),
                name: component.name.clone(),
                cost_pence: component.cost_pence,
                vat_rate_bps: component.vat_rate_bps,
                vat_class: component.vat_class,
                is_active: true,
                display_order: component.display_order,
            });
        }

        tx.commit().await?;

        stored.sort_by_key(|c| c.display_order);
        Ok(stored)
    }

    /// Gets an item's active components, in display order.
    ///
    /// An empty result means the item is simple (flat-rate), not an error.
    pub async fn get_components(&self, menu_item_id: &str) -> DbResult<Vec<ItemComponent>> {
        let rows: Vec<ItemComponentRow> = sqlx::query_as(
            r#"
            SELECT id, menu_item_id, name, cost_pence, vat_rate_bps,
                   vat_class, is_active, display_order
            FROM item_components
            WHERE menu_item_id = ?1 AND is_active = 1
            ORDER BY display_order, name
            "#,
        )
        .bind(menu_item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemComponent::from).collect())
    }

    /// Patches a single stored component.
    ///
    /// ## Returns
    /// * `Ok(ItemComponent)` - The updated component
    /// * `Err(DbError::NotFound)` - No component with that ID
    pub async fn update_component(
        &self,
        id: &str,
        patch: &ComponentPatch,
    ) -> DbResult<ItemComponent> {
        let row: Option<ItemComponentRow> = sqlx::query_as(
            r#"
            SELECT id, menu_item_id, name, cost_pence, vat_rate_bps,
                   vat_class, is_active, display_order
            FROM item_components
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let mut component: ItemComponent = row
            .map(ItemComponent::from)
            .ok_or_else(|| DbError::not_found("ItemComponent", id))?;

        if let Some(name) = &patch.name {
            component.name = name.clone();
        }
        if let Some(cost) = patch.cost_pence {
            component.cost_pence = cost;
        }
        if let Some(rate) = patch.vat_rate_bps {
            component.vat_rate_bps = rate;
        }
        if let Some(class) = patch.vat_class {
            component.vat_class = class;
        }
        if let Some(active) = patch.is_active {
            component.is_active = active;
        }
        if let Some(order) = patch.display_order {
            component.display_order = order;
        }

        validate_component_name(&component.name).map_err(CoreError::from)?;
        validate_component_cost(component.cost_pence).map_err(CoreError::from)?;
        if let Some(bps) = component.vat_rate_bps {
            validate_vat_rate_bps(bps).map_err(CoreError::from)?;
        }

        debug!(id = %id, "Updating item component");

        sqlx::query(
            r#"
            UPDATE item_components SET
                name = ?2,
                cost_pence = ?3,
                vat_rate_bps = ?4,
                vat_class = ?5,
                is_active = ?6,
                display_order = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&component.name)
        .bind(component.cost_pence)
        .bind(component.vat_rate_bps)
        .bind(component.vat_class)
        .bind(component.is_active)
        .bind(component.display_order)
        .execute(&self.pool)
        .await?;

        Ok(component)
    }

    /// Soft-deletes a component by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// Historical order VAT records may name this component; it must stay
    /// resolvable for audits while disappearing from future computations.
    pub async fn deactivate_component(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating item component");

        let result = sqlx::query("UPDATE item_components SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ItemComponent", id));
        }

        Ok(())
    }

    /// Looks up the owning tenant of a menu item.
    async fn item_tenant(&self, menu_item_id: &str) -> DbResult<String> {
        let tenant: Option<String> =
            sqlx::query_scalar("SELECT tenant_id FROM menu_items WHERE id = ?1")
                .bind(menu_item_id)
                .fetch_optional(&self.pool)
                .await?;

        tenant.ok_or_else(|| DbError::not_found("MenuItem", menu_item_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
