//! # Component Template Repository
//!
//! Reusable component sets an admin can stamp onto many menu items.
//!
//! ## Template Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Template Lifecycle                                  │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create_template("Roast Dinner Base", [Meat, Potatoes, Veg])    │
//! │                                                                         │
//! │  2. APPLY (repeatedly, to many items)                                  │
//! │     └── apply_to_item(template, "Chicken Roast",                       │
//! │              { "Meat": cost → 850 })                                   │
//! │     └── apply_to_item(template, "Beef Roast",                          │
//! │              { "Meat": cost → 950, "Veg": exclude })                   │
//! │                                                                         │
//! │  3. (OPTIONAL) DEACTIVATE                                              │
//! │     └── deactivate() → hidden from listings; existing item             │
//! │         compositions are copies and keep working                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Application COPIES the template into the item's composition; later
//! template edits never rewrite items it was applied to.

use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::component::{ComponentRepository, NewItemComponent};
use savour_core::types::{ComponentTemplate, ItemComponent, TemplateComponent, VatClass};
use savour_core::validation::{validate_template_components, validate_template_name};
use savour_core::CoreError;

// =============================================================================
// Input Types
// =============================================================================

/// A component line for a template being created.
#[derive(Debug, Clone)]
pub struct NewTemplateComponent {
    pub name: String,
    /// Default gross cost in pence; adjustable per application.
    pub default_cost_pence: i64,
    pub vat_rate_bps: Option<u32>,
    pub vat_class: VatClass,
    pub display_order: i64,
}

/// Per-component adjustment when applying a template to an item, keyed by
/// component name. Adjustments naming no template component are silently
/// ignored (the admin UI sends the full adjustment map regardless of which
/// template is selected).
#[derive(Debug, Clone, Default)]
pub struct ComponentAdjustment {
    /// Overrides the template's default cost.
    pub new_cost_pence: Option<i64>,
    /// Overrides the template's rate.
    pub new_vat_rate_bps: Option<u32>,
    /// Leaves this component out of the item entirely.
    pub exclude: bool,
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    is_active: bool,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<TemplateRow> for ComponentTemplate {
    fn from(row: TemplateRow) -> Self {
        ComponentTemplate {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TemplateComponentRow {
    id: String,
    template_id: String,
    name: String,
    default_cost_pence: i64,
    vat_rate_bps: Option<i64>,
    vat_class: VatClass,
    display_order: i64,
}

impl From<TemplateComponentRow> for TemplateComponent {
    fn from(row: TemplateComponentRow) -> Self {
        TemplateComponent {
            id: row.id,
            template_id: row.template_id,
            name: row.name,
            default_cost_pence: row.default_cost_pence,
            vat_rate_bps: row.vat_rate_bps.and_then(|b| u32::try_from(b).ok()),
            vat_class: row.vat_class,
            display_order: row.display_order,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for component template operations.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    pool: SqlitePool,
}

impl TemplateRepository {
    /// Creates a new TemplateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TemplateRepository { pool }
    }

    /// Creates a template with its component lines, atomically.
    ///
    /// ## Returns
    /// The stored template and its components.
    ///
    /// ## Errors
    /// * `DbError::Core` - Empty name, no components, or an invalid
    ///   component line; nothing is written.
    pub async fn create_template(
        &self,
        tenant_id: &str,
        name: &str,
        description: Option<&str>,
        components: &[NewTemplateComponent],
    ) -> DbResult<(ComponentTemplate, Vec<TemplateComponent>)> {
        validate_template_name(name).map_err(CoreError::from)?;

        let template_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let lines: Vec<TemplateComponent> = components
            .iter()
            .map(|c| TemplateComponent {
                id: Uuid::new_v4().to_string(),
                template_id: template_id.clone(),
                name: c.name.clone(),
                default_cost_pence: c.default_cost_pence,
                vat_rate_bps: c.vat_rate_bps,
                vat_class: c.vat_class,
                display_order: c.display_order,
            })
            .collect();

        validate_template_components(&lines).map_err(CoreError::from)?;

        debug!(tenant_id = %tenant_id, name = %name, count = lines.len(), "Creating template");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO component_templates (
                id, tenant_id, name, description, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
        )
        .bind(&template_id)
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO template_components (
                    id, template_id, name, default_cost_pence,
                    vat_rate_bps, vat_class, display_order
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&line.id)
            .bind(&line.template_id)
            .bind(&line.name)
            .bind(line.default_cost_pence)
            .bind(line.vat_rate_bps)
            .bind(line.vat_class)
            .bind(line.display_order)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let template = ComponentTemplate {
            id: template_id,
            tenant_id: tenant_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        Ok((template, lines))
    }

    /// Gets a template and its components.
    pub async fn get_template(
        &self,
        id: &str,
    ) -> DbResult<Option<(ComponentTemplate, Vec<TemplateComponent>)>> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, description, is_active, created_at, updated_at
            FROM component_templates
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let components = self.template_components(id).await?;
        Ok(Some((row.into(), components)))
    }

    /// Lists a tenant's active templates, by name.
    pub async fn list_templates(&self, tenant_id: &str) -> DbResult<Vec<ComponentTemplate>> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, description, is_active, created_at, updated_at
            FROM component_templates
            WHERE tenant_id = ?1 AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ComponentTemplate::from).collect())
    }

    /// Applies a template to a menu item, replacing the item's composition.
    ///
    /// ## Adjustment Semantics
    /// ```text
    /// template line "Meat" (default 700p, 20%)
    ///      │
    ///      ├── adjustments["Meat"].exclude?        → skip the line
    ///      ├── adjustments["Meat"].new_cost_pence? → override the cost
    ///      ├── adjustments["Meat"].new_vat_rate?   → override the rate
    ///      └── no entry                            → template defaults
    /// ```
    /// Adjustment keys matching no template component are ignored.
    ///
    /// ## Returns
    /// The item's new composition (a copy; later template edits don't
    /// propagate).
    pub async fn apply_to_item(
        &self,
        template_id: &str,
        menu_item_id: &str,
        adjustments: &HashMap<String, ComponentAdjustment>,
    ) -> DbResult<Vec<ItemComponent>> {
        let (template, components) = self
            .get_template(template_id)
            .await?
            .ok_or_else(|| DbError::not_found("ComponentTemplate", template_id))?;

        if !template.is_active {
            return Err(DbError::not_found("ComponentTemplate", template_id));
        }

        debug!(
            template_id = %template_id,
            menu_item_id = %menu_item_id,
            adjustments = adjustments.len(),
            "Applying template to item"
        );

        let new_components: Vec<NewItemComponent> = components
            .iter()
            .filter_map(|line| {
                let adjustment = adjustments.get(&line.name);

                if adjustment.is_some_and(|a| a.exclude) {
                    return None;
                }

                Some(NewItemComponent {
                    name: line.name.clone(),
                    cost_pence: adjustment
                        .and_then(|a| a.new_cost_pence)
                        .unwrap_or(line.default_cost_pence),
                    vat_rate_bps: adjustment
                        .and_then(|a| a.new_vat_rate_bps)
                        .or(line.vat_rate_bps),
                    vat_class: line.vat_class,
                    display_order: line.display_order,
                })
            })
            .collect();

        ComponentRepository::new(self.pool.clone())
            .set_components(menu_item_id, &new_components)
            .await
    }

    /// Soft-deletes a template.
    ///
    /// Items the template was applied to keep their compositions (those are
    /// copies); the template just stops appearing in listings.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating template");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE component_templates SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("ComponentTemplate", id));
        }

        Ok(())
    }

    /// Loads a template's component lines in display order.
    async fn template_components(&self, template_id: &str) -> DbResult<Vec<TemplateComponent>> {
        let rows: Vec<TemplateComponentRow> = sqlx::query_as(
            r#"
            SELECT id, template_id, name, default_cost_pence,
                   vat_rate_bps, vat_class, display_order
            FROM template_components
            WHERE template_id = ?1
            ORDER BY display_order, name
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TemplateComponent::from).collect())
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

    async fn seed_menu_item(db: &Database, id: &str, tenant_id: &str) {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, tenant_id, name, price_pence, vat_rate_bps,
                is_vat_exempt, is_active, created_at, updated_at
            ) VALUES (?1, ?2, 'Roast', 1450, NULL, 0, 1, ?3, ?3)
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
    }

    fn roast_base() -> Vec<NewTemplateComponent> {
        vec![
            NewTemplateComponent {
                name: "Meat".to_string(),
                default_cost_pence: 700,
                vat_rate_bps: Some(2000),
                vat_class: VatClass::HotFood,
                display_order: 0,
            },
            NewTemplateComponent {
                name: "Potatoes".to_string(),
                default_cost_pence: 300,
                vat_rate_bps: Some(2000),
                vat_class: VatClass::HotFood,
                display_order: 1,
            },
            NewTemplateComponent {
                name: "Veg".to_string(),
                default_cost_pence: 200,
                vat_rate_bps: Some(2000),
                vat_class: VatClass::HotFood,
                display_order: 2,
            },
        ]
    }

    #[tokio::test]
    async fn test_create_and_get_template() {
        let db = test_db().await;
        let repo = db.templates();

        let (template, lines) = repo
            .create_template("t1", "Roast Dinner Base", Some("Sunday menu"), &roast_base())
            .await
            .unwrap();
        assert_eq!(lines.len(), 3);

        let (loaded, loaded_lines) = repo.get_template(&template.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Roast Dinner Base");
        assert_eq!(loaded_lines.len(), 3);
        assert_eq!(loaded_lines[0].name, "Meat");
    }

    #[tokio::test]
    async fn test_create_template_rejects_empty_components() {
        let db = test_db().await;
        let repo = db.templates();

        let result = repo.create_template("t1", "Empty", None, &[]).await;
        assert!(matches!(result, Err(DbError::Core(_))));

        // Nothing half-written
        assert!(repo.list_templates("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_templates_only_active_for_tenant() {
        let db = test_db().await;
        let repo = db.templates();

        let (t1, _) = repo
            .create_template("t1", "Base A", None, &roast_base())
            .await
            .unwrap();
        repo.create_template("t1", "Base B", None, &roast_base())
            .await
            .unwrap();
        repo.create_template("t2", "Other Tenant", None, &roast_base())
            .await
            .unwrap();

        repo.deactivate(&t1.id).await.unwrap();

        let listed = repo.list_templates("t1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Base B");
    }

    #[tokio::test]
    async fn test_list_templates_ordered_by_name() {
        let db = test_db().await;
        let repo = db.templates();

        // Created in reverse alphabetical order
        repo.create_template("t1", "Zebra Base", None, &roast_base())
            .await
            .unwrap();
        repo.create_template("t1", "Apple Base", None, &roast_base())
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_templates("t1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Apple Base", "Zebra Base"]);
    }

    #[tokio::test]
    async fn test_apply_with_adjustments() {
        let db = test_db().await;
        seed_menu_item(&db, "item-1", "t1").await;
        let repo = db.templates();

        let (template, _) = repo
            .create_template("t1", "Roast Dinner Base", None, &roast_base())
            .await
            .unwrap();

        let mut adjustments = HashMap::new();
        adjustments.insert(
            "Meat".to_string(),
            ComponentAdjustment {
                new_cost_pence: Some(950),
                ..Default::default()
            },
        );
        adjustments.insert(
            "Potatoes".to_string(),
            ComponentAdjustment {
                new_vat_rate_bps: Some(0),
                ..Default::default()
            },
        );
        adjustments.insert(
            "Veg".to_string(),
            ComponentAdjustment {
                exclude: true,
                ..Default::default()
            },
        );
        // Unknown name: silently ignored
        adjustments.insert("Gravy".to_string(), ComponentAdjustment::default());

        let composition = repo
            .apply_to_item(&template.id, "item-1", &adjustments)
            .await
            .unwrap();

        assert_eq!(composition.len(), 2);
        assert_eq!(composition[0].name, "Meat");
        assert_eq!(composition[0].cost_pence, 950);
        assert_eq!(composition[0].vat_rate_bps, Some(2000));
        assert_eq!(composition[1].name, "Potatoes");
        assert_eq!(composition[1].cost_pence, 300);
        assert_eq!(composition[1].vat_rate_bps, Some(0));
    }

    #[tokio::test]
    async fn test_apply_deactivated_template_fails() {
        let db = test_db().await;
        seed_menu_item(&db, "item-1", "t1").await;
        let repo = db.templates();

        let (template, _) = repo
            .create_template("t1", "Roast Dinner Base", None, &roast_base())
            .await
            .unwrap();
        repo.deactivate(&template.id).await.unwrap();

        let result = repo
            .apply_to_item(&template.id, "item-1", &HashMap::new())
            .await;
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_template_edits_do_not_touch_applied_items() {
        let db = test_db().await;
        seed_menu_item(&db, "item-1", "t1").await;

        let (template, _) = db
            .templates()
            .create_template("t1", "Roast Dinner Base", None, &roast_base())
            .await
            .unwrap();
        db.templates()
            .apply_to_item(&template.id, "item-1", &HashMap::new())
            .await
            .unwrap();

        db.templates().deactivate(&template.id).await.unwrap();

        // The item's composition is a copy and survives
        let composition = db.components().get_components("item-1").await.unwrap();
        assert_eq!(composition.len(), 3);
    }
}
